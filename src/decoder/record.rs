//! Structured records, decoded from maps keyed by field name.

use core::str;
use std::collections::HashMap;

use crate::{Compiler, Decode, DecodeFn, Decoder, Result, TypeTag, value::Value};

/// A type decoded field by field from a map.
///
/// Usually derived with [`Decode`](macro@crate::Decode), which also implements
/// [`Decode`] through [`DecodeFn::record`].
pub trait Record: Decode {
    /// The decode functions of this record's fields, by encoded name.
    fn fields(c: &mut Compiler<'_>) -> Fields<Self>;
}

/// A lookup from encoded field name to the function decoding that field.
///
/// Each function receives the whole record and decodes into one member.
pub struct Fields<T> {
    by_name: HashMap<&'static str, DecodeFn<T>>,
}

impl<T> Default for Fields<T> {
    fn default() -> Self {
        Self {
            by_name: HashMap::new(),
        }
    }
}

impl<T: 'static> Fields<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the function decoding the field encoded as `name`.
    ///
    /// A later registration under the same name replaces the earlier one.
    pub fn insert(&mut self, name: &'static str, f: DecodeFn<T>) {
        self.by_name.insert(name, f);
    }

    pub fn get(&self, name: &str) -> Option<&DecodeFn<T>> {
        self.by_name.get(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl Compiler<'_> {
    /// Build the function decoding one member of a record, reached through
    /// `project`.
    pub fn field<T: 'static, U: Decode>(&mut self, project: fn(&mut T) -> &mut U) -> DecodeFn<T> {
        let member = self.nested::<U>();

        DecodeFn::new(move |d, to: &mut T| member.get(d).call(d, project(to)))
    }
}

impl<T: Record> DecodeFn<T> {
    /// Decode `T` from a map through the name table of [`Record::fields`].
    ///
    /// Unknown fields are skipped. On failure, or on a nil value, the record
    /// is reset to its default.
    pub fn record(c: &mut Compiler<'_>) -> Self {
        let fields = T::fields(c);

        DecodeFn::new(move |d, to: &mut T| {
            let tag = d.parser.parse_type()?;
            let result = decode_fields(d, tag, to, &fields);

            if result.is_err() || tag == TypeTag::Nil {
                *to = T::default();
            }

            result.map(|_| tag)
        })
    }
}

fn decode_fields<T: 'static>(
    d: &mut Decoder<'_>,
    tag: TypeTag,
    to: &mut T,
    fields: &Fields<T>,
) -> Result<()> {
    d.decode_map_impl(tag, |d, i| {
        let field = {
            let (_, key) = d.parse_text(TypeTag::String)?;
            let name = str::from_utf8(key)?;
            let field = fields.get(name);

            if field.is_none() {
                log::debug!("discarding unknown field {name:?}");
            }

            field
        };

        d.parser.parse_map_value(i)?;

        match field {
            Some(f) => f.call(d, to)?,
            None => d.decode_value(&mut Value::Nil)?,
        };

        Ok(())
    })
}
