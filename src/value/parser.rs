//! A parser producing tokens from an in-memory [`Value`].

use chrono::{DateTime, TimeDelta, Utc};

use crate::{Error, Parser, Result, TypeTag};

use super::{ErrorValue, Value};

/// Parse tokens out of a [`Value`] tree.
///
/// Useful to re-decode an already-decoded dynamic value into a typed
/// destination. Containers always report their length, so `*_next` is only
/// consulted between elements.
#[derive(Debug)]
pub struct ValueParser<'v> {
    /// Value whose tag is returned by the next `parse_type`.
    next: Option<&'v Value>,
    /// Value whose tag was returned, awaiting extraction.
    current: Option<&'v Value>,
    stack: Vec<Frame<'v>>,
}

#[derive(Debug)]
enum Frame<'v> {
    Array(&'v [Value]),
    Map(&'v [(Value, Value)]),
}

impl<'v> ValueParser<'v> {
    pub fn new(value: &'v Value) -> Self {
        Self {
            next: Some(value),
            current: None,
            stack: Vec::new(),
        }
    }

    fn array(&self) -> Result<&'v [Value]> {
        match self.stack.last() {
            Some(Frame::Array(items)) => Ok(items),
            _ => Err(Error::UnsupportedTag(TypeTag::Array)),
        }
    }

    fn map(&self) -> Result<&'v [(Value, Value)]> {
        match self.stack.last() {
            Some(Frame::Map(entries)) => Ok(entries),
            _ => Err(Error::UnsupportedTag(TypeTag::Map)),
        }
    }
}

/// Take the current value if it has the expected variant.
macro_rules! extract {
    ($self:ident, Nil) => {
        match $self.current.take() {
            Some(Value::Nil) => Ok(()),
            other => Err(mismatch(other, TypeTag::Nil)),
        }
    };
    ($self:ident, $variant:ident($v:ident) => $out:expr) => {
        match $self.current.take() {
            Some(Value::$variant($v)) => Ok($out),
            other => Err(mismatch(other, TypeTag::$variant)),
        }
    };
}

fn mismatch(found: Option<&Value>, expected: TypeTag) -> Error {
    Error::TypeConversion {
        found: found.map_or(TypeTag::Unknown, Value::tag),
        expected,
    }
}

impl Parser for ValueParser<'_> {
    fn parse_type(&mut self) -> Result<TypeTag> {
        let value = self.next.take().ok_or(Error::End)?;
        self.current = Some(value);
        Ok(value.tag())
    }

    fn parse_nil(&mut self) -> Result<()> {
        extract!(self, Nil)
    }

    fn parse_bool(&mut self) -> Result<bool> {
        extract!(self, Bool(v) => *v)
    }

    fn parse_int(&mut self) -> Result<i64> {
        extract!(self, Int(v) => *v)
    }

    fn parse_uint(&mut self) -> Result<u64> {
        extract!(self, Uint(v) => *v)
    }

    fn parse_float(&mut self) -> Result<f64> {
        extract!(self, Float(v) => *v)
    }

    fn parse_string(&mut self) -> Result<&[u8]> {
        extract!(self, String(v) => v.as_bytes())
    }

    fn parse_bytes(&mut self) -> Result<&[u8]> {
        extract!(self, Bytes(v) => v.as_slice())
    }

    fn parse_time(&mut self) -> Result<DateTime<Utc>> {
        extract!(self, Time(v) => *v)
    }

    fn parse_duration(&mut self) -> Result<TimeDelta> {
        extract!(self, Duration(v) => *v)
    }

    fn parse_error(&mut self) -> Result<ErrorValue> {
        extract!(self, Error(v) => v.clone())
    }

    fn parse_array_begin(&mut self) -> Result<Option<usize>> {
        let items = extract!(self, Array(items) => items.as_slice())?;

        self.next = items.first();
        self.stack.push(Frame::Array(items));
        Ok(Some(items.len()))
    }

    fn parse_array_next(&mut self, n: usize) -> Result<()> {
        self.next = Some(self.array()?.get(n).ok_or(Error::End)?);
        Ok(())
    }

    fn parse_array_end(&mut self, _: usize) -> Result<()> {
        self.array()?;
        self.stack.pop();
        Ok(())
    }

    fn parse_map_begin(&mut self) -> Result<Option<usize>> {
        let entries = extract!(self, Map(entries) => entries.as_slice())?;

        self.next = entries.first().map(|(k, _)| k);
        self.stack.push(Frame::Map(entries));
        Ok(Some(entries.len()))
    }

    fn parse_map_next(&mut self, n: usize) -> Result<()> {
        let (key, _) = self.map()?.get(n).ok_or(Error::End)?;
        self.next = Some(key);
        Ok(())
    }

    fn parse_map_value(&mut self, n: usize) -> Result<()> {
        let (_, value) = self.map()?.get(n).ok_or(Error::End)?;
        self.next = Some(value);
        Ok(())
    }

    fn parse_map_end(&mut self, _: usize) -> Result<()> {
        self.map()?;
        self.stack.pop();
        Ok(())
    }
}
