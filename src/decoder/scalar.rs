//! Leaf destinations.

use core::{any::type_name, str};

use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};

use crate::{Compiler, Decode, DecodeFn, Decoder, Error, Result, TypeTag, value::ErrorValue};

use super::duration;

/// Build the function of a leaf type.
///
/// A nil token resets the destination to its default. Any other tag is handed
/// to `f`, and the destination is only written once `f` succeeds.
fn leaf<T: Decode>(f: fn(&mut Decoder<'_>, TypeTag) -> Result<T>) -> DecodeFn<T> {
    DecodeFn::new(move |d, to: &mut T| {
        let tag = d.parser.parse_type()?;

        *to = match tag {
            TypeTag::Nil => {
                d.parser.parse_nil()?;
                T::default()
            }
            tag => f(d, tag)?,
        };

        Ok(tag)
    })
}

/// Convert an extracted integer to the destination width.
fn narrow<T, V>(v: V) -> Result<T>
where
    T: TryFrom<V>,
    V: Into<i128> + Copy,
{
    T::try_from(v).map_err(|_| Error::OutOfRange {
        value: v.into(),
        target: type_name::<T>(),
    })
}

fn text<'d>(d: &'d mut Decoder<'_>, tag: TypeTag, expected: TypeTag) -> Result<&'d str> {
    let bytes = d.parse_text_from(tag, expected)?;
    Ok(str::from_utf8(bytes)?)
}

impl Decode for bool {
    fn compile(_: &mut Compiler<'_>) -> DecodeFn<Self> {
        leaf(|d, tag| match tag {
            TypeTag::Bool => d.parser.parse_bool(),
            found => Err(Error::TypeConversion {
                found,
                expected: TypeTag::Bool,
            }),
        })
    }
}

macro_rules! decode_integer {
    ($expected:ident => $($t:ty),*) => {$(
        impl Decode for $t {
            fn compile(_: &mut Compiler<'_>) -> DecodeFn<Self> {
                leaf(|d, tag| match tag {
                    TypeTag::Int => narrow(d.parser.parse_int()?),
                    TypeTag::Uint => narrow(d.parser.parse_uint()?),
                    found => Err(Error::TypeConversion {
                        found,
                        expected: TypeTag::$expected,
                    }),
                })
            }
        }
    )*};
}

decode_integer!(Int => i8, i16, i32, i64, isize);
decode_integer!(Uint => u8, u16, u32, u64, usize);

macro_rules! decode_float {
    ($($t:ty),*) => {$(
        impl Decode for $t {
            fn compile(_: &mut Compiler<'_>) -> DecodeFn<Self> {
                leaf(|d, tag| match tag {
                    TypeTag::Int => Ok(d.parser.parse_int()? as $t),
                    TypeTag::Uint => Ok(d.parser.parse_uint()? as $t),
                    TypeTag::Float => Ok(d.parser.parse_float()? as $t),
                    found => Err(Error::TypeConversion {
                        found,
                        expected: TypeTag::Float,
                    }),
                })
            }
        }
    )*};
}

decode_float!(f32, f64);

impl Decode for String {
    fn compile(_: &mut Compiler<'_>) -> DecodeFn<Self> {
        leaf(|d, tag| text(d, tag, TypeTag::String).map(str::to_owned))
    }
}

impl Decode for Bytes {
    fn compile(_: &mut Compiler<'_>) -> DecodeFn<Self> {
        leaf(|d, tag| {
            let bytes = d.parse_text_from(tag, TypeTag::Bytes)?;
            Ok(Bytes::copy_from_slice(bytes))
        })
    }
}

/// Raw bytes into a `Vec<u8>`, reusing its allocation.
pub(super) fn decode_byte_vec(d: &mut Decoder<'_>, to: &mut Vec<u8>) -> Result<TypeTag> {
    let tag = d.parser.parse_type()?;
    let bytes = d.parse_text_from(tag, TypeTag::Bytes)?;

    to.clear();
    to.extend_from_slice(bytes);
    Ok(tag)
}

impl Decode for DateTime<Utc> {
    fn compile(_: &mut Compiler<'_>) -> DecodeFn<Self> {
        leaf(|d, tag| match tag {
            TypeTag::Time => d.parser.parse_time(),
            tag => {
                let text = text(d, tag, TypeTag::Time)?;
                Ok(DateTime::parse_from_rfc3339(text)?.with_timezone(&Utc))
            }
        })
    }
}

impl Decode for TimeDelta {
    fn compile(_: &mut Compiler<'_>) -> DecodeFn<Self> {
        leaf(|d, tag| match tag {
            TypeTag::Duration => d.parser.parse_duration(),
            tag => duration::parse(text(d, tag, TypeTag::Duration)?),
        })
    }
}

impl Decode for ErrorValue {
    fn compile(_: &mut Compiler<'_>) -> DecodeFn<Self> {
        DecodeFn::error()
    }
}
