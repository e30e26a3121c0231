//! Dynamic values, shaped by the observed tags.

use crate::{Compiler, Decode, DecodeFn, Decoder, Error, Result, TypeTag, value::Value};

impl Decode for Value {
    fn compile(_: &mut Compiler<'_>) -> DecodeFn<Self> {
        DecodeFn::new(|d, to: &mut Self| {
            let tag = d.parser.parse_type()?;

            *to = match tag {
                TypeTag::Nil => {
                    d.parser.parse_nil()?;
                    Value::Nil
                }
                TypeTag::Bool => Value::Bool(d.parser.parse_bool()?),
                TypeTag::Int => Value::Int(d.parser.parse_int()?),
                TypeTag::Uint => Value::Uint(d.parser.parse_uint()?),
                TypeTag::Float => Value::Float(d.parser.parse_float()?),
                TypeTag::String => {
                    let bytes = d.parser.parse_string()?.to_vec();

                    // Invalid UTF-8 is kept, as bytes.
                    match String::from_utf8(bytes) {
                        Ok(s) => Value::String(s),
                        Err(err) => Value::Bytes(err.into_bytes()),
                    }
                }
                TypeTag::Bytes => Value::Bytes(d.parser.parse_bytes()?.to_vec()),
                TypeTag::Time => Value::Time(d.parser.parse_time()?),
                TypeTag::Duration => Value::Duration(d.parser.parse_duration()?),
                TypeTag::Error => Value::Error(d.parser.parse_error()?),
                TypeTag::Array => Value::Array(decode_items(d, tag)?),
                TypeTag::Map => Value::Map(decode_entries(d, tag)?),
                TypeTag::Unknown => Err(Error::UnsupportedTag(tag))?,
            };

            Ok(tag)
        })
    }
}

fn decode_items(d: &mut Decoder<'_>, tag: TypeTag) -> Result<Vec<Value>> {
    let f = d.registry().resolve::<Value>();
    let mut items = Vec::new();

    d.decode_array_impl(tag, |d| {
        let mut item = Value::Nil;
        f.call(d, &mut item)?;
        items.push(item);
        Ok(())
    })?;

    Ok(items)
}

/// Decode map entries in order, through the decoder's map function if set.
fn decode_entries(d: &mut Decoder<'_>, tag: TypeTag) -> Result<Vec<(Value, Value)>> {
    let mut entries = Vec::new();

    if let Some(map_fn) = d.map_fn.clone() {
        d.decode_map_impl(tag, |d, i| map_fn(d.pair(i), &mut entries))?;
        return Ok(entries);
    }

    let f = d.registry().resolve::<Value>();

    d.decode_map_impl(tag, |d, i| {
        let mut key = Value::Nil;
        f.call(d, &mut key)?;

        d.parser.parse_map_value(i)?;

        let mut value = Value::Nil;
        f.call(d, &mut value)?;

        entries.push((key, value));
        Ok(())
    })?;

    Ok(entries)
}
