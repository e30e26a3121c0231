//! Sequence, map, and indirection destinations.

use core::{
    any::{Any, TypeId, type_name},
    hash::Hash,
    marker::PhantomData,
    mem,
};
use std::collections::{BTreeMap, HashMap};

use crate::{Compiler, Decode, DecodeFn, Decoder, Error, Result, TypeTag, value::Value};

use super::scalar::decode_byte_vec;

/// Initial capacity of a sequence with at least one element.
const MIN_BLOCK: usize = 8;

impl<T: Decode> Decode for Vec<T> {
    fn compile(c: &mut Compiler<'_>) -> DecodeFn<Self> {
        if TypeId::of::<T>() == TypeId::of::<u8>() {
            return DecodeFn::new(|d, to: &mut Self| {
                match (to as &mut dyn Any).downcast_mut::<Vec<u8>>() {
                    Some(to) => decode_byte_vec(d, to),
                    None => Err(Error::Unsupported {
                        type_name: type_name::<Self>(),
                    }),
                }
            });
        }

        let elem = c.nested::<T>();

        DecodeFn::new(move |d, to: &mut Self| {
            let f = elem.get(d);
            let tag = d.parser.parse_type()?;
            let mut items = Vec::new();

            d.decode_array_impl(tag, |d| {
                if items.len() == items.capacity() {
                    items.reserve_exact(items.capacity().max(MIN_BLOCK));
                }

                let mut item = T::default();
                f.call(d, &mut item)?;
                items.push(item);
                Ok(())
            })?;

            *to = items;
            Ok(tag)
        })
    }
}

impl<T: Decode, const N: usize> Decode for [T; N]
where
    [T; N]: Default,
{
    fn compile(c: &mut Compiler<'_>) -> DecodeFn<Self> {
        let elem = c.nested::<T>();

        DecodeFn::new(move |d, to: &mut Self| {
            let f = elem.get(d);
            let tag = d.parser.parse_type()?;
            let mut found = 0;

            to.iter_mut().for_each(|slot| *slot = T::default());

            d.decode_array_impl(tag, |d| {
                match to.get_mut(found) {
                    Some(slot) => f.call(d, slot)?,
                    // Keep the stream aligned before reporting the mismatch.
                    None => d.decode_value(&mut Value::Nil)?,
                };
                found += 1;
                Ok(())
            })?;

            if tag != TypeTag::Nil && found != N {
                Err(Error::LengthMismatch { expected: N, found })?;
            }

            Ok(tag)
        })
    }
}

/// Decode the entries of a map, handing each key and value to `put`.
fn decode_entries<K, V, F>(
    d: &mut Decoder<'_>,
    tag: TypeTag,
    kf: &DecodeFn<K>,
    vf: &DecodeFn<V>,
    mut put: F,
) -> Result<()>
where
    K: Decode,
    V: Decode,
    F: FnMut(K, V),
{
    d.decode_map_impl(tag, |d, i| {
        let mut key = K::default();
        kf.call(d, &mut key)?;

        d.parser.parse_map_value(i)?;

        let mut value = V::default();
        vf.call(d, &mut value)?;

        put(key, value);
        Ok(())
    })
}

/// Repopulate a string-keyed map in place through one scratch entry.
fn decode_string_map<V: Decode>(
    d: &mut Decoder<'_>,
    to: &mut HashMap<String, V>,
) -> Result<TypeTag> {
    let kf = d.registry().resolve::<String>();
    let vf = d.registry().resolve::<V>();
    let tag = d.parser.parse_type()?;

    let mut key = String::new();
    let mut value = V::default();

    to.clear();

    d.decode_map_impl(tag, |d, i| {
        kf.call(d, &mut key)?;
        d.parser.parse_map_value(i)?;
        vf.call(d, &mut value)?;

        to.insert(mem::take(&mut key), mem::take(&mut value));
        Ok(())
    })?;

    Ok(tag)
}

impl<K, V> Decode for HashMap<K, V>
where
    K: Decode + Eq + Hash,
    V: Decode,
{
    fn compile(c: &mut Compiler<'_>) -> DecodeFn<Self> {
        let id = TypeId::of::<Self>();

        if id == TypeId::of::<HashMap<String, Value>>() || id == TypeId::of::<HashMap<String, String>>() {
            return DecodeFn::new(|d, to: &mut Self| {
                let to = to as &mut dyn Any;

                if let Some(to) = to.downcast_mut::<HashMap<String, Value>>() {
                    decode_string_map(d, to)
                } else if let Some(to) = to.downcast_mut::<HashMap<String, String>>() {
                    decode_string_map(d, to)
                } else {
                    Err(Error::Unsupported {
                        type_name: type_name::<Self>(),
                    })
                }
            });
        }

        let key = c.nested::<K>();
        let value = c.nested::<V>();

        DecodeFn::new(move |d, to: &mut Self| {
            let (kf, vf) = (key.get(d), value.get(d));
            let tag = d.parser.parse_type()?;
            let mut map = HashMap::new();

            decode_entries(d, tag, &kf, &vf, |k, v| {
                map.insert(k, v);
            })?;

            *to = map;
            Ok(tag)
        })
    }
}

impl<K, V> Decode for BTreeMap<K, V>
where
    K: Decode + Ord,
    V: Decode,
{
    fn compile(c: &mut Compiler<'_>) -> DecodeFn<Self> {
        let key = c.nested::<K>();
        let value = c.nested::<V>();

        DecodeFn::new(move |d, to: &mut Self| {
            let (kf, vf) = (key.get(d), value.get(d));
            let tag = d.parser.parse_type()?;
            let mut map = BTreeMap::new();

            decode_entries(d, tag, &kf, &vf, |k, v| {
                map.insert(k, v);
            })?;

            *to = map;
            Ok(tag)
        })
    }
}

impl<T: Decode> Decode for Option<T> {
    fn compile(c: &mut Compiler<'_>) -> DecodeFn<Self> {
        let inner = c.nested::<T>();

        DecodeFn::new(move |d, to: &mut Self| {
            let f = inner.get(d);

            let tag = match to {
                Some(value) => {
                    let tag = f.call(d, value)?;
                    if tag == TypeTag::Nil {
                        *to = None;
                    }
                    tag
                }
                None => {
                    let mut value = T::default();
                    let tag = f.call(d, &mut value)?;
                    if tag != TypeTag::Nil {
                        *to = Some(value);
                    }
                    tag
                }
            };

            Ok(tag)
        })
    }
}

impl<T: Decode> Decode for Box<T> {
    fn compile(c: &mut Compiler<'_>) -> DecodeFn<Self> {
        let inner = c.nested::<T>();

        DecodeFn::new(move |d, to: &mut Self| inner.get(d).call(d, &mut **to))
    }
}

impl<T: 'static> Decode for PhantomData<T> {
    fn compile(_: &mut Compiler<'_>) -> DecodeFn<Self> {
        DecodeFn::unsupported()
    }
}
