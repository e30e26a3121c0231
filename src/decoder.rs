//! The decoder driving parsers into destination values.
//!
//! A [`Decoder`] wraps a [`Parser`] and populates destinations through the
//! compiled [`DecodeFn`]s of their types. Leaf types coerce the observed tag to
//! their representation, checking numeric bounds; containers walk the parser's
//! begin/next/end protocol and recurse.
//!
//! Types can take over their own decoding through three capabilities, tried in
//! this order by the derive macro:
//!
//! - [`DecodeValue`]: full control, driving the decoder directly.
//! - [`DecodeText`]: receives the raw bytes of a string or byte value.
//! - [`FromErrorValue`]: built from an error value, or from text.

use std::sync::Arc;

use crate::{
    Decode, DecodeFn, Error, Parser, Registry, Result, TypeTag,
    value::{ErrorValue, Value},
};

mod any;
mod container;
mod duration;
mod record;
mod scalar;

pub use record::{Fields, Record};

/// A function decoding one map entry of a dynamic value.
///
/// Installed with [`Decoder::with_map_decoder`] to replace how maps are
/// decoded when the destination is a [`Value`]. It receives the entry and the
/// entries decoded so far.
pub type MapDecodeFn = Arc<dyn Fn(Pair<'_>, &mut Vec<(Value, Value)>) -> Result<()> + Send + Sync>;

/// Decodes values from a parser.
///
/// A decoder borrows its parser exclusively and is not meant to be shared
/// between threads.
pub struct Decoder<'a> {
    parser: &'a mut dyn Parser,
    registry: &'a Registry,
    map_fn: Option<MapDecodeFn>,
    /// Index + 1 of the map entry whose value this decoder will read, or 0.
    off: usize,
}

impl<'a> Decoder<'a> {
    /// Create a decoder using the global registry.
    pub fn new(parser: &'a mut dyn Parser) -> Self {
        Self {
            parser,
            registry: Registry::global(),
            map_fn: None,
            off: 0,
        }
    }

    pub(crate) fn from_parts(
        parser: &'a mut dyn Parser,
        registry: &'a Registry,
        map_fn: Option<MapDecodeFn>,
    ) -> Self {
        Self {
            parser,
            registry,
            map_fn,
            off: 0,
        }
    }

    /// Use `registry` to resolve decode functions.
    pub fn with_registry(mut self, registry: &'a Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Decode maps into [`Value`] destinations with `f`.
    pub fn with_map_decoder<F>(mut self, f: F) -> Self
    where
        F: Fn(Pair<'_>, &mut Vec<(Value, Value)>) -> Result<()> + Send + Sync + 'static,
    {
        self.map_fn = Some(Arc::new(f));
        self
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// Decode the next value into `to`.
    ///
    /// On failure, `to` is left unchanged for leaves and reset to its default
    /// for records.
    pub fn decode<T: Decode>(&mut self, to: &mut T) -> Result<()> {
        truncated(self.handshake())?;
        truncated(self.decode_value(to))?;
        Ok(())
    }

    /// Decode an array, calling `f` to decode each element.
    ///
    /// Returns the observed tag; a nil value is accepted as an empty array.
    pub fn decode_array<F>(&mut self, f: F) -> Result<TypeTag>
    where
        F: FnMut(&mut Decoder<'_>) -> Result<()>,
    {
        let tag = truncated(self.begin())?;
        truncated(self.decode_array_impl(tag, f))?;
        Ok(tag)
    }

    /// Decode a map, calling `f` to decode each entry.
    ///
    /// Returns the observed tag; a nil value is accepted as an empty map.
    pub fn decode_map<F>(&mut self, mut f: F) -> Result<TypeTag>
    where
        F: FnMut(Pair<'_>) -> Result<()>,
    {
        let tag = truncated(self.begin())?;
        truncated(self.decode_map_impl(tag, |d, index| f(d.pair(index))))?;
        Ok(tag)
    }

    /// Notify the parser of a pending move from a map key to its value.
    fn handshake(&mut self) -> Result<()> {
        if self.off != 0 {
            let index = self.off - 1;
            self.off = 0;
            self.parser.parse_map_value(index)?;
        }
        Ok(())
    }

    fn begin(&mut self) -> Result<TypeTag> {
        self.handshake()?;
        self.parser.parse_type()
    }

    fn child(&mut self, off: usize) -> Decoder<'_> {
        Decoder {
            parser: &mut *self.parser,
            registry: self.registry,
            map_fn: self.map_fn.clone(),
            off,
        }
    }

    fn pair(&mut self, index: usize) -> Pair<'_> {
        Pair {
            decoder: self.child(0),
            index,
        }
    }

    pub(crate) fn decode_value<T: Decode>(&mut self, to: &mut T) -> Result<TypeTag> {
        self.registry.resolve::<T>().call(self, to)
    }

    pub(crate) fn decode_array_impl<F>(&mut self, tag: TypeTag, mut f: F) -> Result<()>
    where
        F: FnMut(&mut Self) -> Result<()>,
    {
        let n = match tag {
            TypeTag::Nil => return self.parser.parse_nil(),
            TypeTag::Array => self.parser.parse_array_begin()?,
            found => Err(Error::TypeConversion {
                found,
                expected: TypeTag::Array,
            })?,
        };

        let mut i = 0;

        while n.is_none_or(|n| i < n) {
            if n.is_none() || i != 0 {
                match self.parser.parse_array_next(i) {
                    Err(Error::End) => break,
                    r => r?,
                }
            }

            f(self)?;
            i += 1;
        }

        self.parser.parse_array_end(i)
    }

    /// Walk a map, calling `f` with the index of each entry.
    ///
    /// `f` must decode the key, call `parse_map_value` with the index, and
    /// then decode the value.
    pub(crate) fn decode_map_impl<F>(&mut self, tag: TypeTag, mut f: F) -> Result<()>
    where
        F: FnMut(&mut Self, usize) -> Result<()>,
    {
        let n = match tag {
            TypeTag::Nil => return self.parser.parse_nil(),
            TypeTag::Map => self.parser.parse_map_begin()?,
            found => Err(Error::TypeConversion {
                found,
                expected: TypeTag::Map,
            })?,
        };

        let mut i = 0;

        while n.is_none_or(|n| i < n) {
            if n.is_none() || i != 0 {
                match self.parser.parse_map_next(i) {
                    Err(Error::End) => break,
                    r => r?,
                }
            }

            f(self, i)?;
            i += 1;
        }

        self.parser.parse_map_end(i)
    }

    /// Read a nil, string, or byte value as raw bytes.
    fn parse_text(&mut self, expected: TypeTag) -> Result<(TypeTag, &[u8])> {
        let tag = self.parser.parse_type()?;
        self.parse_text_from(tag, expected).map(|b| (tag, b))
    }

    fn parse_text_from(&mut self, tag: TypeTag, expected: TypeTag) -> Result<&[u8]> {
        match tag {
            TypeTag::Nil => self.parser.parse_nil().map(|_| &[][..]),
            TypeTag::String => self.parser.parse_string(),
            TypeTag::Bytes => self.parser.parse_bytes(),
            found => Err(Error::TypeConversion { found, expected }),
        }
    }
}

/// One entry of a map being decoded.
///
/// Decode the key through [`key`](Pair::key) first, then the value through
/// [`value`](Pair::value). The value decoder tells the parser it is moving
/// from the key to the value before it reads anything.
pub struct Pair<'a> {
    decoder: Decoder<'a>,
    index: usize,
}

impl Pair<'_> {
    /// The zero-based index of this entry.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn key(&mut self) -> Decoder<'_> {
        self.decoder.child(0)
    }

    pub fn value(&mut self) -> Decoder<'_> {
        let off = self.index + 1;
        self.decoder.child(off)
    }
}

/// Take full control of decoding a value.
///
/// Nil handling is left to the implementation.
pub trait DecodeValue {
    fn decode_value(&mut self, d: &mut Decoder<'_>) -> Result<()>;
}

/// Decode a value from the raw bytes of a string or byte value.
///
/// A nil value is passed as an empty slice.
pub trait DecodeText {
    fn decode_text(&mut self, text: &[u8]) -> Result<()>;
}

/// Build a value from an error carried in the token stream.
pub trait FromErrorValue {
    fn from_error_value(err: ErrorValue) -> Self;
}

impl<T: Decode + DecodeValue> DecodeFn<T> {
    /// Decode through [`DecodeValue`].
    pub fn custom() -> Self {
        DecodeFn::new(|d, to: &mut T| {
            to.decode_value(d)?;
            // Any tag but nil, so indirections keep the value.
            Ok(TypeTag::Bool)
        })
    }
}

impl<T: Decode + DecodeText> DecodeFn<T> {
    /// Decode through [`DecodeText`].
    pub fn text() -> Self {
        DecodeFn::new(|d, to: &mut T| {
            let (tag, text) = d.parse_text(TypeTag::String)?;
            to.decode_text(text)?;
            Ok(tag)
        })
    }
}

impl<T: Decode + FromErrorValue> DecodeFn<T> {
    /// Decode through [`FromErrorValue`].
    pub fn error() -> Self {
        DecodeFn::new(|d, to: &mut T| {
            let tag = d.parser.parse_type()?;

            *to = match tag {
                TypeTag::Nil => {
                    d.parser.parse_nil()?;
                    T::default()
                }
                TypeTag::String | TypeTag::Bytes => {
                    let text = d.parse_text_from(tag, TypeTag::Error)?;
                    T::from_error_value(ErrorValue::new(String::from_utf8_lossy(text)))
                }
                TypeTag::Error => T::from_error_value(d.parser.parse_error()?),
                found => Err(Error::TypeConversion {
                    found,
                    expected: TypeTag::Error,
                })?,
            };

            Ok(tag)
        })
    }
}

impl FromErrorValue for ErrorValue {
    fn from_error_value(err: ErrorValue) -> Self {
        err
    }
}

/// Report an end signal escaping a value as a truncated stream.
pub(crate) fn truncated<T>(result: Result<T>) -> Result<T> {
    match result {
        Err(Error::End) => Err(Error::Truncated),
        result => result,
    }
}

/// Decode a fresh `T` from `parser` using the global registry.
pub fn decode<T: Decode>(parser: &mut dyn Parser) -> Result<T> {
    let mut value = T::default();
    Decoder::new(parser).decode(&mut value)?;
    Ok(value)
}
