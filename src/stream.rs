//! Decoding the elements of a top-level array one at a time.

use std::sync::Arc;

use crate::{
    Decode, Decoder, Error, Pair, Parser, Peeked, Registry, Result, TypeTag, Value,
    decoder::{MapDecodeFn, truncated},
};

/// A cursor over the elements of a top-level array.
///
/// Each call to [`next`](StreamDecoder::next) decodes one element, so the
/// array is never held in memory as a whole. A top-level value that is not an
/// array is yielded once, as a single element.
///
/// Once the stream ends or fails, every later call returns the same error
/// without touching the parser.
///
/// ```ignore
/// let mut stream = StreamDecoder::new(&mut parser);
/// let mut item = Item::default();
///
/// while stream.next(&mut item).is_ok() {
///     process(&item);
/// }
///
/// if let Some(err) = stream.err() {
///     return Err(err.clone());
/// }
/// ```
pub struct StreamDecoder<'a> {
    parser: &'a mut dyn Parser,
    registry: &'a Registry,
    map_fn: Option<MapDecodeFn>,
    /// The top-level tag, once observed.
    tag: TypeTag,
    count: usize,
    /// The number of elements, if known.
    max: Option<usize>,
    /// The terminal error, replayed on every later call.
    err: Option<Error>,
}

impl<'a> StreamDecoder<'a> {
    pub fn new(parser: &'a mut dyn Parser) -> Self {
        Self {
            parser,
            registry: Registry::global(),
            map_fn: None,
            tag: TypeTag::Unknown,
            count: 0,
            max: None,
            err: None,
        }
    }

    /// Use `registry` to resolve decode functions.
    pub fn with_registry(mut self, registry: &'a Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Decode maps into [`Value`] destinations with `f`.
    ///
    /// See [`Decoder::with_map_decoder`].
    pub fn with_map_decoder<F>(mut self, f: F) -> Self
    where
        F: Fn(Pair<'_>, &mut Vec<(Value, Value)>) -> Result<()> + Send + Sync + 'static,
    {
        self.map_fn = Some(Arc::new(f));
        self
    }

    /// The number of elements decoded so far.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Decode the next element into `to`.
    ///
    /// Returns [`Error::End`] once no elements remain. An element cut short by
    /// the end of the token stream fails with [`Error::Truncated`] instead,
    /// which ends the stream and is reported by [`err`](StreamDecoder::err).
    pub fn next<T: Decode>(&mut self, to: &mut T) -> Result<()> {
        if let Some(err) = &self.err {
            return Err(err.clone());
        }

        let result = self.step(to);

        if let Err(err) = &result {
            if err.is_end() {
                log::debug!("stream ended after {} elements", self.count);
            } else {
                log::debug!("stream failed after {} elements: {err}", self.count);
            }
            self.err = Some(err.clone());
        }

        result
    }

    /// The error that terminated the stream, if it did not end naturally.
    pub fn err(&self) -> Option<&Error> {
        self.err.as_ref().filter(|err| !err.is_end())
    }

    fn step<T: Decode>(&mut self, to: &mut T) -> Result<()> {
        if self.tag == TypeTag::Unknown {
            let tag = self.parser.parse_type()?;
            self.tag = tag;

            if tag != TypeTag::Array {
                self.max = Some(1);

                let mut peeked = Peeked::new(&mut *self.parser, tag);
                decode_element(&mut peeked, self.registry, &self.map_fn, to)?;

                self.count = 1;
                return Ok(());
            }

            self.max = self.parser.parse_array_begin()?;
        }

        if self.max.is_some_and(|max| self.count >= max) {
            if self.tag == TypeTag::Array {
                // Only reached once: the terminal error is replayed after.
                self.parser.parse_array_end(self.count)?;
            }
            Err(Error::End)?;
        }

        if self.max.is_none() || self.count != 0 {
            if let Err(err) = self.parser.parse_array_next(self.count) {
                if err.is_end() {
                    self.max = Some(self.count);
                    self.parser.parse_array_end(self.count)?;
                }
                return Err(err);
            }
        }

        decode_element(&mut *self.parser, self.registry, &self.map_fn, to)?;
        self.count += 1;
        Ok(())
    }
}

fn decode_element<T: Decode>(
    parser: &mut dyn Parser,
    registry: &Registry,
    map_fn: &Option<MapDecodeFn>,
    to: &mut T,
) -> Result<()> {
    let mut d = Decoder::from_parts(parser, registry, map_fn.clone());
    truncated(d.decode_value(to))?;
    Ok(())
}
