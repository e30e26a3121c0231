//! The token parser contract consumed by the decoder.
//!
//! A [`Parser`] turns some wire format into a stream of typed tokens. The
//! decoder first asks for the [`TypeTag`] of the next value with
//! [`parse_type`](Parser::parse_type), then calls exactly one extraction
//! method matching that tag.
//!
//! Containers are walked with a begin/next/end protocol. `*_begin` returns the
//! number of elements when known, or `None` for a streamed container whose end
//! is signalled by `*_next` returning [`Error::End`](crate::Error::End). When
//! the length is known, `*_next` is called before every element except the
//! first; when streaming, it is called before every element. `*_end` is
//! always called with the number of elements consumed.
//!
//! Between the key and the value of each map entry the decoder calls
//! [`parse_map_value`](Parser::parse_map_value) with the entry index, for
//! formats that need to consume a separator there.

use chrono::{DateTime, TimeDelta, Utc};

use crate::{Result, TypeTag, value::ErrorValue};

/// A source of typed tokens.
pub trait Parser {
    /// Consume the type indicator of the next value.
    fn parse_type(&mut self) -> Result<TypeTag>;

    fn parse_nil(&mut self) -> Result<()>;
    fn parse_bool(&mut self) -> Result<bool>;
    fn parse_int(&mut self) -> Result<i64>;
    fn parse_uint(&mut self) -> Result<u64>;
    fn parse_float(&mut self) -> Result<f64>;

    /// Extract a string value as raw bytes.
    ///
    /// The slice may borrow parser-owned memory; the decoder copies it.
    fn parse_string(&mut self) -> Result<&[u8]>;
    /// Extract a byte sequence.
    ///
    /// The slice may borrow parser-owned memory; the decoder copies it.
    fn parse_bytes(&mut self) -> Result<&[u8]>;
    fn parse_time(&mut self) -> Result<DateTime<Utc>>;
    fn parse_duration(&mut self) -> Result<TimeDelta>;
    fn parse_error(&mut self) -> Result<ErrorValue>;

    /// Begin an array, returning its length if known.
    fn parse_array_begin(&mut self) -> Result<Option<usize>>;
    /// Advance to element `n` of an array, or return `Error::End`.
    fn parse_array_next(&mut self, n: usize) -> Result<()>;
    /// End an array after `n` elements.
    fn parse_array_end(&mut self, n: usize) -> Result<()>;

    /// Begin a map, returning its number of entries if known.
    fn parse_map_begin(&mut self) -> Result<Option<usize>>;
    /// Advance to entry `n` of a map, or return `Error::End`.
    fn parse_map_next(&mut self, n: usize) -> Result<()>;
    /// Move from the key of entry `n` to its value.
    fn parse_map_value(&mut self, n: usize) -> Result<()>;
    /// End a map after `n` entries.
    fn parse_map_end(&mut self, n: usize) -> Result<()>;
}

/// A parser that serves an already-consumed type tag once before deferring to
/// the wrapped parser.
pub struct Peeked<'a> {
    inner: &'a mut dyn Parser,
    tag: Option<TypeTag>,
}

impl<'a> Peeked<'a> {
    pub fn new(inner: &'a mut dyn Parser, tag: TypeTag) -> Self {
        Self {
            inner,
            tag: Some(tag),
        }
    }
}

impl Parser for Peeked<'_> {
    fn parse_type(&mut self) -> Result<TypeTag> {
        match self.tag.take() {
            Some(tag) => Ok(tag),
            None => self.inner.parse_type(),
        }
    }
    fn parse_nil(&mut self) -> Result<()> {
        self.inner.parse_nil()
    }
    fn parse_bool(&mut self) -> Result<bool> {
        self.inner.parse_bool()
    }
    fn parse_int(&mut self) -> Result<i64> {
        self.inner.parse_int()
    }
    fn parse_uint(&mut self) -> Result<u64> {
        self.inner.parse_uint()
    }
    fn parse_float(&mut self) -> Result<f64> {
        self.inner.parse_float()
    }
    fn parse_string(&mut self) -> Result<&[u8]> {
        self.inner.parse_string()
    }
    fn parse_bytes(&mut self) -> Result<&[u8]> {
        self.inner.parse_bytes()
    }
    fn parse_time(&mut self) -> Result<DateTime<Utc>> {
        self.inner.parse_time()
    }
    fn parse_duration(&mut self) -> Result<TimeDelta> {
        self.inner.parse_duration()
    }
    fn parse_error(&mut self) -> Result<ErrorValue> {
        self.inner.parse_error()
    }
    fn parse_array_begin(&mut self) -> Result<Option<usize>> {
        self.inner.parse_array_begin()
    }
    fn parse_array_next(&mut self, n: usize) -> Result<()> {
        self.inner.parse_array_next(n)
    }
    fn parse_array_end(&mut self, n: usize) -> Result<()> {
        self.inner.parse_array_end(n)
    }
    fn parse_map_begin(&mut self) -> Result<Option<usize>> {
        self.inner.parse_map_begin()
    }
    fn parse_map_next(&mut self, n: usize) -> Result<()> {
        self.inner.parse_map_next(n)
    }
    fn parse_map_value(&mut self, n: usize) -> Result<()> {
        self.inner.parse_map_value(n)
    }
    fn parse_map_end(&mut self, n: usize) -> Result<()> {
        self.inner.parse_map_end(n)
    }
}
