//! Errors produced while decoding.

use core::str::Utf8Error;
use std::sync::Arc;

use thiserror::Error;

use crate::TypeTag;

/// Crate-local result type.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors occurring while decoding a token stream.
///
/// Parser failures are carried through unchanged in [`Error::Parser`], and a
/// parser signals the end of a container or stream with [`Error::End`].
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Reached the end of a container or stream.
    ///
    /// Returned by [`Parser::parse_array_next`](crate::Parser::parse_array_next)
    /// and [`Parser::parse_map_next`](crate::Parser::parse_map_next) once no
    /// elements remain. Never escapes [`Decoder::decode`](crate::Decoder::decode).
    #[error("Reached the end of the stream.")]
    End,
    /// The observed value cannot be stored in the destination.
    #[error("Cannot convert a value of type {found} to {expected}.")]
    TypeConversion { found: TypeTag, expected: TypeTag },
    /// A number does not fit in the destination width.
    #[error("Value {value} is out of range for {target}.")]
    OutOfRange { value: i128, target: &'static str },
    /// A fixed-size destination received a different number of elements.
    #[error("Array length mismatch, expected {expected} but {found} elements were decoded.")]
    LengthMismatch { expected: usize, found: usize },
    /// The parser ran out of tokens in the middle of a value.
    #[error("Unexpectedly reached the end of the token stream.")]
    Truncated,
    /// The destination type has no decode strategy.
    #[error("The decoder doesn't support values of type {type_name}.")]
    Unsupported { type_name: &'static str },
    /// The parser produced a tag the decoder cannot handle.
    #[error("The parser returned an unsupported value type ({0}).")]
    UnsupportedTag(TypeTag),
    /// A string value was not valid UTF-8.
    #[error("Invalid UTF-8 in string value: {0}.")]
    Utf8(#[from] Utf8Error),
    /// A string value was not a valid RFC 3339 timestamp.
    #[error("Invalid timestamp: {0}.")]
    Timestamp(#[from] chrono::ParseError),
    /// A string value was not a valid duration.
    #[error("Invalid duration {input:?}.")]
    Duration { input: String },
    /// A decode-from-text implementation rejected its input.
    #[error("{0}")]
    Text(String),
    /// An error from the supplied parser.
    #[error("{0}")]
    Parser(Arc<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap a parser failure.
    pub fn parser(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Parser(Arc::new(err))
    }

    /// Build an error rejecting text input.
    pub fn text(msg: impl Into<String>) -> Self {
        Self::Text(msg.into())
    }

    /// Whether this is the end-of-container signal.
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }
}
