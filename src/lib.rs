//! A format-agnostic deserialization engine.
//!
//! Unspool turns a stream of typed tokens into Rust values. Wire formats are
//! supplied by implementing [`Parser`], which reports the [`TypeTag`] of each
//! value and extracts its contents; the engine takes care of dispatching on the
//! destination type, checking numeric bounds, walking containers, and matching
//! record fields by name.
//!
//! Most users should begin with [`decode`] or [`Decoder::decode`], deriving
//! [`Decode`](macro@Decode) for their record types. Long arrays can be consumed
//! one element at a time with a [`StreamDecoder`], and values of no fixed shape
//! decode into a [`Value`].
//!
//! Each destination type compiles its decode function once; functions are
//! cached in a [`Registry`], which is safe to share between threads.
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `derive`: enable the derive macro (default).

mod decoder;
mod error;
mod parser;
mod registry;
mod stream;
mod tag;
pub mod value;

pub use decoder::{
    DecodeText, DecodeValue, Decoder, Fields, FromErrorValue, MapDecodeFn, Pair, Record, decode,
};
pub use error::{Error, Result};
pub use parser::{Parser, Peeked};
pub use registry::{Compiler, Decode, DecodeFn, Nested, Options, Registry};
pub use stream::StreamDecoder;
pub use tag::TypeTag;
pub use value::{ErrorValue, Value, ValueParser};

/// Derive [`Decode`] for a struct with named fields.
///
/// By default the struct decodes from a map, matching keys against field
/// names. Keys with no matching field are skipped.
///
/// ```ignore
/// #[derive(Default, Decode)]
/// struct Reading {
///     #[decode(rename = "ts")]
///     timestamp: DateTime<Utc>,
///     value: f64,
///     #[decode(skip)]
///     cached: Option<String>,
/// }
/// ```
///
/// ## Attributes
///
/// On the struct, at most one of:
///
/// - `#[decode(custom)]`: decode through [`DecodeValue`].
/// - `#[decode(text)]`: decode through [`DecodeText`].
/// - `#[decode(error)]`: decode through [`FromErrorValue`].
///
/// These also apply to enums and tuple structs. On fields:
///
/// - `#[decode(rename = "...")]`: match a key other than the field name.
/// - `#[decode(skip)]`: never decode this field.
#[cfg(feature = "derive")]
pub use unspool_derive::Decode;
