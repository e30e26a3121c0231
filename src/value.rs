//! Dynamically-typed values.

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

use crate::TypeTag;

mod parser;

pub use parser::ValueParser;

/// A value of no fixed type, shaped by the tags observed while decoding.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    /// Raw bytes, including string values that are not valid UTF-8.
    Bytes(Vec<u8>),
    Time(DateTime<Utc>),
    Duration(TimeDelta),
    Error(ErrorValue),
    Array(Vec<Value>),
    /// Entries in the order they were decoded.
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// The tag a parser reports for this value.
    pub fn tag(&self) -> TypeTag {
        match self {
            Self::Nil => TypeTag::Nil,
            Self::Bool(_) => TypeTag::Bool,
            Self::Int(_) => TypeTag::Int,
            Self::Uint(_) => TypeTag::Uint,
            Self::Float(_) => TypeTag::Float,
            Self::String(_) => TypeTag::String,
            Self::Bytes(_) => TypeTag::Bytes,
            Self::Time(_) => TypeTag::Time,
            Self::Duration(_) => TypeTag::Duration,
            Self::Error(_) => TypeTag::Error,
            Self::Array(_) => TypeTag::Array,
            Self::Map(_) => TypeTag::Map,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Look up the first map entry with a string key equal to `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let Self::Map(entries) = self else {
            return None;
        };

        entries
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }
}

macro_rules! value_from {
    ($($t:ty => $variant:ident),* $(,)?) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Self::$variant(v.into())
            }
        }
    )*};
}

value_from! {
    bool => Bool,
    i64 => Int,
    i32 => Int,
    u64 => Uint,
    u32 => Uint,
    f64 => Float,
    String => String,
    &str => String,
    Vec<u8> => Bytes,
    DateTime<Utc> => Time,
    TimeDelta => Duration,
    ErrorValue => Error,
    Vec<Value> => Array,
}

/// A generic error carried as a value in a token stream.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Error)]
#[error("{message}")]
pub struct ErrorValue {
    message: String,
}

impl ErrorValue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
