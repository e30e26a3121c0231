//! Type tags exchanged between parsers and the decoder.

use core::fmt;

/// The type of the next value in a token stream.
///
/// Parsers return a tag from [`Parser::parse_type`](crate::Parser::parse_type)
/// before any value is extracted. Every tag except [`Nil`](TypeTag::Nil),
/// [`Array`](TypeTag::Array), and [`Map`](TypeTag::Map) identifies a leaf.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// No value has been observed yet.
    #[default]
    Unknown,
    Nil,
    Bool,
    Int,
    Uint,
    Float,
    String,
    Bytes,
    Time,
    Duration,
    Error,
    Array,
    Map,
}

impl TypeTag {
    /// The lowercase name of this tag.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "<unknown>",
            Self::Nil => "nil",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float => "float",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Time => "time",
            Self::Duration => "duration",
            Self::Error => "error",
            Self::Array => "array",
            Self::Map => "map",
        }
    }

    /// Whether values of this tag contain no nested values.
    pub const fn is_leaf(self) -> bool {
        !matches!(self, Self::Nil | Self::Array | Self::Map | Self::Unknown)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
