//! Serializer Module
//!
//! Pluggable value encodings. Both formats embed a type discriminator that is
//! resolved against an explicit [`TypeRegistry`] on decode.

mod binary;
mod registry;
mod text;

use std::fmt;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{FormatError, Result};

pub use binary::{BinaryFormatSerializer, BINARY_MAGIC, BINARY_VERSION};
pub use registry::TypeRegistry;
pub use text::{TextFormatSerializer, TYPE_FIELD, VALUE_FIELD};

// == Cacheable ==
/// A value that can be stored through a [`Serializer`].
///
/// Domain types opt in with an empty impl; the discriminator defaults to the
/// fully-qualified Rust type path.
///
/// Set membership compares encoded bytes, so equal values must encode to the
/// same bytes. Use `BTreeMap`/`BTreeSet` rather than `HashMap`/`HashSet` for
/// fields of types stored in sets.
pub trait Cacheable: Serialize + DeserializeOwned + 'static {
    /// Name embedded in encoded bytes to identify the declared type.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

macro_rules! impl_cacheable {
    ($($ty:ty),* $(,)?) => {
        $(impl Cacheable for $ty {})*
    };
}

impl_cacheable!(String, bool, char, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl<T: Cacheable> Cacheable for Vec<T> {}

// == Serializer Format ==
/// Identifies which encoding produced a byte sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SerializerFormat {
    /// Compact header + bincode payload
    Binary,
    /// JSON object carrying an `@type` field
    Text,
}

impl SerializerFormat {
    /// Sniffs the format from the leading bytes, if recognizable.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&BINARY_MAGIC) {
            return Some(SerializerFormat::Binary);
        }
        match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'{') => Some(SerializerFormat::Text),
            _ => None,
        }
    }

    /// Reads the type discriminator embedded in bytes of this format.
    pub fn type_name_of(&self, bytes: &[u8]) -> std::result::Result<String, FormatError> {
        match self {
            SerializerFormat::Binary => binary::type_name_of(bytes).map(str::to_string),
            SerializerFormat::Text => text::type_name_of(bytes),
        }
    }
}

impl fmt::Display for SerializerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializerFormat::Binary => f.write_str("binary"),
            SerializerFormat::Text => f.write_str("text"),
        }
    }
}

// == Serializer ==
/// Converts cacheable values to and from bytes.
///
/// Encoding the same value twice with the same serializer yields identical
/// bytes.
pub trait Serializer {
    /// The format this serializer produces.
    fn format(&self) -> SerializerFormat;

    /// Encodes `value` together with its type discriminator.
    fn encode<T: Cacheable>(&self, value: &T) -> Result<Vec<u8>>;

    /// Decodes bytes into `T`.
    ///
    /// Fails with a format error when the bytes are not in this serializer's
    /// format, or the embedded type is unknown or is not `T`.
    fn decode<T: Cacheable>(&self, bytes: &[u8]) -> Result<T>;
}
