//! Binary Format Serializer
//!
//! Layout: magic (2 bytes), version (1 byte), big-endian `u16` type-name
//! length, UTF-8 type name, bincode payload.

use std::sync::Arc;

use bincode::Options;

use crate::error::{FormatError, Result};
use crate::serializer::{Cacheable, Serializer, SerializerFormat, TypeRegistry};

/// Leading bytes of every binary-encoded value.
pub const BINARY_MAGIC: [u8; 2] = [0xB1, 0x7E];

/// Current layout version.
pub const BINARY_VERSION: u8 = 0x01;

const HEADER_LEN: usize = 5;

/// Fixed-width integers; the payload must span the rest of the record.
fn payload_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

// == Binary Format Serializer ==
/// Compact encoding that embeds the full type name ahead of the payload.
#[derive(Debug, Clone)]
pub struct BinaryFormatSerializer {
    registry: Arc<TypeRegistry>,
}

impl BinaryFormatSerializer {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self { registry }
    }
}

impl Serializer for BinaryFormatSerializer {
    fn format(&self) -> SerializerFormat {
        SerializerFormat::Binary
    }

    fn encode<T: Cacheable>(&self, value: &T) -> Result<Vec<u8>> {
        let name = T::type_name();
        let name_len = u16::try_from(name.len()).map_err(|_| {
            FormatError::Malformed(format!("type name exceeds {} bytes", u16::MAX))
        })?;

        let mut out = Vec::with_capacity(HEADER_LEN + name.len() + 32);
        out.extend_from_slice(&BINARY_MAGIC);
        out.push(BINARY_VERSION);
        out.extend_from_slice(&name_len.to_be_bytes());
        out.extend_from_slice(name.as_bytes());
        payload_options()
            .serialize_into(&mut out, value)
            .map_err(|e| FormatError::Malformed(e.to_string()))?;

        Ok(out)
    }

    fn decode<T: Cacheable>(&self, bytes: &[u8]) -> Result<T> {
        let (name, payload) = split_header(bytes)?;
        self.registry.check::<T>(name)?;

        let value = payload_options()
            .deserialize(payload)
            .map_err(|e| FormatError::Malformed(e.to_string()))?;
        Ok(value)
    }
}

/// Reads the embedded type name without decoding the payload.
pub(crate) fn type_name_of(bytes: &[u8]) -> std::result::Result<&str, FormatError> {
    split_header(bytes).map(|(name, _)| name)
}

/// Splits encoded bytes into the type name and the payload.
fn split_header(bytes: &[u8]) -> std::result::Result<(&str, &[u8]), FormatError> {
    if !bytes.starts_with(&BINARY_MAGIC) {
        return Err(FormatError::UnknownFormat);
    }
    if bytes.len() < HEADER_LEN {
        return Err(FormatError::Truncated);
    }
    if bytes[2] != BINARY_VERSION {
        return Err(FormatError::Malformed(format!(
            "unsupported layout version {}",
            bytes[2]
        )));
    }

    let name_len = u16::from_be_bytes([bytes[3], bytes[4]]) as usize;
    let rest = &bytes[HEADER_LEN..];
    if rest.len() < name_len {
        return Err(FormatError::Truncated);
    }

    let (name, payload) = rest.split_at(name_len);
    let name = std::str::from_utf8(name)
        .map_err(|_| FormatError::Malformed("type name is not UTF-8".to_string()))?;
    Ok((name, payload))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        value: String,
    }

    impl Cacheable for Sample {}

    fn serializer() -> BinaryFormatSerializer {
        let mut registry = TypeRegistry::with_primitives();
        registry.register::<Sample>();
        BinaryFormatSerializer::new(Arc::new(registry))
    }

    fn sample() -> Sample {
        Sample {
            value: "somevalue".to_string(),
        }
    }

    #[test]
    fn test_header_embeds_type_name() {
        let bytes = serializer().encode(&sample()).unwrap();
        let name = Sample::type_name();

        assert_eq!(&bytes[..2], &BINARY_MAGIC);
        assert_eq!(bytes[2], BINARY_VERSION);
        assert_eq!(u16::from_be_bytes([bytes[3], bytes[4]]) as usize, name.len());
        assert_eq!(&bytes[5..5 + name.len()], name.as_bytes());
        assert!(name.ends_with("Sample"));
    }

    #[test]
    fn test_decode_restores_value() {
        let ser = serializer();
        let bytes = ser.encode(&sample()).unwrap();
        assert_eq!(ser.decode::<Sample>(&bytes).unwrap(), sample());

        let bytes = ser.encode(&42i64).unwrap();
        assert_eq!(ser.decode::<i64>(&bytes).unwrap(), 42);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let ser = serializer();
        assert_eq!(ser.encode(&sample()).unwrap(), ser.encode(&sample()).unwrap());
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Tagged {
        tags: BTreeMap<String, u32>,
    }

    impl Cacheable for Tagged {}

    #[test]
    fn test_ordered_map_encoding_ignores_insertion_order() {
        let ser = serializer();
        let mut forward = BTreeMap::new();
        let mut backward = BTreeMap::new();
        for (i, tag) in ["a", "b", "c", "d"].iter().enumerate() {
            forward.insert(tag.to_string(), i as u32);
        }
        for (i, tag) in ["a", "b", "c", "d"].iter().enumerate().rev() {
            backward.insert(tag.to_string(), i as u32);
        }

        assert_eq!(
            ser.encode(&Tagged { tags: forward }).unwrap(),
            ser.encode(&Tagged { tags: backward }).unwrap()
        );
    }

    #[test]
    fn test_decode_rejects_foreign_bytes() {
        let result = serializer().decode::<Sample>(br#"{"@type":"x"}"#);
        assert!(matches!(
            result,
            Err(CacheError::Format(FormatError::UnknownFormat))
        ));
    }

    #[test]
    fn test_decode_truncated_header() {
        let ser = serializer();
        assert!(matches!(
            ser.decode::<Sample>(&[0xB1, 0x7E, 0x01]),
            Err(CacheError::Format(FormatError::Truncated))
        ));

        let bytes = ser.encode(&sample()).unwrap();
        assert!(matches!(
            ser.decode::<Sample>(&bytes[..8]),
            Err(CacheError::Format(FormatError::Truncated))
        ));
    }

    #[test]
    fn test_decode_unregistered_type() {
        let bytes = serializer().encode(&sample()).unwrap();
        let other = BinaryFormatSerializer::new(Arc::new(TypeRegistry::with_primitives()));

        assert!(matches!(
            other.decode::<Sample>(&bytes),
            Err(CacheError::Format(FormatError::UnknownType(_)))
        ));
    }

    #[test]
    fn test_decode_as_wrong_type() {
        let ser = serializer();
        let bytes = ser.encode(&sample()).unwrap();

        assert!(matches!(
            ser.decode::<String>(&bytes),
            Err(CacheError::Format(FormatError::TypeMismatch { .. }))
        ));
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        let ser = serializer();
        let mut bytes = ser.encode(&7i64).unwrap();
        bytes.extend_from_slice(b"garbage");

        assert!(matches!(
            ser.decode::<i64>(&bytes),
            Err(CacheError::Format(FormatError::Malformed(_)))
        ));
    }

    #[test]
    fn test_payload_layout_is_fixed_width() {
        let bytes = serializer().encode(&7i64).unwrap();
        let payload = &bytes[HEADER_LEN + i64::type_name().len()..];
        assert_eq!(payload, &7i64.to_le_bytes());
    }

    #[test]
    fn test_decode_unsupported_version() {
        let ser = serializer();
        let mut bytes = ser.encode(&sample()).unwrap();
        bytes[2] = 0x09;

        assert!(matches!(
            ser.decode::<Sample>(&bytes),
            Err(CacheError::Format(FormatError::Malformed(_)))
        ));
    }
}
