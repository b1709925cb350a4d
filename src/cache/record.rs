//! Serialized Record Module
//!
//! Raw view of what a key holds in the backend.

use crate::error::FormatError;
use crate::serializer::SerializerFormat;

// == Serialized Record ==
/// Bytes stored under a key, together with the format that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedRecord {
    pub key: String,
    pub bytes: Vec<u8>,
    pub format: SerializerFormat,
}

impl SerializedRecord {
    pub fn new(key: impl Into<String>, bytes: Vec<u8>, format: SerializerFormat) -> Self {
        Self {
            key: key.into(),
            bytes,
            format,
        }
    }

    /// Builds a record by sniffing the format of stored bytes.
    pub fn detect(key: impl Into<String>, bytes: Vec<u8>) -> Result<Self, FormatError> {
        let format = SerializerFormat::detect(&bytes).ok_or(FormatError::UnknownFormat)?;
        Ok(Self::new(key, bytes, format))
    }

    /// Type discriminator embedded in the bytes.
    pub fn type_name(&self) -> Result<String, FormatError> {
        self.format.type_name_of(&self.bytes)
    }

    /// Lossy UTF-8 rendering, handy for eyeballing the format.
    pub fn to_text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_text_record() {
        let record = SerializedRecord::detect("key", br#"{"@type":"a::B","value":"v"}"#.to_vec())
            .unwrap();

        assert_eq!(record.format, SerializerFormat::Text);
        assert_eq!(record.type_name().unwrap(), "a::B");
        assert!(record.to_text_lossy().contains("\"value\":\"v\""));
    }

    #[test]
    fn test_detect_unknown_bytes() {
        assert_eq!(
            SerializedRecord::detect("key", b"raw".to_vec()),
            Err(FormatError::UnknownFormat)
        );
    }
}
