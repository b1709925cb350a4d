//! Text Format Serializer
//!
//! JSON encoding with an `@type` discriminator. Struct fields sit next to the
//! discriminator; any other value is wrapped under `@value`.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{FormatError, Result};
use crate::serializer::{Cacheable, Serializer, SerializerFormat, TypeRegistry};

/// Field carrying the type discriminator.
pub const TYPE_FIELD: &str = "@type";

/// Field wrapping values that do not serialize to a JSON object.
pub const VALUE_FIELD: &str = "@value";

// == Text Format Serializer ==
/// Human-readable encoding, slower than the binary format but debuggable.
#[derive(Debug, Clone)]
pub struct TextFormatSerializer {
    registry: Arc<TypeRegistry>,
}

impl TextFormatSerializer {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self { registry }
    }

}

impl Serializer for TextFormatSerializer {
    fn format(&self) -> SerializerFormat {
        SerializerFormat::Text
    }

    fn encode<T: Cacheable>(&self, value: &T) -> Result<Vec<u8>> {
        let body = serde_json::to_value(value).map_err(|e| FormatError::Malformed(e.to_string()))?;
        // Non-finite floats become `null`; only a value with nulls can have lost data.
        if contains_null(&body) && serde_json::from_value::<T>(body.clone()).is_err() {
            return Err(FormatError::Malformed(format!(
                "{} has no JSON representation (non-finite float?)",
                T::type_name()
            ))
            .into());
        }

        let mut object = Map::new();
        object.insert(TYPE_FIELD.to_string(), Value::String(T::type_name().to_string()));
        match body {
            Value::Object(fields) => object.extend(fields),
            other => {
                object.insert(VALUE_FIELD.to_string(), other);
            }
        }

        let bytes = serde_json::to_vec(&Value::Object(object))
            .map_err(|e| FormatError::Malformed(e.to_string()))?;
        Ok(bytes)
    }

    fn decode<T: Cacheable>(&self, bytes: &[u8]) -> Result<T> {
        let parsed: Value = serde_json::from_slice(bytes).map_err(|_| FormatError::UnknownFormat)?;
        let Value::Object(mut object) = parsed else {
            return Err(FormatError::UnknownFormat.into());
        };

        let name = match object.remove(TYPE_FIELD) {
            Some(Value::String(name)) => name,
            Some(_) => {
                return Err(
                    FormatError::Malformed(format!("{} must be a string", TYPE_FIELD)).into(),
                )
            }
            None => return Err(FormatError::UnknownFormat.into()),
        };
        self.registry.check::<T>(&name)?;

        let body = match object.remove(VALUE_FIELD) {
            Some(inner) if object.is_empty() => inner,
            Some(inner) => {
                object.insert(VALUE_FIELD.to_string(), inner);
                Value::Object(object)
            }
            None => Value::Object(object),
        };

        let value =
            serde_json::from_value(body).map_err(|e| FormatError::Malformed(e.to_string()))?;
        Ok(value)
    }
}

fn contains_null(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.iter().any(contains_null),
        Value::Object(fields) => fields.values().any(contains_null),
        _ => false,
    }
}

/// Reads the `@type` discriminator without decoding the value.
pub(crate) fn type_name_of(bytes: &[u8]) -> std::result::Result<String, FormatError> {
    let parsed: Value = serde_json::from_slice(bytes).map_err(|_| FormatError::UnknownFormat)?;
    match parsed.get(TYPE_FIELD) {
        Some(Value::String(name)) => Ok(name.clone()),
        _ => Err(FormatError::UnknownFormat),
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        value: String,
    }

    impl Cacheable for Sample {}

    fn serializer() -> TextFormatSerializer {
        let mut registry = TypeRegistry::with_primitives();
        registry.register::<Sample>();
        TextFormatSerializer::new(Arc::new(registry))
    }

    #[test]
    fn test_struct_shape() {
        let bytes = serializer()
            .encode(&Sample {
                value: "somevalue".to_string(),
            })
            .unwrap();

        let expected = format!(
            r#"{{"@type":"{}","value":"somevalue"}}"#,
            Sample::type_name()
        );
        assert_eq!(String::from_utf8(bytes).unwrap(), expected);
    }

    #[test]
    fn test_primitive_is_wrapped() {
        let ser = serializer();
        let bytes = ser.encode(&"hello".to_string()).unwrap();

        assert_eq!(
            String::from_utf8(bytes.clone()).unwrap(),
            r#"{"@type":"alloc::string::String","@value":"hello"}"#
        );
        assert_eq!(ser.decode::<String>(&bytes).unwrap(), "hello");
    }

    #[test]
    fn test_encode_rejects_non_finite_floats() {
        let ser = serializer();

        for value in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            assert!(matches!(
                ser.encode(&value),
                Err(CacheError::Format(FormatError::Malformed(_)))
            ));
        }
        assert!(ser.encode(&vec![1.0f32, f32::NAN]).is_err());

        let bytes = ser.encode(&1.5f64).unwrap();
        assert_eq!(ser.decode::<f64>(&bytes).unwrap(), 1.5);
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Annotated {
        note: Option<String>,
    }

    impl Cacheable for Annotated {}

    #[test]
    fn test_encode_keeps_absent_options() {
        let mut registry = TypeRegistry::with_primitives();
        registry.register::<Annotated>();
        let ser = TextFormatSerializer::new(Arc::new(registry));

        let bytes = ser.encode(&Annotated { note: None }).unwrap();
        assert_eq!(
            ser.decode::<Annotated>(&bytes).unwrap(),
            Annotated { note: None }
        );
    }

    #[test]
    fn test_decode_restores_struct() {
        let ser = serializer();
        let original = Sample {
            value: "v".to_string(),
        };
        let bytes = ser.encode(&original).unwrap();
        assert_eq!(ser.decode::<Sample>(&bytes).unwrap(), original);
    }

    #[test]
    fn test_decode_rejects_binary_bytes() {
        let result = serializer().decode::<Sample>(&[0xB1, 0x7E, 0x01, 0x00, 0x00]);
        assert!(matches!(
            result,
            Err(CacheError::Format(FormatError::UnknownFormat))
        ));
    }

    #[test]
    fn test_decode_missing_discriminator() {
        let result = serializer().decode::<Sample>(br#"{"value":"x"}"#);
        assert!(matches!(
            result,
            Err(CacheError::Format(FormatError::UnknownFormat))
        ));
    }

    #[test]
    fn test_decode_non_string_discriminator() {
        let result = serializer().decode::<Sample>(br#"{"@type":7,"value":"x"}"#);
        assert!(matches!(
            result,
            Err(CacheError::Format(FormatError::Malformed(_)))
        ));
    }

    #[test]
    fn test_decode_unknown_type() {
        let result = serializer().decode::<Sample>(br#"{"@type":"gone::Type","value":"x"}"#);
        assert!(matches!(
            result,
            Err(CacheError::Format(FormatError::UnknownType(name))) if name == "gone::Type"
        ));
    }

    #[test]
    fn test_decode_missing_field_is_malformed() {
        let raw = format!(r#"{{"@type":"{}"}}"#, Sample::type_name());
        let result = serializer().decode::<Sample>(raw.as_bytes());
        assert!(matches!(
            result,
            Err(CacheError::Format(FormatError::Malformed(_)))
        ));
    }
}
