//! Firestore typed-value decoding.
//!
//! Firestore's JSON wire form wraps every value in a single-key object naming
//! its type (`{"stringValue": "x"}`, `{"integerValue": "42"}`, ...). These
//! helpers unwrap that into plain JSON so documents can be deserialized with
//! serde like any other record.

use serde_json::{Map, Number, Value};

use crate::{FirestoreError, Result};

/// Decode one typed value.
pub fn decode_value(value: &Value) -> Result<Value> {
    let object = value
        .as_object()
        .ok_or_else(|| FirestoreError::Decode(format!("expected typed value, got {}", value)))?;

    let (kind, inner) = object
        .iter()
        .next()
        .ok_or_else(|| FirestoreError::Decode("empty typed value".to_string()))?;

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => Ok(Value::Bool(inner.as_bool().unwrap_or(false))),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => Ok(inner.clone()),
        "integerValue" => decode_integer(inner),
        "doubleValue" => Ok(decode_double(inner)),
        "geoPointValue" => Ok(inner.clone()),
        "arrayValue" => {
            let values = inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect::<Result<Vec<_>>>())
                .transpose()?
                .unwrap_or_default();
            Ok(Value::Array(values))
        }
        "mapValue" => match inner.get("fields").and_then(Value::as_object) {
            Some(fields) => decode_fields(fields),
            None => Ok(Value::Object(Map::new())),
        },
        other => Err(FirestoreError::Decode(format!("unknown value type: {}", other))),
    }
}

/// Decode a document's `fields` map into a plain JSON object.
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Value> {
    let mut out = Map::with_capacity(fields.len());
    for (name, value) in fields {
        out.insert(name.clone(), decode_value(value)?);
    }
    Ok(Value::Object(out))
}

// Integers travel as decimal strings to preserve 64-bit precision.
fn decode_integer(inner: &Value) -> Result<Value> {
    let parsed = match inner {
        Value::String(s) => s.parse::<i64>().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    };
    parsed
        .map(|n| Value::Number(n.into()))
        .ok_or_else(|| FirestoreError::Decode(format!("invalid integerValue: {}", inner)))
}

// NaN and infinities have no JSON representation and decode to null.
fn decode_double(inner: &Value) -> Value {
    let parsed = match inner {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars() {
        assert_eq!(decode_value(&json!({"stringValue": "hi"})).unwrap(), json!("hi"));
        assert_eq!(decode_value(&json!({"integerValue": "500"})).unwrap(), json!(500));
        assert_eq!(decode_value(&json!({"doubleValue": 499.5})).unwrap(), json!(499.5));
        assert_eq!(decode_value(&json!({"booleanValue": true})).unwrap(), json!(true));
        assert_eq!(decode_value(&json!({"nullValue": null})).unwrap(), Value::Null);
        assert_eq!(
            decode_value(&json!({"timestampValue": "2024-05-01T10:00:00Z"})).unwrap(),
            json!("2024-05-01T10:00:00Z")
        );
    }

    #[test]
    fn test_non_finite_double_is_null() {
        assert_eq!(decode_value(&json!({"doubleValue": "NaN"})).unwrap(), Value::Null);
    }

    #[test]
    fn test_nested_values() {
        let value = json!({
            "mapValue": {
                "fields": {
                    "tags": {"arrayValue": {"values": [
                        {"stringValue": "plumbing"},
                        {"integerValue": "3"}
                    ]}},
                    "location": {"geoPointValue": {"latitude": 12.9, "longitude": 77.6}},
                    "empty": {"arrayValue": {}}
                }
            }
        });

        assert_eq!(
            decode_value(&value).unwrap(),
            json!({
                "tags": ["plumbing", 3],
                "location": {"latitude": 12.9, "longitude": 77.6},
                "empty": []
            })
        );
    }

    #[test]
    fn test_invalid_values() {
        assert!(decode_value(&json!("bare")).is_err());
        assert!(decode_value(&json!({})).is_err());
        assert!(decode_value(&json!({"integerValue": "12.5"})).is_err());
        assert!(decode_value(&json!({"vectorValue": {}})).is_err());
    }
}
