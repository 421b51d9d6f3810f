//! JSON <-> Firestore typed `Value` conversion.

use super::Fields;
use crate::error::{Error, Result};
use serde_json::{json, Map, Value};

pub fn encode_fields(fields: &Fields) -> Value {
    let encoded: Map<String, Value> = fields
        .iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect();
    Value::Object(encoded)
}

fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            // Firestore carries int64 as a decimal string.
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Decodes the `fields` object of a Firestore document. A missing object
/// decodes as an empty document.
pub fn decode_fields(fields: Option<&Value>) -> Result<Fields> {
    let Some(fields) = fields else {
        return Ok(Map::new());
    };
    let obj = fields
        .as_object()
        .ok_or_else(|| Error::Malformed("document fields is not an object".to_string()))?;
    obj.iter()
        .map(|(k, v)| decode_value(v).map(|d| (k.clone(), d)))
        .collect()
}

fn decode_value(value: &Value) -> Result<Value> {
    let obj = value
        .as_object()
        .ok_or_else(|| Error::Malformed(format!("unexpected Firestore value {}", value)))?;
    let Some((kind, inner)) = obj.iter().next() else {
        return Ok(Value::Null);
    };
    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => Ok(Value::Bool(inner.as_bool().unwrap_or_default())),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                Value::Number(n) => n.as_i64(),
                _ => None,
            };
            parsed
                .map(Value::from)
                .ok_or_else(|| Error::Malformed(format!("bad integerValue {}", inner)))
        }
        "doubleValue" => Ok(inner.as_f64().map(Value::from).unwrap_or(Value::Null)),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => {
            Ok(inner.clone())
        }
        "arrayValue" => {
            let values = inner
                .get("values")
                .and_then(|v| v.as_array())
                .map(|items| items.iter().map(decode_value).collect::<Result<Vec<_>>>())
                .transpose()?
                .unwrap_or_default();
            Ok(Value::Array(values))
        }
        "mapValue" => decode_fields(inner.get("fields")).map(Value::Object),
        "geoPointValue" => Ok(inner.clone()),
        other => Err(Error::Malformed(format!("unknown Firestore value type {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_movie_arrays_as_typed_values() {
        let fields = json!({
            "favorites": [{ "id": 550, "title": "Fight Club", "vote_average": 8.4, "poster_path": null }],
            "watchlist": []
        });
        let encoded = encode_fields(fields.as_object().unwrap());
        let movie = &encoded["favorites"]["arrayValue"]["values"][0]["mapValue"]["fields"];
        assert_eq!(movie["id"], json!({ "integerValue": "550" }));
        assert_eq!(movie["vote_average"], json!({ "doubleValue": 8.4 }));
        assert_eq!(movie["poster_path"], json!({ "nullValue": null }));
        assert_eq!(encoded["watchlist"], json!({ "arrayValue": { "values": [] } }));
    }

    #[test]
    fn decodes_firestore_document_fields() {
        let raw = json!({
            "rating": { "integerValue": "4" },
            "text": { "stringValue": "Great" },
            "tags": { "arrayValue": {} },
            "nested": { "mapValue": { "fields": { "ok": { "booleanValue": true } } } }
        });
        let decoded = decode_fields(Some(&raw)).unwrap();
        assert_eq!(decoded["rating"], json!(4));
        assert_eq!(decoded["text"], json!("Great"));
        assert_eq!(decoded["tags"], json!([]));
        assert_eq!(decoded["nested"], json!({ "ok": true }));
        assert!(decode_fields(None).unwrap().is_empty());
    }

    #[test]
    fn rejects_unknown_value_types() {
        let raw = json!({ "x": { "mysteryValue": 1 } });
        assert!(matches!(decode_fields(Some(&raw)), Err(Error::Malformed(_))));
    }
}
