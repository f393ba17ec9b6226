//! Bridge between the document value model and `serde_json`.
//!
//! Import files and RPC payloads arrive as JSON; documents leave as JSON
//! when handed to typed models. The mapping is lossless in both directions:
//! integral numbers become [`Value::Integer`], everything else numeric
//! becomes [`Value::Double`], and reference handles render as a
//! single-entry `{"$ref": "collection/id"}` object that is recognized on
//! the way back in.

use serde_json::Value as JsonValue;

use crate::document::Document;
use crate::error::{ModelError, ModelResult};
use crate::reference::DocumentRef;
use crate::value::Value;

/// Key marking a serialized reference handle.
pub const REF_KEY: &str = "$ref";

/// Convert a JSON value into a document value.
#[must_use]
pub fn value_from_json(json: JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(b),
        JsonValue::Number(n) => n
            .as_i64()
            .map(Value::Integer)
            .or_else(|| n.as_f64().map(Value::Double))
            .unwrap_or(Value::Null),
        JsonValue::String(s) => Value::Text(s),
        JsonValue::Array(items) => {
            Value::Array(items.into_iter().map(value_from_json).collect())
        }
        JsonValue::Object(map) => {
            // A single-entry {"$ref": "collection/id"} object is a
            // reference handle; anything else is an ordinary map.
            if map.len() == 1 {
                if let Some(JsonValue::String(path)) = map.get(REF_KEY) {
                    if let Ok(reference) = DocumentRef::parse_path(path) {
                        return Value::Reference(reference);
                    }
                }
            }
            Value::Map(
                map.into_iter()
                    .map(|(field, value)| (field, value_from_json(value)))
                    .collect(),
            )
        }
    }
}

/// Convert a document value into a JSON value.
#[must_use]
pub fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Integer(n) => JsonValue::from(*n),
        Value::Double(d) => {
            // JSON has no NaN/infinity; those degrade to null.
            serde_json::Number::from_f64(*d).map_or(JsonValue::Null, JsonValue::Number)
        }
        Value::Text(s) => JsonValue::String(s.clone()),
        Value::Reference(r) => serde_json::json!({ REF_KEY: r.path() }),
        Value::Array(items) => JsonValue::Array(items.iter().map(value_to_json).collect()),
        Value::Map(doc) => document_to_json(doc),
    }
}

/// Convert a JSON object into a [`Document`].
///
/// Errors if the JSON value is not an object (or is a reference shape,
/// which is a value, not a document).
pub fn document_from_json(json: JsonValue) -> ModelResult<Document> {
    match value_from_json(json) {
        Value::Map(doc) => Ok(doc),
        other => Err(ModelError::not_an_object(other.type_name())),
    }
}

/// Render a [`Document`] as a JSON object.
#[must_use]
pub fn document_to_json(doc: &Document) -> JsonValue {
    JsonValue::Object(
        doc.iter()
            .map(|(field, value)| (field.clone(), value_to_json(value)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_map_both_ways() {
        assert_eq!(value_from_json(json!(null)), Value::Null);
        assert_eq!(value_from_json(json!(true)), Value::Bool(true));
        assert_eq!(value_from_json(json!(7)), Value::Integer(7));
        assert_eq!(value_from_json(json!(2.5)), Value::Double(2.5));
        assert_eq!(value_from_json(json!("x")), Value::Text("x".to_string()));

        assert_eq!(value_to_json(&Value::Integer(7)), json!(7));
        assert_eq!(value_to_json(&Value::Double(2.5)), json!(2.5));
    }

    #[test]
    fn integral_numbers_stay_integers() {
        assert_eq!(value_from_json(json!(3)), Value::Integer(3));
        // 3.0 parses as a float literal and stays a double.
        assert_eq!(value_from_json(json!(3.0)), Value::Double(3.0));
    }

    #[test]
    fn reference_shape_round_trips() {
        let v = value_from_json(json!({ "$ref": "users/u-1" }));
        assert_eq!(v, Value::Reference(DocumentRef::new("users", "u-1")));
        assert_eq!(value_to_json(&v), json!({ "$ref": "users/u-1" }));
    }

    #[test]
    fn malformed_reference_stays_a_map() {
        let v = value_from_json(json!({ "$ref": "not-a-path" }));
        assert!(matches!(v, Value::Map(_)));

        let v = value_from_json(json!({ "$ref": "users/u-1", "extra": 1 }));
        assert!(matches!(v, Value::Map(_)));
    }

    #[test]
    fn document_conversion_rejects_non_objects() {
        assert!(document_from_json(json!([1, 2])).is_err());
        assert!(document_from_json(json!("text")).is_err());
        assert!(document_from_json(json!({ "$ref": "a/b" })).is_err());

        let doc = document_from_json(json!({ "name": "Ada", "age": 36 })).unwrap();
        assert_eq!(doc.get("age"), Some(&Value::Integer(36)));
    }

    #[test]
    fn nested_structures_round_trip() {
        let original = json!({
            "name": "Ada",
            "tags": ["math", "pioneer"],
            "scores": { "logic": 10, "ratio": 0.5 },
            "advisor": { "$ref": "people/p-1" }
        });
        let doc = document_from_json(original.clone()).unwrap();
        assert_eq!(document_to_json(&doc), original);
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    // No float leaf: NaN and infinity have no JSON form.
    fn json_strategy() -> impl Strategy<Value = JsonValue> {
        let leaf = prop_oneof![
            Just(JsonValue::Null),
            any::<bool>().prop_map(JsonValue::from),
            any::<i64>().prop_map(JsonValue::from),
            "[a-z0-9]{0,8}".prop_map(JsonValue::from),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(JsonValue::Array),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                    .prop_map(|m| JsonValue::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn any_json_round_trips(json in json_strategy()) {
            let value = value_from_json(json.clone());
            prop_assert_eq!(value_to_json(&value), json);
        }
    }
}
