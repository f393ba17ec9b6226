//! Document type: an ordered map of named field values.

use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ModelResult;
use crate::json;
use crate::value::Value;

/// An ordered map of field name to [`Value`].
///
/// Documents are what stores read and write and what the import engine
/// stages into batches. Field order is stable (sorted by name), which keeps
/// structural comparison and rendering deterministic.
///
/// # Example
///
/// ```rust,ignore
/// let doc = Document::new()
///     .with("title", "Dune")
///     .with("pages", 412);
/// assert_eq!(doc.get("pages"), Some(&Value::Integer(412)));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    fields: BTreeMap<String, Value>,
}

impl Document {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style insert, consuming and returning the document.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Insert a field value, returning the previous value if any.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    /// Get a field value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Get a mutable field value.
    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.fields.get_mut(field)
    }

    /// Remove a field, returning its value if it was present.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Check whether a field is present.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check whether the document has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Iterate over field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Merge `other` into this document; fields of `other` win on conflict.
    pub fn merge(&mut self, other: Document) {
        for (field, value) in other.fields {
            self.fields.insert(field, value);
        }
    }

    /// Consuming merge, for builder chains.
    #[must_use]
    pub fn merged_with(mut self, other: Document) -> Self {
        self.merge(other);
        self
    }

    /// Build a document from any serializable type via its JSON form.
    ///
    /// The value must serialize to a JSON object. This is the cheap way to
    /// implement a typed store model without writing field plumbing by hand.
    pub fn from_serialize<T: Serialize>(value: &T) -> ModelResult<Self> {
        let raw = serde_json::to_value(value)?;
        json::document_from_json(raw)
    }

    /// Deserialize this document into any `serde` type via its JSON form.
    pub fn deserialize_into<T: DeserializeOwned>(&self) -> ModelResult<T> {
        let raw = json::document_to_json(self);
        Ok(serde_json::from_value(raw)?)
    }
}

impl From<BTreeMap<String, Value>> for Document {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self { fields }
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_and_accessors() {
        let doc = Document::new().with("title", "Dune").with("pages", 412i64);

        assert_eq!(doc.len(), 2);
        assert!(doc.contains("title"));
        assert_eq!(doc.get("pages"), Some(&Value::Integer(412)));
        assert_eq!(doc.get("missing"), None);
    }

    #[test]
    fn remove_returns_value() {
        let mut doc = Document::new().with("a", 1i64);
        assert_eq!(doc.remove("a"), Some(Value::Integer(1)));
        assert_eq!(doc.remove("a"), None);
        assert!(doc.is_empty());
    }

    #[test]
    fn merge_prefers_other() {
        let mut base = Document::new().with("kept", 1i64).with("clobbered", 1i64);
        base.merge(Document::new().with("clobbered", 2i64).with("added", 3i64));

        assert_eq!(base.get("kept"), Some(&Value::Integer(1)));
        assert_eq!(base.get("clobbered"), Some(&Value::Integer(2)));
        assert_eq!(base.get("added"), Some(&Value::Integer(3)));
    }

    #[test]
    fn iteration_is_name_ordered() {
        let doc = Document::new().with("z", 1i64).with("a", 2i64).with("m", 3i64);
        let names: Vec<&str> = doc.field_names().collect();
        assert_eq!(names, vec!["a", "m", "z"]);
    }

    #[test]
    fn serde_bridge_round_trip() {
        #[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq)]
        struct Book {
            title: String,
            pages: i64,
        }

        let book = Book {
            title: "Dune".to_string(),
            pages: 412,
        };
        let doc = Document::from_serialize(&book).unwrap();
        assert_eq!(doc.get("title"), Some(&Value::Text("Dune".to_string())));

        let back: Book = doc.deserialize_into().unwrap();
        assert_eq!(back, book);
    }

    #[test]
    fn from_serialize_rejects_non_objects() {
        let err = Document::from_serialize(&42i64).unwrap_err();
        assert!(err.to_string().contains("object"));
    }
}
