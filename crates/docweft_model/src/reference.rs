//! Reference handles addressing documents in named collections.

use std::fmt;

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ModelError, ModelResult};
use crate::json::REF_KEY;

/// An opaque handle addressing one document location.
///
/// A reference pairs a collection name with a document id. It uniquely
/// addresses the location before and after the document is written, which
/// is what lets the import engine allocate identities for a whole file set
/// up front and wire records to each other ahead of the commit.
///
/// # Example
///
/// ```rust,ignore
/// let fresh = DocumentRef::generate("users");
/// let known = DocumentRef::new("users", "u-42");
/// assert_eq!(known.path(), "users/u-42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentRef {
    collection: String,
    id: String,
}

impl DocumentRef {
    /// Reference to a known document id.
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Mint a reference with a fresh, globally unique id.
    ///
    /// Nothing is written; the id exists only in memory until a write
    /// lands at this reference.
    pub fn generate(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: Uuid::new_v4().to_string(),
        }
    }

    /// The collection this reference points into.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The document id within the collection.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Render as a `"collection/id"` path.
    #[must_use]
    pub fn path(&self) -> String {
        format!("{}/{}", self.collection, self.id)
    }

    /// Parse a `"collection/id"` path.
    ///
    /// Both components must be non-empty and the id must not itself
    /// contain a slash.
    pub fn parse_path(path: &str) -> ModelResult<Self> {
        match path.split_once('/') {
            Some((collection, id))
                if !collection.is_empty() && !id.is_empty() && !id.contains('/') =>
            {
                Ok(Self::new(collection, id))
            }
            _ => Err(ModelError::invalid_ref_path(path)),
        }
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

// References serialize as a single-entry map, `{"$ref": "collection/id"}`,
// so typed models holding a DocumentRef survive the JSON bridge intact.
impl Serialize for DocumentRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(REF_KEY, &self.path())?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for DocumentRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Repr {
            #[serde(rename = "$ref")]
            path: String,
        }

        let repr = Repr::deserialize(deserializer)?;
        DocumentRef::parse_path(&repr.path).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_distinct() {
        let a = DocumentRef::generate("users");
        let b = DocumentRef::generate("users");
        assert_eq!(a.collection(), "users");
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
    }

    #[test]
    fn path_round_trip() {
        let r = DocumentRef::new("books", "b-1");
        assert_eq!(r.path(), "books/b-1");
        assert_eq!(DocumentRef::parse_path("books/b-1").unwrap(), r);
        assert_eq!(r.to_string(), "books/b-1");
    }

    #[test]
    fn bad_paths_are_rejected() {
        assert!(DocumentRef::parse_path("no-slash").is_err());
        assert!(DocumentRef::parse_path("/id").is_err());
        assert!(DocumentRef::parse_path("col/").is_err());
        assert!(DocumentRef::parse_path("a/b/c").is_err());
    }

    #[test]
    fn serde_uses_ref_shape() {
        let r = DocumentRef::new("users", "u-1");
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json, serde_json::json!({ "$ref": "users/u-1" }));

        let back: DocumentRef = serde_json::from_value(json).unwrap();
        assert_eq!(back, r);
    }
}
