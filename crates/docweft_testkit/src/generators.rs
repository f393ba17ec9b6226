//! Property-based generators using proptest.
//!
//! Provides strategies for random documents and file sets that stay
//! inside the JSON-safe subset of [`Value`], so generated data survives
//! the JSON bridge and can feed an import.

use docweft_core::FileSet;
use docweft_model::{Document, Value};
use proptest::prelude::*;

/// Strategy for collection and field identifiers.
pub fn identifier() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,11}").expect("valid regex")
}

/// Strategy for leaf values: no arrays, maps, or references.
pub fn scalar_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        (-1.0e9..1.0e9f64).prop_map(Value::Double),
        prop::string::string_regex("[a-zA-Z0-9 ]{0,16}")
            .expect("valid regex")
            .prop_map(Value::Text),
    ]
}

/// Strategy for JSON-safe values, nested up to three levels deep.
pub fn json_value() -> impl Strategy<Value = Value> {
    scalar_value().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec((identifier(), inner), 0..4)
                .prop_map(|fields| Value::Map(document_from_fields(fields))),
        ]
    })
}

/// Strategy for documents with identifier field names.
pub fn document() -> impl Strategy<Value = Document> {
    prop::collection::vec((identifier(), json_value()), 0..6).prop_map(document_from_fields)
}

/// Strategy for small file sets: a few named collections of documents.
pub fn file_set() -> impl Strategy<Value = FileSet> {
    prop::collection::btree_map(identifier(), prop::collection::vec(document(), 0..5), 0..4)
        .prop_map(|collections| {
            collections
                .into_iter()
                .fold(FileSet::new(), |files, (name, records)| {
                    files.with_collection(name, records)
                })
        })
}

fn document_from_fields(fields: Vec<(String, Value)>) -> Document {
    fields
        .into_iter()
        .fold(Document::new(), |doc, (name, value)| doc.with(name, value))
}

/// Configuration presets for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of cases to run per property.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to a proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
