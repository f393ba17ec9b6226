//! Bulk import with cross-collection relationship resolution.
//!
//! [`DataManager::import`] turns a set of named record collections into one
//! atomic batch of document writes, rewriting identifier-like field values
//! into references to the records they name.

mod report;
mod resolve;

pub use report::{ImportReport, UnresolvedField};

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use docweft_backend::Datastore;
use docweft_model::{document_from_json, value_from_json, Document, ModelError};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::CoreResult;
use resolve::WorkingRecord;

/// Named record collections to import, e.g. parsed from data files.
///
/// Collection insertion order and record order within a collection are both
/// preserved; together they form the discovery order that breaks ties
/// during relationship resolution.
#[derive(Debug, Clone, Default)]
pub struct FileSet {
    entries: Vec<(String, Vec<Document>)>,
}

impl FileSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds records under a collection name, chainable.
    #[must_use]
    pub fn with_collection(
        mut self,
        collection: impl Into<String>,
        records: Vec<Document>,
    ) -> Self {
        self.insert(collection, records);
        self
    }

    /// Adds records under a collection name.
    ///
    /// Records for a collection already present are appended after the
    /// existing ones.
    pub fn insert(&mut self, collection: impl Into<String>, records: Vec<Document>) {
        let collection = collection.into();
        match self
            .entries
            .iter_mut()
            .find(|(name, _)| *name == collection)
        {
            Some((_, existing)) => existing.extend(records),
            None => self.entries.push((collection, records)),
        }
    }

    /// Builds a set from a JSON object mapping collection names to arrays
    /// of records.
    ///
    /// # Errors
    ///
    /// Errors if the value is not an object, a collection's value is not
    /// an array, or a record is not an object.
    pub fn from_json(json: JsonValue) -> CoreResult<Self> {
        let map = match json {
            JsonValue::Object(map) => map,
            other => {
                return Err(ModelError::not_an_object(value_from_json(other).type_name()).into())
            }
        };

        let mut set = Self::new();
        for (collection, records) in map {
            let JsonValue::Array(items) = records else {
                return Err(ModelError::field(collection, "expected an array of records").into());
            };
            let documents = items
                .into_iter()
                .map(document_from_json)
                .collect::<Result<Vec<_>, _>>()?;
            set.insert(collection, documents);
        }
        Ok(set)
    }

    /// Iterates collections in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Document])> {
        self.entries
            .iter()
            .map(|(name, records)| (name.as_str(), records.as_slice()))
    }

    /// Number of collections in the set.
    #[must_use]
    pub fn collection_count(&self) -> usize {
        self.entries.len()
    }

    /// Total number of records across all collections.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.entries.iter().map(|(_, records)| records.len()).sum()
    }

    /// Whether the set holds no records at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }
}

/// A relationship declaration.
///
/// Rewrites `from_property` values of a source collection's records into
/// references to records of `to_collection` whose `to_property` value has
/// the same string form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationRule {
    /// Field holding the identifier value(s) to rewrite.
    pub from_property: String,
    /// Collection to look for matching records in.
    pub to_collection: String,
    /// Field of the target records holding the comparable identifier.
    pub to_property: String,
}

impl RelationRule {
    /// Creates a rule.
    pub fn new(
        from_property: impl Into<String>,
        to_collection: impl Into<String>,
        to_property: impl Into<String>,
    ) -> Self {
        Self {
            from_property: from_property.into(),
            to_collection: to_collection.into(),
            to_property: to_property.into(),
        }
    }
}

/// Everything one import call needs: the records, the relationship rules,
/// and the fields to strip before writing.
#[derive(Debug, Clone, Default)]
pub struct ImportRequest {
    /// Records to import.
    pub files: FileSet,
    /// Relationship rules per source collection.
    pub relations: HashMap<String, Vec<RelationRule>>,
    /// Fields to strip per collection, applied after resolution.
    pub ignore: HashMap<String, Vec<String>>,
}

impl ImportRequest {
    /// Starts a request from the records to import.
    #[must_use]
    pub fn new(files: FileSet) -> Self {
        Self {
            files,
            relations: HashMap::new(),
            ignore: HashMap::new(),
        }
    }

    /// Registers a relationship rule for a source collection.
    #[must_use]
    pub fn relate(mut self, collection: impl Into<String>, rule: RelationRule) -> Self {
        self.relations
            .entry(collection.into())
            .or_default()
            .push(rule);
        self
    }

    /// Strips a field from a collection's records before they are written.
    ///
    /// Stripping happens after resolution, so an ignored field can still
    /// drive relationship matching.
    #[must_use]
    pub fn ignore(mut self, collection: impl Into<String>, field: impl Into<String>) -> Self {
        self.ignore
            .entry(collection.into())
            .or_default()
            .push(field.into());
        self
    }
}

/// Bulk importer: resolves relationships across record sets and commits
/// every record as one atomic batch.
///
/// # Example
///
/// ```rust,ignore
/// let manager = client.data_manager();
/// let files = FileSet::new()
///     .with_collection("authors", authors)
///     .with_collection("books", books);
/// let report = manager.import(
///     ImportRequest::new(files)
///         .relate("books", RelationRule::new("author", "authors", "slug"))
///         .ignore("books", "raw_author"),
/// )?;
/// ```
pub struct DataManager {
    datastore: Arc<dyn Datastore>,
}

impl DataManager {
    /// Creates a manager over a datastore.
    #[must_use]
    pub fn new(datastore: Arc<dyn Datastore>) -> Self {
        Self { datastore }
    }

    /// Imports a set of record collections as one atomic batch.
    ///
    /// In order:
    ///
    /// 1. Allocate a fresh reference for every record, before any
    ///    resolution. Re-running an import therefore writes new records
    ///    each time rather than overwriting the previous run's.
    /// 2. Resolve relationship rules. Identifier values that match a
    ///    record of the rule's target collection (comparing string forms
    ///    on both sides) become references to it; values that match
    ///    nothing stay as they are and are listed in the report.
    /// 3. Strip ignored fields.
    /// 4. Stage every record and commit once; the batch lands whole or
    ///    not at all.
    ///
    /// A record may resolve a field to its own reference when a rule
    /// targets the record's own collection and the key values coincide;
    /// such matches are counted in the report rather than suppressed.
    ///
    /// # Errors
    ///
    /// Only a rejected batch commit fails an import; the backend's error
    /// is returned unchanged. Unresolved relationships are never errors.
    pub fn import(&self, request: ImportRequest) -> CoreResult<ImportReport> {
        let mut working = Vec::with_capacity(request.files.record_count());
        for (collection, records) in request.files.iter() {
            for (index, document) in records.iter().enumerate() {
                working.push(WorkingRecord {
                    collection: collection.to_string(),
                    index,
                    reference: self.datastore.new_reference(collection),
                    document: document.clone(),
                });
            }
        }

        let resolution = resolve::resolve(&working, &request.relations);

        let mut documents = resolution.documents;
        for (record, document) in working.iter().zip(documents.iter_mut()) {
            if let Some(fields) = request.ignore.get(&record.collection) {
                for field in fields {
                    document.remove(field);
                }
            }
        }

        let mut batch = self.datastore.batch();
        for (record, document) in working.iter().zip(documents) {
            batch.stage(&record.reference, document)?;
        }
        batch.commit()?;

        let mut collections = BTreeMap::new();
        for record in &working {
            *collections.entry(record.collection.clone()).or_insert(0) += 1;
        }
        let report = ImportReport {
            staged: working.len(),
            collections,
            resolved: resolution.resolved,
            self_matches: resolution.self_matches,
            unresolved: resolution.unresolved,
        };
        debug!(
            "imported {} records ({} resolved, {} unresolved)",
            report.staged,
            report.resolved,
            report.unresolved.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docweft_backend::{MemoryDatastore, StructuredQuery};
    use serde_json::json;

    #[test]
    fn fileset_preserves_insertion_order() {
        let set = FileSet::new()
            .with_collection("zebras", vec![Document::new()])
            .with_collection("apples", vec![Document::new(), Document::new()]);

        let names: Vec<&str> = set.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["zebras", "apples"]);
        assert_eq!(set.collection_count(), 2);
        assert_eq!(set.record_count(), 3);
    }

    #[test]
    fn fileset_insert_appends_to_existing_collection() {
        let mut set = FileSet::new();
        set.insert("books", vec![Document::new().with("title", "Dune")]);
        set.insert("books", vec![Document::new().with("title", "Hyperion")]);

        assert_eq!(set.collection_count(), 1);
        assert_eq!(set.record_count(), 2);
        let (_, records) = set.iter().next().unwrap();
        assert_eq!(records[1].get("title"), Some(&"Hyperion".into()));
    }

    #[test]
    fn fileset_from_json_object_of_arrays() {
        let set = FileSet::from_json(json!({
            "authors": [{ "name": "Herbert" }],
            "books": [{ "title": "Dune" }, { "title": "Messiah" }]
        }))
        .unwrap();

        assert_eq!(set.collection_count(), 2);
        assert_eq!(set.record_count(), 3);
    }

    #[test]
    fn fileset_from_json_rejects_bad_shapes() {
        assert!(FileSet::from_json(json!([1, 2])).is_err());
        assert!(FileSet::from_json(json!({ "books": { "title": "Dune" } })).is_err());
        assert!(FileSet::from_json(json!({ "books": ["not a record"] })).is_err());
    }

    #[test]
    fn request_builders_accumulate() {
        let request = ImportRequest::new(FileSet::new())
            .relate("books", RelationRule::new("author", "authors", "slug"))
            .relate("books", RelationRule::new("publisher", "publishers", "id"))
            .ignore("books", "raw_author")
            .ignore("authors", "scratch");

        assert_eq!(request.relations["books"].len(), 2);
        assert_eq!(request.ignore["books"], vec!["raw_author"]);
        assert_eq!(request.ignore["authors"], vec!["scratch"]);
    }

    #[test]
    fn resolved_and_ignored_fields_are_counted_but_not_written() {
        let datastore = Arc::new(MemoryDatastore::new());
        let manager = DataManager::new(datastore.clone());

        let files = FileSet::new()
            .with_collection(
                "authors",
                vec![Document::new()
                    .with("slug", "herbert")
                    .with("name", "Frank Herbert")],
            )
            .with_collection(
                "books",
                vec![Document::new().with("title", "Dune").with("author", "herbert")],
            );
        let report = manager
            .import(
                ImportRequest::new(files)
                    .relate("books", RelationRule::new("author", "authors", "slug"))
                    .ignore("books", "author"),
            )
            .unwrap();

        assert_eq!(report.resolved, 1, "the rewrite still counts");

        let books = datastore.run_query(&StructuredQuery::new("books")).unwrap();
        assert_eq!(books.len(), 1);
        assert!(
            books[0].get("author").is_none(),
            "the ignored field is stripped after resolution"
        );
        assert_eq!(books[0].get("title"), Some(&"Dune".into()));
    }
}
