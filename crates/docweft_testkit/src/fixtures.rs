//! Client fixtures and canned import scenarios.
//!
//! Everything here runs against the in-memory backends, so tests need
//! no external services and leave nothing behind.

use std::ops::Deref;
use std::sync::Arc;

use docweft_backend::{BatchLimits, MemoryDatastore, MemoryFileStore, MemoryFunctions, Snapshot};
use docweft_core::{Client, CoreResult, FileSet, ImportRequest, Model, RelationRule};
use docweft_model::Document;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// A fully wired in-memory client plus concrete backend handles.
///
/// The concrete handles expose what the [`Client`] surface hides, such
/// as flipping the datastore read-only before a commit or registering
/// function handlers.
pub struct TestClient {
    /// The wired client.
    pub client: Client,
    /// Concrete datastore handle, for fault injection and inspection.
    pub datastore: Arc<MemoryDatastore>,
    /// Concrete file store handle.
    pub files: Arc<MemoryFileStore>,
    /// Concrete functions handle, for registering test handlers.
    pub functions: Arc<MemoryFunctions>,
}

impl TestClient {
    /// Creates a client over fresh in-memory backends.
    pub fn new() -> Self {
        Self::with_datastore(Arc::new(MemoryDatastore::new()))
    }

    /// Creates a client whose datastore enforces the given batch limits.
    pub fn with_limits(limits: BatchLimits) -> Self {
        Self::with_datastore(Arc::new(MemoryDatastore::with_limits(limits)))
    }

    fn with_datastore(datastore: Arc<MemoryDatastore>) -> Self {
        let files = Arc::new(MemoryFileStore::new());
        let functions = Arc::new(MemoryFunctions::new());
        let client = Client::builder()
            .datastore(datastore.clone())
            .file_store(files.clone())
            .functions(functions.clone())
            .build()
            .expect("datastore is wired");
        Self {
            client,
            datastore,
            files,
            functions,
        }
    }
}

impl Default for TestClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for TestClient {
    type Target = Client;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

/// Runs a test body against a fresh in-memory client.
///
/// # Example
///
/// ```rust,ignore
/// use docweft_testkit::with_client;
///
/// #[test]
/// fn my_test() {
///     with_client(|client| {
///         let report = client.data_manager().import(request).unwrap();
///         // ... assertions
///     });
/// }
/// ```
pub fn with_client<F, R>(f: F) -> R
where
    F: FnOnce(&Client) -> R,
{
    let test = TestClient::new();
    f(&test.client)
}

/// Minimal serde-backed model for store scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Display title.
    pub title: String,
    /// Page count.
    pub pages: i64,
}

impl Model for Book {
    fn from_snapshot(snapshot: &Snapshot) -> CoreResult<Self> {
        Ok(snapshot.data.deserialize_into()?)
    }

    fn to_document(&self) -> CoreResult<Document> {
        Ok(Document::from_serialize(self)?)
    }
}

/// A three-collection library: authors and tags referenced from books.
///
/// Books carry a scalar `author` field and an array `tags` field, both
/// holding legacy identifiers. The last book points at an author and a
/// tag that do not exist, so a fully working import still reports two
/// unresolved fields. The third author's legacy id is text while the
/// book referencing it holds a number, which exercises string-form
/// matching.
pub fn library_files() -> FileSet {
    FileSet::from_json(json!({
        "authors": [
            { "legacy_id": 1, "name": "Ursula K. Le Guin" },
            { "legacy_id": 2, "name": "Frank Herbert" },
            { "legacy_id": "3", "name": "Octavia Butler" }
        ],
        "books": [
            { "legacy_id": 11, "title": "A Wizard of Earthsea", "author": 1, "tags": ["fantasy", "classic"] },
            { "legacy_id": 12, "title": "Dune", "author": 2, "tags": ["scifi", "classic"] },
            { "legacy_id": 13, "title": "Kindred", "author": 3, "tags": ["scifi"] },
            { "legacy_id": 14, "title": "Orphaned", "author": 99, "tags": ["lost"] }
        ],
        "tags": [
            { "slug": "fantasy" },
            { "slug": "scifi" },
            { "slug": "classic" }
        ]
    }))
    .expect("fixture json is an object of arrays")
}

/// The import request for [`library_files`]: scalar and array relations
/// plus legacy id fields stripped after resolution.
///
/// Stripping `authors.legacy_id` while `books.author` resolves against
/// it shows that candidate keys are read before ignored fields go away.
pub fn library_request() -> ImportRequest {
    ImportRequest::new(library_files())
        .relate("books", RelationRule::new("author", "authors", "legacy_id"))
        .relate("books", RelationRule::new("tags", "tags", "slug"))
        .ignore("authors", "legacy_id")
        .ignore("books", "legacy_id")
}

/// A single self-referencing collection: employees pointing at their
/// manager by employee id. Ada manages herself, so an import flags one
/// self match.
pub fn org_files() -> FileSet {
    FileSet::from_json(json!({
        "employees": [
            { "employee_id": 1, "name": "Ada", "manager": 1 },
            { "employee_id": 2, "name": "Grace", "manager": 1 },
            { "employee_id": 3, "name": "Edsger", "manager": 2 }
        ]
    }))
    .expect("fixture json is an object of arrays")
}

/// The import request for [`org_files`].
pub fn org_request() -> ImportRequest {
    ImportRequest::new(org_files()).relate(
        "employees",
        RelationRule::new("manager", "employees", "employee_id"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_fixture_shape() {
        let files = library_files();
        assert_eq!(files.collection_count(), 3);
        assert_eq!(files.record_count(), 10);
    }

    #[test]
    fn test_client_wires_every_backend() {
        let test = TestClient::new();
        assert!(test.client.bucket("covers").is_ok());
        assert!(test.client.callable::<(), ()>("noop").is_ok());
    }

    #[test]
    fn with_client_hands_out_a_usable_client() {
        let staged = with_client(|client| {
            client
                .data_manager()
                .import(org_request())
                .expect("import succeeds")
                .staged
        });
        assert_eq!(staged, 3);
    }
}
