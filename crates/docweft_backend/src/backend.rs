//! Datastore trait definitions.

use std::sync::mpsc;

use docweft_model::{Document, DocumentRef, Value};

use crate::error::BackendResult;
use crate::query::StructuredQuery;

/// A document read from a datastore: the reference it lives at plus its data.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Where the document lives.
    pub reference: DocumentRef,
    /// The document's fields.
    pub data: Document,
}

impl Snapshot {
    /// Create a snapshot.
    #[must_use]
    pub fn new(reference: DocumentRef, data: Document) -> Self {
        Self { reference, data }
    }

    /// The document id within its collection.
    #[must_use]
    pub fn id(&self) -> &str {
        self.reference.id()
    }

    /// Shorthand for a field of the snapshot's data.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }
}

/// How a `set` write treats fields already present at the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetMode {
    /// The write fully replaces the document.
    Overwrite,
    /// Top-level fields are merged into the existing document.
    Merge,
}

/// A single field mutation applied by [`Datastore::update`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// Set the field to a value.
    Set {
        /// Field name.
        field: String,
        /// New value.
        value: Value,
    },
    /// Remove the field.
    Delete {
        /// Field name.
        field: String,
    },
    /// Append values not already present to an array field.
    ///
    /// A non-array field is replaced by the resulting array.
    ArrayUnion {
        /// Field name.
        field: String,
        /// Values to add.
        values: Vec<Value>,
    },
    /// Remove every equal occurrence of the values from an array field.
    ///
    /// A non-array field is replaced by an empty array.
    ArrayRemove {
        /// Field name.
        field: String,
        /// Values to remove.
        values: Vec<Value>,
    },
}

impl FieldUpdate {
    /// Set a field.
    pub fn set(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Set {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Delete a field.
    pub fn delete(field: impl Into<String>) -> Self {
        Self::Delete {
            field: field.into(),
        }
    }

    /// Add values to an array field, skipping ones already present.
    pub fn array_union(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::ArrayUnion {
            field: field.into(),
            values,
        }
    }

    /// Remove values from an array field.
    pub fn array_remove(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::ArrayRemove {
            field: field.into(),
            values,
        }
    }
}

/// One delivery on a document watch.
///
/// `data` is `None` when the document does not exist (either at registration
/// time or because it was deleted).
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChange {
    /// The watched reference.
    pub reference: DocumentRef,
    /// Current document state, if it exists.
    pub data: Option<Document>,
}

/// One delivery on a query watch: the full current result set.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryChange {
    /// Matching documents, in query order.
    pub snapshots: Vec<Snapshot>,
}

/// A document datastore.
///
/// This is the seam between DocWeft and whatever actually stores documents.
/// Implementations must be shareable across threads; all methods take
/// `&self` and synchronize internally.
///
/// # Invariants
///
/// - `new_reference` allocates identity only; no write happens until data is
///   committed at the reference, and allocating has no observable effect on
///   the store.
/// - `batch` writes are all-or-nothing: a rejected commit leaves no staged
///   document observable.
/// - Watches deliver the current state once at registration, then once per
///   subsequent change.
///
/// # Implementors
///
/// - [`super::MemoryDatastore`] - in-process store for tests and demos
pub trait Datastore: Send + Sync {
    /// Allocate a fresh, unique reference within a collection.
    ///
    /// Callable any number of times without side effects on the store.
    fn new_reference(&self, collection: &str) -> DocumentRef;

    /// Reference to a known document id.
    fn reference(&self, collection: &str, id: &str) -> DocumentRef {
        DocumentRef::new(collection, id)
    }

    /// Start an atomic multi-document write.
    fn batch(&self) -> Box<dyn WriteBatch>;

    /// Read one document. `Ok(None)` when it does not exist.
    fn get(&self, reference: &DocumentRef) -> BackendResult<Option<Snapshot>>;

    /// Write one document, overwriting or merging per `mode`.
    fn set(&self, reference: &DocumentRef, data: Document, mode: SetMode) -> BackendResult<()>;

    /// Apply field updates to an existing document.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BackendError::NotFound`] if the document does not
    /// exist; updates never create documents.
    fn update(&self, reference: &DocumentRef, updates: Vec<FieldUpdate>) -> BackendResult<()>;

    /// Delete one document. Deleting a missing document is not an error.
    fn delete(&self, reference: &DocumentRef) -> BackendResult<()>;

    /// Run a query and return matching documents in query order.
    fn run_query(&self, query: &StructuredQuery) -> BackendResult<Vec<Snapshot>>;

    /// Count the documents the query would return.
    fn count(&self, query: &StructuredQuery) -> BackendResult<u64>;

    /// Watch one document for changes.
    fn watch_document(
        &self,
        reference: &DocumentRef,
    ) -> BackendResult<mpsc::Receiver<DocumentChange>>;

    /// Watch a query's result set for changes.
    fn watch_query(&self, query: &StructuredQuery)
        -> BackendResult<mpsc::Receiver<QueryChange>>;
}

/// An atomic multi-document write in progress.
///
/// Writes are staged locally and nothing reaches the store until
/// [`WriteBatch::commit`]; commit applies every staged write or none.
pub trait WriteBatch: Send {
    /// Stage one overwrite at a reference. Repeatable; staging the same
    /// reference twice keeps the later write.
    fn stage(&mut self, reference: &DocumentRef, data: Document) -> BackendResult<()>;

    /// Commit every staged write as one indivisible operation.
    ///
    /// # Errors
    ///
    /// Any constraint violation (write count, document size, permissions)
    /// rejects the whole batch with a single error and applies nothing.
    fn commit(self: Box<Self>) -> BackendResult<()>;
}
