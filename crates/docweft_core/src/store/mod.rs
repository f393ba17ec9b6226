//! Typed store over one collection.

mod model;
mod query;

pub use model::Model;
pub use query::{Pagination, QueryOptions};

use std::marker::PhantomData;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use docweft_backend::{
    Datastore, DocumentChange, FieldUpdate, FilterGroup, QueryChange, SetMode, Snapshot,
    StructuredQuery,
};
use docweft_model::{Document, DocumentRef, Value};

use crate::error::{default_hook, CoreError, CoreResult, ErrorHook};

/// Configuration of a typed store.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Collection path in the datastore.
    pub path: String,
    /// Singular display name.
    pub singular: String,
    /// Plural display name.
    pub plural: String,
    /// Fields merged underneath every created record.
    pub default_data: Document,
    /// Fields whose `Null` value in a save means "delete the field".
    pub delete_on_null: Vec<String>,
}

impl StoreOptions {
    /// Options for a collection path; display names default to the path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            singular: path.clone(),
            plural: path.clone(),
            path,
            default_data: Document::new(),
            delete_on_null: Vec::new(),
        }
    }

    /// Sets the singular display name.
    #[must_use]
    pub fn singular(mut self, name: impl Into<String>) -> Self {
        self.singular = name.into();
        self
    }

    /// Sets the plural display name.
    #[must_use]
    pub fn plural(mut self, name: impl Into<String>) -> Self {
        self.plural = name.into();
        self
    }

    /// Merges these fields underneath every created record.
    #[must_use]
    pub fn default_data(mut self, data: Document) -> Self {
        self.default_data = data;
        self
    }

    /// Treats a `Null` saved to this field as a field deletion.
    #[must_use]
    pub fn delete_on_null(mut self, field: impl Into<String>) -> Self {
        self.delete_on_null.push(field.into());
        self
    }
}

/// One page of query results: the typed models plus the boundary snapshots
/// for cursor continuation.
#[derive(Debug, Clone)]
pub struct Page<M> {
    /// Models in query order.
    pub models: Vec<M>,
    /// Snapshot of the first result, if any.
    pub first: Option<Snapshot>,
    /// Snapshot of the last result, if any.
    pub last: Option<Snapshot>,
}

fn page_from_snapshots<M: Model>(snapshots: Vec<Snapshot>) -> CoreResult<Page<M>> {
    let first = snapshots.first().cloned();
    let last = snapshots.last().cloned();
    let models = snapshots
        .iter()
        .map(M::from_snapshot)
        .collect::<CoreResult<Vec<_>>>()?;
    Ok(Page {
        models,
        first,
        last,
    })
}

/// Live view of one record.
///
/// The current state arrives immediately after subscribing, then once per
/// change. `None` means the record does not exist.
pub struct DocumentWatch<M> {
    receiver: Receiver<DocumentChange>,
    _marker: PhantomData<M>,
}

impl<M: Model> DocumentWatch<M> {
    /// Blocks for the next delivery.
    ///
    /// # Errors
    ///
    /// [`CoreError::WatchClosed`] once the datastore side has gone away.
    pub fn recv(&self) -> CoreResult<Option<M>> {
        let change = self.receiver.recv().map_err(|_| CoreError::WatchClosed)?;
        match change.data {
            Some(data) => {
                let snapshot = Snapshot::new(change.reference, data);
                Ok(Some(M::from_snapshot(&snapshot)?))
            }
            None => Ok(None),
        }
    }
}

/// Live view of a query's result set.
///
/// Each delivery is the full current page, starting with the state at
/// subscription time.
pub struct QueryWatch<M> {
    receiver: Receiver<QueryChange>,
    _marker: PhantomData<M>,
}

impl<M: Model> QueryWatch<M> {
    /// Blocks for the next result set.
    ///
    /// # Errors
    ///
    /// [`CoreError::WatchClosed`] once the datastore side has gone away.
    pub fn recv(&self) -> CoreResult<Page<M>> {
        let change = self.receiver.recv().map_err(|_| CoreError::WatchClosed)?;
        page_from_snapshots(change.snapshots)
    }
}

/// A typed store over one collection.
///
/// Every operation is a thin pass-through to the datastore; the store adds
/// typing via [`Model`], default data on creation, and the delete-on-null
/// save contract.
///
/// # Example
///
/// ```rust,ignore
/// let books: Store<Book> = client.store(StoreOptions::new("books"));
///
/// let reference = books.create(&Book {
///     title: "Dune".into(),
///     pages: 412,
/// })?;
/// let found = books.find(reference.id())?;
/// ```
pub struct Store<M: Model> {
    datastore: Arc<dyn Datastore>,
    options: StoreOptions,
    on_error: ErrorHook,
    _marker: PhantomData<M>,
}

impl<M: Model> Clone for Store<M> {
    fn clone(&self) -> Self {
        Self {
            datastore: Arc::clone(&self.datastore),
            options: self.options.clone(),
            on_error: Arc::clone(&self.on_error),
            _marker: PhantomData,
        }
    }
}

impl<M: Model> Store<M> {
    /// Creates a store over a datastore with the given options.
    pub fn new(datastore: Arc<dyn Datastore>, options: StoreOptions) -> Self {
        Self {
            datastore,
            options,
            on_error: default_hook(),
            _marker: PhantomData,
        }
    }

    /// Replaces the error observation hook.
    ///
    /// The hook sees every operation error before it propagates; the
    /// default logs at error level.
    #[must_use]
    pub fn with_error_hook(
        mut self,
        hook: impl Fn(&CoreError) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Arc::new(hook);
        self
    }

    /// The store's options.
    #[must_use]
    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Reference to a record id within this store's collection.
    #[must_use]
    pub fn doc_ref(&self, id: &str) -> DocumentRef {
        self.datastore.reference(&self.options.path, id)
    }

    /// Allocates a fresh reference in this store's collection.
    #[must_use]
    pub fn new_ref(&self) -> DocumentRef {
        self.datastore.new_reference(&self.options.path)
    }

    /// Reads one record. `Ok(None)` when it does not exist.
    pub fn find(&self, id: &str) -> CoreResult<Option<M>> {
        self.run(|| match self.datastore.get(&self.doc_ref(id))? {
            Some(snapshot) => Ok(Some(M::from_snapshot(&snapshot)?)),
            None => Ok(None),
        })
    }

    /// Whether a record exists.
    pub fn exists(&self, id: &str) -> CoreResult<bool> {
        self.run(|| Ok(self.datastore.get(&self.doc_ref(id))?.is_some()))
    }

    /// Runs a query and returns typed models in query order.
    pub fn query(&self, options: &QueryOptions) -> CoreResult<Vec<M>> {
        self.run(|| {
            let snapshots = self
                .datastore
                .run_query(&options.to_query(&self.options.path))?;
            snapshots.iter().map(M::from_snapshot).collect()
        })
    }

    /// Counts the records matching the filter groups.
    pub fn count(&self, filters: &[FilterGroup]) -> CoreResult<u64> {
        self.run(|| {
            let mut query = StructuredQuery::new(self.options.path.as_str());
            for group in filters {
                query = query.filter_group(group.clone());
            }
            Ok(self.datastore.count(&query)?)
        })
    }

    /// Writes a model at a fresh reference, returning the reference.
    ///
    /// The store's default data is merged underneath the model's fields.
    pub fn create(&self, model: &M) -> CoreResult<DocumentRef> {
        let reference = self.new_ref();
        self.create_at(&reference, model)?;
        Ok(reference)
    }

    /// Writes a model at a chosen id.
    pub fn create_with_id(&self, id: &str, model: &M) -> CoreResult<DocumentRef> {
        let reference = self.doc_ref(id);
        self.create_at(&reference, model)?;
        Ok(reference)
    }

    fn create_at(&self, reference: &DocumentRef, model: &M) -> CoreResult<()> {
        self.run(|| {
            let data = self
                .options
                .default_data
                .clone()
                .merged_with(model.to_document()?);
            Ok(self.datastore.set(reference, data, SetMode::Overwrite)?)
        })
    }

    /// Merges field changes into an existing record.
    ///
    /// Fields listed in the store's `delete_on_null` whose staged value is
    /// `Null` are removed from the record instead of being set to `Null`.
    ///
    /// # Errors
    ///
    /// Saving to a missing record errors; use [`Store::create_with_id`] to
    /// write a record that may not exist.
    pub fn save(&self, id: &str, changes: Document) -> CoreResult<()> {
        self.run(|| {
            let mut updates = Vec::with_capacity(changes.len());
            for (field, value) in changes.iter() {
                if value.is_null() && self.options.delete_on_null.iter().any(|f| f == field) {
                    updates.push(FieldUpdate::delete(field.clone()));
                } else {
                    updates.push(FieldUpdate::set(field.clone(), value.clone()));
                }
            }
            Ok(self.datastore.update(&self.doc_ref(id), updates)?)
        })
    }

    /// Adds a reference to an array field of a record, skipping it when
    /// already present.
    pub fn relate(&self, id: &str, target: &DocumentRef, property: &str) -> CoreResult<()> {
        self.run(|| {
            Ok(self.datastore.update(
                &self.doc_ref(id),
                vec![FieldUpdate::array_union(
                    property,
                    vec![Value::Reference(target.clone())],
                )],
            )?)
        })
    }

    /// Removes every occurrence of a reference from an array field.
    pub fn unrelate(&self, id: &str, target: &DocumentRef, property: &str) -> CoreResult<()> {
        self.run(|| {
            Ok(self.datastore.update(
                &self.doc_ref(id),
                vec![FieldUpdate::array_remove(
                    property,
                    vec![Value::Reference(target.clone())],
                )],
            )?)
        })
    }

    /// Deletes a record. Deleting a missing record is not an error.
    pub fn destroy(&self, id: &str) -> CoreResult<()> {
        self.run(|| Ok(self.datastore.delete(&self.doc_ref(id))?))
    }

    /// Subscribes to one record.
    ///
    /// The current state is delivered immediately, then once per change.
    pub fn subscribe(&self, id: &str) -> CoreResult<DocumentWatch<M>> {
        self.run(|| {
            let receiver = self.datastore.watch_document(&self.doc_ref(id))?;
            Ok(DocumentWatch {
                receiver,
                _marker: PhantomData,
            })
        })
    }

    /// Subscribes to a query's result set.
    ///
    /// The current page is delivered immediately, then once per change to
    /// the set.
    pub fn subscribe_many(&self, options: &QueryOptions) -> CoreResult<QueryWatch<M>> {
        self.run(|| {
            let receiver = self
                .datastore
                .watch_query(&options.to_query(&self.options.path))?;
            Ok(QueryWatch {
                receiver,
                _marker: PhantomData,
            })
        })
    }

    fn run<T>(&self, op: impl FnOnce() -> CoreResult<T>) -> CoreResult<T> {
        let result = op();
        if let Err(err) = &result {
            (self.on_error)(err);
        }
        result
    }
}
