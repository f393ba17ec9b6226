//! Client facade wiring backends to typed accessors.

use std::sync::Arc;

use docweft_backend::{
    Datastore, FileStore, FunctionsBackend, MemoryDatastore, MemoryFileStore, MemoryFunctions,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::bucket::Bucket;
use crate::callable::Callable;
use crate::error::{CoreError, CoreResult};
use crate::import::DataManager;
use crate::store::{Model, Store, StoreOptions};

/// Entry point wiring backends to stores, buckets, callables, and the
/// data manager.
///
/// A client is cheap to clone; clones share the same backends.
///
/// # Example
///
/// ```rust,ignore
/// let client = Client::in_memory();
/// let books: Store<Book> = client.store(StoreOptions::new("books"));
/// let covers = client.bucket("covers")?;
/// let report = client.data_manager().import(request)?;
/// ```
#[derive(Clone)]
pub struct Client {
    datastore: Arc<dyn Datastore>,
    files: Option<Arc<dyn FileStore>>,
    functions: Option<Arc<dyn FunctionsBackend>>,
}

impl Client {
    /// Starts a builder.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// A client over fresh in-memory backends, for tests and demos.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            datastore: Arc::new(MemoryDatastore::new()),
            files: Some(Arc::new(MemoryFileStore::new())),
            functions: Some(Arc::new(MemoryFunctions::new())),
        }
    }

    /// The wired datastore.
    #[must_use]
    pub fn datastore(&self) -> Arc<dyn Datastore> {
        Arc::clone(&self.datastore)
    }

    /// A typed store over a collection.
    #[must_use]
    pub fn store<M: Model>(&self, options: StoreOptions) -> Store<M> {
        Store::new(self.datastore(), options)
    }

    /// The bulk importer.
    #[must_use]
    pub fn data_manager(&self) -> DataManager {
        DataManager::new(self.datastore())
    }

    /// A bucket rooted at a path prefix.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotConfigured`] when the client has no file store.
    pub fn bucket(&self, root: impl Into<String>) -> CoreResult<Bucket> {
        let files = self
            .files
            .as_ref()
            .ok_or_else(|| CoreError::not_configured("file store"))?;
        Ok(Bucket::new(Arc::clone(files), root))
    }

    /// A typed handle to a named remote function.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotConfigured`] when the client has no functions
    /// backend.
    pub fn callable<P, R>(&self, name: impl Into<String>) -> CoreResult<Callable<P, R>>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let functions = self
            .functions
            .as_ref()
            .ok_or_else(|| CoreError::not_configured("functions backend"))?;
        Ok(Callable::new(Arc::clone(functions), name))
    }
}

/// Builder for [`Client`].
///
/// Only the datastore is required; buckets and callables error with
/// [`CoreError::NotConfigured`] when their backend was never wired.
#[derive(Default)]
pub struct ClientBuilder {
    datastore: Option<Arc<dyn Datastore>>,
    files: Option<Arc<dyn FileStore>>,
    functions: Option<Arc<dyn FunctionsBackend>>,
}

impl ClientBuilder {
    /// Wires the document datastore. Required.
    #[must_use]
    pub fn datastore(mut self, datastore: Arc<dyn Datastore>) -> Self {
        self.datastore = Some(datastore);
        self
    }

    /// Wires a file store for buckets.
    #[must_use]
    pub fn file_store(mut self, files: Arc<dyn FileStore>) -> Self {
        self.files = Some(files);
        self
    }

    /// Wires a functions backend for callables.
    #[must_use]
    pub fn functions(mut self, functions: Arc<dyn FunctionsBackend>) -> Self {
        self.functions = Some(functions);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotConfigured`] without a datastore.
    pub fn build(self) -> CoreResult<Client> {
        let datastore = self
            .datastore
            .ok_or_else(|| CoreError::not_configured("datastore"))?;
        Ok(Client {
            datastore,
            files: self.files,
            functions: self.functions,
        })
    }
}
