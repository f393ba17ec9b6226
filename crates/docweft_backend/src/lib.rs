//! # DocWeft Backend
//!
//! Backend abstraction for DocWeft plus fully functional local
//! implementations.
//!
//! The three seams the rest of DocWeft talks through:
//!
//! - [`Datastore`] / [`WriteBatch`] - documents, queries, atomic batches,
//!   change watches
//! - [`FileStore`] - object storage addressed by path
//! - [`FunctionsBackend`] - named RPC functions over JSON payloads
//!
//! All three are synchronous traits so they can be faked with a few lines
//! in tests. The in-memory implementations ([`MemoryDatastore`],
//! [`MemoryFileStore`], [`MemoryFunctions`]) honor the same contracts a
//! hosted service would: batch commits are all-or-nothing and enforce
//! write-count and document-size limits, watches deliver the current state
//! at registration, and object deletes require the object to exist.
//!
//! ## Example
//!
//! ```
//! use docweft_backend::{Datastore, MemoryDatastore, SetMode};
//! use docweft_model::Document;
//!
//! let store = MemoryDatastore::new();
//! let reference = store.new_reference("books");
//! store
//!     .set(&reference, Document::new().with("title", "Dune"), SetMode::Overwrite)
//!     .unwrap();
//! assert!(store.get(&reference).unwrap().is_some());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod files;
mod functions;
mod memory;
mod query;

pub use backend::{
    Datastore, DocumentChange, FieldUpdate, QueryChange, SetMode, Snapshot, WriteBatch,
};
pub use error::{BackendError, BackendResult};
pub use files::{FileStore, LocalFileStore, MemoryFileStore};
pub use functions::{FunctionHandler, FunctionsBackend, MemoryFunctions};
pub use memory::{BatchLimits, MemoryDatastore};
pub use query::{
    Bound, Direction, FieldFilter, FieldOp, FilterGroup, OrderBy, StructuredQuery,
};
