//! # DocWeft Core
//!
//! Typed convenience layer over a document datastore.
//!
//! This crate is the user-facing surface of DocWeft. It wires the
//! backend traits from `docweft_backend` into ergonomic handles:
//!
//! - [`Client`] - wires backends and hands out the typed surfaces
//! - [`Store`] - typed CRUD, queries, and subscriptions per collection
//! - [`DataManager`] - bulk import with relationship resolution
//! - [`Bucket`] - file uploads under a path prefix
//! - [`Callable`] - typed remote function calls
//!
//! ## Import pipeline
//!
//! [`DataManager::import`] consumes a [`FileSet`] of named record
//! collections, allocates a fresh reference per record, rewrites
//! identifier fields into references per [`RelationRule`], strips
//! ignored fields, and commits everything as one atomic batch. The
//! returned [`ImportReport`] lists what resolved and what did not;
//! unresolved relationships never fail an import.
//!
//! ## Example
//!
//! ```rust
//! use docweft_core::{Client, FileSet, ImportRequest};
//! use docweft_model::Document;
//!
//! let client = Client::in_memory();
//! let files = FileSet::new().with_collection(
//!     "books",
//!     vec![Document::new().with("title", "Dune").with("author", 7)],
//! );
//! let report = client
//!     .data_manager()
//!     .import(ImportRequest::new(files))
//!     .unwrap();
//! assert_eq!(report.staged, 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bucket;
mod callable;
mod client;
mod error;
mod import;
mod store;

pub use bucket::Bucket;
pub use callable::Callable;
pub use client::{Client, ClientBuilder};
pub use error::{CoreError, CoreResult, ErrorHook};
pub use import::{DataManager, FileSet, ImportReport, ImportRequest, RelationRule, UnresolvedField};
pub use store::{
    DocumentWatch, Model, Page, Pagination, QueryOptions, QueryWatch, Store, StoreOptions,
};
