//! # DocWeft Testkit
//!
//! Test utilities for DocWeft.
//!
//! This crate provides:
//! - In-memory client fixtures and canned import scenarios
//! - Property-based generators for documents and file sets
//! - Assertion-heavy integration scenario drivers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docweft_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_client() {
//!     with_client(|client| {
//!         let report = client.data_manager().import(library_request());
//!         // ... assertions
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
