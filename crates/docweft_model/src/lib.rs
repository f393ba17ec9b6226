//! # DocWeft Model
//!
//! Shared value model for DocWeft: documents, field values, and reference
//! handles.
//!
//! Everything the other crates exchange is expressed in these types:
//! - [`Value`]: a dynamic field value (JSON data model plus references)
//! - [`Document`]: an ordered field map
//! - [`DocumentRef`]: an opaque handle addressing one document location
//!
//! The JSON bridge converts to and from `serde_json::Value` losslessly,
//! which is how import files enter the system and how typed models are
//! implemented without hand-written field plumbing.
//!
//! ## Usage
//!
//! ```
//! use docweft_model::{document_from_json, Document, Value};
//!
//! let doc = Document::new().with("title", "Dune").with("pages", 412);
//! assert_eq!(doc.get("pages"), Some(&Value::Integer(412)));
//!
//! let parsed = document_from_json(serde_json::json!({ "title": "Dune" })).unwrap();
//! assert_eq!(parsed.get("title"), Some(&Value::Text("Dune".into())));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod document;
mod error;
mod json;
mod reference;
mod value;

pub use document::Document;
pub use error::{ModelError, ModelResult};
pub use json::{document_from_json, document_to_json, value_from_json, value_to_json, REF_KEY};
pub use reference::DocumentRef;
pub use value::Value;
