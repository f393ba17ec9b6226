//! Error types for the model crate.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur converting between representations.
#[derive(Error, Debug)]
pub enum ModelError {
    /// A document was expected but the value has another shape.
    #[error("expected a JSON object, got {found}")]
    NotAnObject {
        /// Type name of the value actually found.
        found: &'static str,
    },

    /// A field failed conversion.
    #[error("field `{field}`: {message}")]
    Field {
        /// Name of the offending field.
        field: String,
        /// Description of the conversion error.
        message: String,
    },

    /// A reference path did not have the `collection/id` shape.
    #[error("invalid reference path: `{path}`")]
    InvalidRefPath {
        /// The offending path.
        path: String,
    },

    /// JSON (de)serialization failed.
    #[error("JSON conversion failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    /// Create a not-an-object error.
    pub fn not_an_object(found: &'static str) -> Self {
        Self::NotAnObject { found }
    }

    /// Create a field conversion error.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Field {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an invalid reference path error.
    pub fn invalid_ref_path(path: impl Into<String>) -> Self {
        Self::InvalidRefPath { path: path.into() }
    }
}
