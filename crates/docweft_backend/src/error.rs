//! Error types for backend operations.

use std::io;
use thiserror::Error;

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors that can occur while talking to a backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The addressed document or object does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// Path of the missing document or object.
        path: String,
    },

    /// A batch staged more writes than the backend accepts in one commit.
    #[error("batch of {staged} writes exceeds the limit of {max}")]
    BatchTooLarge {
        /// Number of staged writes.
        staged: usize,
        /// Maximum number of writes per batch.
        max: usize,
    },

    /// A single document exceeds the backend's size limit.
    #[error("document {path} is {size} bytes, limit is {max}")]
    DocumentTooLarge {
        /// Path of the offending document.
        path: String,
        /// Estimated encoded size in bytes.
        size: usize,
        /// Maximum document size in bytes.
        max: usize,
    },

    /// The backend refused the operation.
    #[error("permission denied: {message}")]
    PermissionDenied {
        /// Reason given by the backend.
        message: String,
    },

    /// No function is registered under the called name.
    #[error("function not registered: {name}")]
    FunctionNotFound {
        /// Name of the missing function.
        name: String,
    },

    /// A registered function returned an error.
    #[error("function {name} failed: {message}")]
    FunctionFailed {
        /// Name of the failed function.
        name: String,
        /// Error reported by the function.
        message: String,
    },

    /// The request itself is malformed.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the problem.
        message: String,
    },
}

impl BackendError {
    /// Create a not-found error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create a permission-denied error.
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Create a function-not-found error.
    pub fn function_not_found(name: impl Into<String>) -> Self {
        Self::FunctionNotFound { name: name.into() }
    }

    /// Create a function-failed error.
    pub fn function_failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FunctionFailed {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
