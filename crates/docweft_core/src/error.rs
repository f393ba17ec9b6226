//! Error types for DocWeft core.

use std::sync::Arc;

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Observation hook invoked with an operation error before it propagates.
///
/// Stores and callables call their hook on every failed operation; the
/// default hook logs at error level.
pub type ErrorHook = Arc<dyn Fn(&CoreError) + Send + Sync>;

pub(crate) fn default_hook() -> ErrorHook {
    Arc::new(|error: &CoreError| tracing::error!("operation failed: {error}"))
}

/// Errors that can occur in DocWeft core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Backend error (datastore, file store, or functions).
    #[error("backend error: {0}")]
    Backend(#[from] docweft_backend::BackendError),

    /// Data model error.
    #[error("model error: {0}")]
    Model(#[from] docweft_model::ModelError),

    /// JSON serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A client component was requested but never configured.
    #[error("{component} is not configured on this client")]
    NotConfigured {
        /// Name of the missing component.
        component: &'static str,
    },

    /// A watch channel closed because the backend dropped the sender.
    #[error("watch channel closed")]
    WatchClosed,

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a not-configured error for a named client component.
    pub fn not_configured(component: &'static str) -> Self {
        Self::NotConfigured { component }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}
