//! Remote-procedure-call backend: trait plus an in-memory registry.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde_json::Value as JsonValue;

use crate::error::{BackendError, BackendResult};

/// Handler signature for in-memory functions.
///
/// A handler's `Err` string surfaces to callers as
/// [`BackendError::FunctionFailed`].
pub type FunctionHandler =
    Box<dyn Fn(JsonValue) -> Result<JsonValue, String> + Send + Sync>;

/// A callable-function backend.
///
/// Payloads and responses are plain JSON; typed wrappers live a layer up.
pub trait FunctionsBackend: Send + Sync {
    /// Invoke a named function with a JSON payload.
    fn call(&self, name: &str, payload: JsonValue) -> BackendResult<JsonValue>;
}

/// An in-memory function registry.
///
/// Demos and tests register closures under names and call them through the
/// same interface a hosted RPC service would present.
///
/// # Example
///
/// ```rust,ignore
/// let functions = MemoryFunctions::new();
/// functions.register("greet", |payload| {
///     Ok(serde_json::json!({ "message": format!("hello {payload}") }))
/// });
/// ```
#[derive(Default)]
pub struct MemoryFunctions {
    handlers: RwLock<BTreeMap<String, FunctionHandler>>,
}

impl MemoryFunctions {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under a name, replacing any previous one.
    pub fn register<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(JsonValue) -> Result<JsonValue, String> + Send + Sync + 'static,
    {
        self.handlers
            .write()
            .insert(name.into(), Box::new(handler));
    }

    /// Names of all registered functions, sorted.
    #[must_use]
    pub fn registered(&self) -> Vec<String> {
        self.handlers.read().keys().cloned().collect()
    }
}

impl FunctionsBackend for MemoryFunctions {
    fn call(&self, name: &str, payload: JsonValue) -> BackendResult<JsonValue> {
        let handlers = self.handlers.read();
        let handler = handlers
            .get(name)
            .ok_or_else(|| BackendError::function_not_found(name))?;
        handler(payload).map_err(|message| BackendError::function_failed(name, message))
    }
}
