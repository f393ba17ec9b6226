//! Typed remote-procedure-call handles.

use std::marker::PhantomData;
use std::sync::Arc;

use docweft_backend::FunctionsBackend;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{default_hook, CoreError, CoreResult, ErrorHook};

/// A typed handle to one remote function.
///
/// Parameters serialize to JSON on the way out; the response deserializes
/// into `R` on the way back.
///
/// # Example
///
/// ```rust,ignore
/// let checkout: Callable<CheckoutRequest, Receipt> =
///     client.callable("checkout")?;
/// let receipt = checkout.call(&request)?;
/// ```
pub struct Callable<P, R> {
    functions: Arc<dyn FunctionsBackend>,
    name: String,
    on_error: ErrorHook,
    _marker: PhantomData<fn(P) -> R>,
}

impl<P, R> Clone for Callable<P, R> {
    fn clone(&self) -> Self {
        Self {
            functions: Arc::clone(&self.functions),
            name: self.name.clone(),
            on_error: Arc::clone(&self.on_error),
            _marker: PhantomData,
        }
    }
}

impl<P: Serialize, R: DeserializeOwned> Callable<P, R> {
    /// Creates a handle to a named function.
    pub fn new(functions: Arc<dyn FunctionsBackend>, name: impl Into<String>) -> Self {
        Self {
            functions,
            name: name.into(),
            on_error: default_hook(),
            _marker: PhantomData,
        }
    }

    /// Replaces the error observation hook.
    #[must_use]
    pub fn with_error_hook(
        mut self,
        hook: impl Fn(&CoreError) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Arc::new(hook);
        self
    }

    /// The function's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invokes the function.
    ///
    /// # Errors
    ///
    /// Serialization failures and backend rejections both surface here,
    /// after passing through the error hook.
    pub fn call(&self, params: &P) -> CoreResult<R> {
        let result = self.dispatch(params);
        if let Err(err) = &result {
            (self.on_error)(err);
        }
        result
    }

    fn dispatch(&self, params: &P) -> CoreResult<R> {
        let payload = serde_json::to_value(params)?;
        let response = self.functions.call(&self.name, payload)?;
        Ok(serde_json::from_value(response)?)
    }
}
