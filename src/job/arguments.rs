//! Bound call arguments passed to a handler.
//!
//! The router builds a `CallArgs` holding exactly the request arguments the
//! handler declares, plus any context handle the handler opted into.
//! Handlers (or the code `#[job]` generates for them) pull typed values out
//! with [`CallArgs::take`] and handles with [`CallArgs::take_handle`].

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Parameter name under which a binary stream handle is injected.
pub const BINARY_STREAM: &str = "binary_stream";

/// Parameter name under which a websocket handle is injected.
pub const WEBSOCKET: &str = "websocket";

/// The parameter names the router recognizes as context handles.
pub const CONTEXT_HANDLE_NAMES: [&str; 2] = [BINARY_STREAM, WEBSOCKET];

/// Failure binding one declared parameter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("missing argument `{0}`")]
    Missing(String),

    #[error("argument `{name}` could not be decoded: {reason}")]
    Decode { name: String, reason: String },
}

impl ArgumentError {
    /// The parameter that failed to bind.
    pub fn argument(&self) -> &str {
        match self {
            ArgumentError::Missing(name) => name,
            ArgumentError::Decode { name, .. } => name,
        }
    }
}

/// An opaque external resource (socket, stream, ...) a handler can receive.
///
/// The router never looks inside; handlers downcast to the concrete type
/// the transport put in.
#[derive(Clone)]
pub struct ContextHandle(Arc<dyn Any + Send + Sync>);

impl ContextHandle {
    pub fn new<T: Any + Send + Sync>(resource: T) -> Self {
        Self(Arc::new(resource))
    }

    /// Wrap an already shared resource without another allocation.
    pub fn from_arc<T: Any + Send + Sync>(resource: Arc<T>) -> Self {
        Self(resource)
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Recover the shared resource as its concrete type.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.0).downcast::<T>().ok()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }

    /// True when both handles point at the same resource.
    pub fn ptr_eq(&self, other: &ContextHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContextHandle(..)")
    }
}

/// Conversion from an optional injected handle into a parameter type.
pub trait FromHandle: Sized {
    fn from_handle(name: &str, handle: Option<ContextHandle>) -> Result<Self, ArgumentError>;
}

impl FromHandle for ContextHandle {
    fn from_handle(name: &str, handle: Option<ContextHandle>) -> Result<Self, ArgumentError> {
        handle.ok_or_else(|| ArgumentError::Missing(name.to_string()))
    }
}

impl FromHandle for Option<ContextHandle> {
    fn from_handle(_name: &str, handle: Option<ContextHandle>) -> Result<Self, ArgumentError> {
        Ok(handle)
    }
}

/// Arguments bound for one handler invocation.
#[derive(Debug, Default, Clone)]
pub struct CallArgs {
    values: HashMap<String, Value>,
    handles: HashMap<String, ContextHandle>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a JSON argument, replacing any handle of the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        self.handles.remove(&name);
        self.values.insert(name, value);
    }

    /// Set a context handle, replacing any JSON argument of the same name.
    pub fn insert_handle(&mut self, name: impl Into<String>, handle: ContextHandle) {
        let name = name.into();
        self.values.remove(&name);
        self.handles.insert(name, handle);
    }

    /// Remove and deserialize an argument.
    ///
    /// A missing argument is decoded from `null`, so `Option<T>` parameters
    /// bind to `None`; any other type reports `ArgumentError::Missing`.
    pub fn take<T: DeserializeOwned>(&mut self, name: &str) -> Result<T, ArgumentError> {
        match self.values.remove(name) {
            Some(value) => serde_json::from_value(value).map_err(|e| ArgumentError::Decode {
                name: name.to_string(),
                reason: e.to_string(),
            }),
            None => serde_json::from_value(Value::Null)
                .map_err(|_| ArgumentError::Missing(name.to_string())),
        }
    }

    /// Remove a context handle.
    pub fn take_handle<T: FromHandle>(&mut self, name: &str) -> Result<T, ArgumentError> {
        T::from_handle(name, self.handles.remove(name))
    }

    /// Get a JSON argument without consuming it.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn handle(&self, name: &str) -> Option<&ContextHandle> {
        self.handles.get(name)
    }

    /// Check if an argument or handle is bound under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name) || self.handles.contains_key(name)
    }

    /// Names of every bound argument and handle, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .values
            .keys()
            .chain(self.handles.keys())
            .map(|s| s.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.values.len() + self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.handles.is_empty()
    }
}
