//! Job requests: the caller's ask to run one named job.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::arguments::{ContextHandle, BINARY_STREAM, WEBSOCKET};

/// A request to execute a named job.
///
/// Deserializes from:
/// ```json
/// { "name": "addition", "args": { "num1": 4, "num2": 9 } }
/// ```
///
/// Context handles are never serialized; transports attach them after
/// decoding the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobRequest {
    /// The job to invoke.
    pub name: String,
    /// Caller-supplied arguments. Keys the handler does not declare are dropped.
    #[serde(default)]
    pub args: HashMap<String, Value>,
    #[serde(skip)]
    pub binary_stream: Option<ContextHandle>,
    #[serde(skip)]
    pub websocket: Option<ContextHandle>,
}

impl JobRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add one argument.
    pub fn arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }

    /// Add every field of a JSON object as an argument.
    ///
    /// Non-object values are ignored.
    pub fn args(mut self, args: Value) -> Self {
        if let Value::Object(map) = args {
            self.args.extend(map);
        }
        self
    }

    pub fn with_binary_stream(mut self, handle: ContextHandle) -> Self {
        self.binary_stream = Some(handle);
        self
    }

    pub fn with_websocket(mut self, handle: ContextHandle) -> Self {
        self.websocket = Some(handle);
        self
    }

    /// Look up a context handle by its parameter name.
    pub fn handle(&self, name: &str) -> Option<&ContextHandle> {
        match name {
            BINARY_STREAM => self.binary_stream.as_ref(),
            WEBSOCKET => self.websocket.as_ref(),
            _ => None,
        }
    }

    /// Attach a context handle by its parameter name.
    ///
    /// Returns `false` if `name` is not a recognized handle name.
    pub fn set_handle(&mut self, name: &str, handle: ContextHandle) -> bool {
        match name {
            BINARY_STREAM => self.binary_stream = Some(handle),
            WEBSOCKET => self.websocket = Some(handle),
            _ => return false,
        }
        true
    }
}
