//! Job declarations: a handler candidate before registration.
//!
//! A `JobDeclaration` is what `#[job]` produces (or what you build by hand):
//! the function identifier, optional name and description, the formal
//! parameter names, and the type-erased handler tagged with its kind.
//!
//! ## Example
//!
//! ```ignore
//! use jobrouter::{HandlerFn, JobDeclaration};
//!
//! let decl = JobDeclaration::new("addition", HandlerFn::single(|mut args| async move {
//!     let num1: i64 = args.take("num1")?;
//!     let num2: i64 = args.take("num2")?;
//!     Ok(serde_json::json!(num1 + num2))
//! }))
//! .name("addition")
//! .description("Add two numbers together")
//! .parameters(["num1", "num2"]);
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::arguments::CallArgs;
use crate::error::BoxError;

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Raw item stream produced by a streaming handler.
pub type HandlerStream = Pin<Box<dyn Stream<Item = Result<Value, BoxError>> + Send>>;

/// Type-erased single-result handler.
pub type SingleResultFn =
    Arc<dyn Fn(CallArgs) -> BoxFuture<'static, Result<Value, BoxError>> + Send + Sync>;

/// Type-erased streaming handler. Returns the unstarted stream.
pub type StreamingFn = Arc<dyn Fn(CallArgs) -> Result<HandlerStream, BoxError> + Send + Sync>;

/// Type-erased synchronous handler. Never routable.
pub type BlockingFn = Arc<dyn Fn(CallArgs) -> Result<Value, BoxError> + Send + Sync>;

/// Calling convention of a handler, decided once at declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    /// Async function resolving to one value.
    SingleResult,
    /// Function returning a lazy stream of values.
    Streaming,
    /// Synchronous function.
    Blocking,
}

impl HandlerKind {
    /// Only single-result and streaming handlers may be registered.
    pub fn is_async(&self) -> bool {
        matches!(self, HandlerKind::SingleResult | HandlerKind::Streaming)
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerKind::SingleResult => write!(f, "single-result"),
            HandlerKind::Streaming => write!(f, "streaming"),
            HandlerKind::Blocking => write!(f, "blocking"),
        }
    }
}

/// A handler tagged with its calling convention.
#[derive(Clone)]
pub enum HandlerFn {
    SingleResult(SingleResultFn),
    Streaming(StreamingFn),
    Blocking(BlockingFn),
}

impl HandlerFn {
    /// Wrap an async handler.
    pub fn single<F, Fut>(handler: F) -> Self
    where
        F: Fn(CallArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, BoxError>> + Send + 'static,
    {
        HandlerFn::SingleResult(Arc::new(
            move |args| -> BoxFuture<'static, Result<Value, BoxError>> { Box::pin(handler(args)) },
        ))
    }

    /// Wrap a handler that returns a stream.
    ///
    /// The closure runs at routing time (argument binding); the stream it
    /// returns is handed to the caller without being polled.
    pub fn streaming<F, S>(handler: F) -> Self
    where
        F: Fn(CallArgs) -> Result<S, BoxError> + Send + Sync + 'static,
        S: Stream<Item = Result<Value, BoxError>> + Send + 'static,
    {
        HandlerFn::Streaming(Arc::new(move |args| -> Result<HandlerStream, BoxError> {
            handler(args).map(|stream| stream.boxed() as HandlerStream)
        }))
    }

    /// Wrap a synchronous function. Registration rejects these.
    pub fn blocking<F>(handler: F) -> Self
    where
        F: Fn(CallArgs) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        HandlerFn::Blocking(Arc::new(handler))
    }

    pub fn kind(&self) -> HandlerKind {
        match self {
            HandlerFn::SingleResult(_) => HandlerKind::SingleResult,
            HandlerFn::Streaming(_) => HandlerKind::Streaming,
            HandlerFn::Blocking(_) => HandlerKind::Blocking,
        }
    }
}

impl fmt::Debug for HandlerFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HandlerFn::{:?}", self.kind())
    }
}

/// A function declared as a job, not yet validated.
#[derive(Debug, Clone)]
pub struct JobDeclaration {
    ident: String,
    name: Option<String>,
    description: Option<String>,
    parameters: Vec<String>,
    handler: HandlerFn,
}

impl JobDeclaration {
    /// Declare `handler` under the function identifier `ident`.
    pub fn new(ident: impl Into<String>, handler: HandlerFn) -> Self {
        Self {
            ident: ident.into(),
            name: None,
            description: None,
            parameters: Vec::new(),
            handler,
        }
    }

    /// Set the routing name. Empty names fall back to the identifier.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the formal parameter names the handler accepts.
    pub fn parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }

    pub fn ident(&self) -> &str {
        &self.ident
    }

    pub fn declared_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn declared_description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn declared_parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn kind(&self) -> HandlerKind {
        self.handler.kind()
    }

    pub(crate) fn into_parts(
        self,
    ) -> (String, Option<String>, Option<String>, Vec<String>, HandlerFn) {
        (
            self.ident,
            self.name,
            self.description,
            self.parameters,
            self.handler,
        )
    }
}
