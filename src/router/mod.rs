//! Router: dispatch job requests to registered handlers.
//!
//! `Router` looks a request up by name, filters its arguments down to the
//! parameters the handler declares, injects any context handle the handler
//! asked for, and runs it. Single-result handlers are awaited; streaming
//! handlers come back as an unstarted stream the caller drives.
//!
//! ## Example
//!
//! ```ignore
//! use futures::StreamExt;
//! use jobrouter::{JobRequest, Router};
//!
//! let router = Router::new(registry);
//!
//! let sum = router
//!     .route(JobRequest::new("addition").arg("num1", 4).arg("num2", 9))
//!     .await?
//!     .into_value();
//! assert_eq!(sum, Some(serde_json::json!(13)));
//!
//! let mut numbers = router
//!     .route(JobRequest::new("count_up").arg("limit", 5))
//!     .await?
//!     .into_stream()
//!     .unwrap();
//! while let Some(n) = numbers.next().await {
//!     println!("Generated Number: {}", n?);
//! }
//! ```

mod transport;

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::error::{BoxError, JobError};
use crate::job::{ArgumentError, CallArgs, HandlerFn, JobDescriptor, JobRequest, CONTEXT_HANDLE_NAMES};
use crate::registry::JobRegistry;

/// Lazy sequence of results from a streaming job.
pub type JobStream = Pin<Box<dyn Stream<Item = Result<Value, JobError>> + Send>>;

/// What a routed job produced.
pub enum JobOutput {
    /// The resolved value of a single-result job.
    Value(Value),
    /// The unstarted stream of a streaming job.
    Stream(JobStream),
}

impl JobOutput {
    pub fn into_value(self) -> Option<Value> {
        match self {
            JobOutput::Value(value) => Some(value),
            JobOutput::Stream(_) => None,
        }
    }

    pub fn into_stream(self) -> Option<JobStream> {
        match self {
            JobOutput::Stream(stream) => Some(stream),
            JobOutput::Value(_) => None,
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, JobOutput::Stream(_))
    }

    /// Resolve to a list: the single value wrapped, or every stream item.
    ///
    /// Stops at the first failing stream item.
    pub async fn collect(self) -> Result<Vec<Value>, JobError> {
        match self {
            JobOutput::Value(value) => Ok(vec![value]),
            JobOutput::Stream(stream) => {
                let items: Vec<Result<Value, JobError>> = stream.collect().await;
                items.into_iter().collect()
            }
        }
    }
}

impl fmt::Debug for JobOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobOutput::Value(value) => f.debug_tuple("Value").field(value).finish(),
            JobOutput::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Routes job requests against one registry.
#[derive(Debug, Clone)]
pub struct Router {
    registry: Arc<JobRegistry>,
}

impl Router {
    pub fn new(registry: Arc<JobRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Route a request to its handler.
    ///
    /// Fails with `JobNotFound` if no job has the requested name and with
    /// `InvalidHandlerKind` if the matched handler is synchronous. Binding
    /// failures are `InvalidArgument`; errors raised by the handler are
    /// `HandlerExecution`. Streaming jobs return immediately with an
    /// unpolled stream whose failing items carry `HandlerExecution`.
    pub async fn route(&self, request: JobRequest) -> Result<JobOutput, JobError> {
        let descriptor = self
            .registry
            .find(&request.name)
            .ok_or_else(|| JobError::JobNotFound {
                name: request.name.clone(),
                root: self.registry.root().to_path_buf(),
            })?;

        let job = descriptor.name().to_string();
        let args = Self::bind(descriptor, request);

        match descriptor.handler() {
            HandlerFn::SingleResult(handler) => {
                let span = tracing::debug_span!("job", name = %job);
                let value = handler(args)
                    .instrument(span)
                    .await
                    .map_err(|e| execution_error(&job, e))?;
                tracing::debug!(job = %job, "job completed");
                Ok(JobOutput::Value(value))
            }
            HandlerFn::Streaming(handler) => {
                let stream = handler(args).map_err(|e| execution_error(&job, e))?;
                tracing::debug!(job = %job, "job stream handed to caller");
                let stream = stream.map(move |item| {
                    item.map_err(|source| JobError::HandlerExecution {
                        job: job.clone(),
                        source,
                    })
                });
                Ok(JobOutput::Stream(Box::pin(stream)))
            }
            HandlerFn::Blocking(_) => Err(JobError::InvalidHandlerKind {
                job,
                kind: descriptor.kind(),
            }),
        }
    }

    /// Route a request, giving up when `token` is cancelled.
    ///
    /// A single-result job still running at cancellation is dropped and the
    /// call fails with `Cancelled`. A stream ends early, without an error
    /// item, once the token fires.
    pub async fn route_with_cancellation(
        &self,
        request: JobRequest,
        token: CancellationToken,
    ) -> Result<JobOutput, JobError> {
        let job = request.name.clone();
        let output = tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!(job = %job, "job cancelled");
                return Err(JobError::Cancelled { job });
            }
            output = self.route(request) => output?,
        };

        Ok(match output {
            JobOutput::Stream(stream) => {
                JobOutput::Stream(Box::pin(stream.take_until(token.cancelled_owned())))
            }
            value => value,
        })
    }

    /// Build the call arguments for `descriptor` from `request`.
    ///
    /// Keeps only the arguments the handler declares; unknown keys are
    /// dropped. A context handle the handler declares a parameter for is
    /// injected and replaces a same-named argument.
    pub fn bind(descriptor: &JobDescriptor, request: JobRequest) -> CallArgs {
        let mut args = CallArgs::new();
        let mut dropped = Vec::new();

        for name in CONTEXT_HANDLE_NAMES {
            if descriptor.accepts(name) {
                if let Some(handle) = request.handle(name) {
                    args.insert_handle(name, handle.clone());
                }
            }
        }

        for (name, value) in request.args {
            if !descriptor.accepts(&name) {
                dropped.push(name);
            } else if args.handle(&name).is_none() {
                args.insert(name, value);
            }
        }

        if !dropped.is_empty() {
            dropped.sort_unstable();
            tracing::debug!(job = descriptor.name(), dropped = ?dropped, "dropped undeclared arguments");
        }
        args
    }
}

/// Classify a handler failure: binding problems vs. errors from the body.
fn execution_error(job: &str, error: BoxError) -> JobError {
    match error.downcast::<ArgumentError>() {
        Ok(arg) => JobError::InvalidArgument {
            job: job.to_string(),
            argument: arg.argument().to_string(),
            reason: arg.to_string(),
        },
        Err(source) => JobError::HandlerExecution {
            job: job.to_string(),
            source,
        },
    }
}
