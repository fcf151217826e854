//! Error types for job registration, discovery and routing.

use std::path::PathBuf;

use thiserror::Error;

use crate::job::HandlerKind;

/// Boxed failure raised by a handler body.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for all jobrouter operations.
#[derive(Debug, Error)]
pub enum JobError {
    /// The candidate is not a single-result or streaming async handler.
    #[error("job `{job}` cannot be registered: {kind} handlers are not supported, jobs must be async")]
    InvalidHandlerKind { job: String, kind: HandlerKind },

    /// The declaration is malformed (empty name, duplicate identifier, ...).
    #[error("invalid job declaration `{ident}`: {reason}")]
    InvalidDeclaration { ident: String, reason: String },

    /// No descriptor matches the requested name.
    #[error("the job '{name}' was not found in {}", root.display())]
    JobNotFound { name: String, root: PathBuf },

    /// A declared parameter could not be bound from the request.
    #[error("invalid argument `{argument}` for job `{job}`: {reason}")]
    InvalidArgument {
        job: String,
        argument: String,
        reason: String,
    },

    /// The handler failed while running or while producing a stream item.
    #[error("job `{job}` failed: {source}")]
    HandlerExecution {
        job: String,
        #[source]
        source: BoxError,
    },

    /// A job manifest could not be loaded. Non-fatal during discovery.
    #[error("failed to load job unit {}: {reason}", path.display())]
    DiscoveryLoad { path: PathBuf, reason: String },

    /// A second job with an already-registered name, under `DuplicatePolicy::Reject`.
    #[error("duplicate job name `{name}`")]
    DuplicateJob { name: String },

    /// The routing was cancelled before the handler produced a result.
    #[error("job `{job}` was cancelled")]
    Cancelled { job: String },

    /// Configuration could not be read or deserialized.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl JobError {
    /// Name of the job this error refers to, when there is one.
    pub fn job_name(&self) -> Option<&str> {
        match self {
            JobError::InvalidHandlerKind { job, .. }
            | JobError::InvalidArgument { job, .. }
            | JobError::HandlerExecution { job, .. }
            | JobError::Cancelled { job } => Some(job),
            JobError::JobNotFound { name, .. } | JobError::DuplicateJob { name } => Some(name),
            JobError::InvalidDeclaration { ident, .. } => Some(ident),
            JobError::DiscoveryLoad { .. } | JobError::Config(_) => None,
        }
    }

    /// True for errors that discovery records and moves past.
    pub fn is_discovery_failure(&self) -> bool {
        matches!(self, JobError::DiscoveryLoad { .. })
    }
}

/// Result type alias using JobError.
pub type Result<T> = std::result::Result<T, JobError>;
