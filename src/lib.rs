//! # jobrouter
//!
//! Process-local job registry and router.
//!
//! Declare async functions as jobs with `#[job]`, collect them in a
//! [`JobCatalog`], expose them through a [`JobRegistry`] (built from job
//! manifests found under a directory, or straight from the catalog), and
//! dispatch named [`JobRequest`]s with a [`Router`].
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use jobrouter::{job, JobCatalog, JobRegistry, JobRequest, Router};
//!
//! #[job(name = "addition", description = "Add two numbers together")]
//! async fn addition(num1: i64, num2: i64) -> i64 {
//!     num1 + num2
//! }
//!
//! #[tokio::main]
//! async fn main() -> jobrouter::Result<()> {
//!     jobrouter::init_logging();
//!
//!     let catalog = JobCatalog::from_declarations(jobrouter::jobs![addition])?;
//!     let registry = Arc::new(JobRegistry::discover("./jobs", &catalog));
//!     let router = Router::new(registry);
//!
//!     let request = JobRequest::new("addition").arg("num1", 4).arg("num2", 9);
//!     let result = router.route(request).await?;
//!     println!("Addition Result: {:?}", result.into_value());
//!     Ok(())
//! }
//! ```

extern crate self as jobrouter;

pub mod config;
pub mod error;
pub mod job;
pub mod logging;
pub mod registry;
pub mod router;

pub use config::{DiscoveryConfig, DuplicatePolicy};
pub use error::{BoxError, JobError, Result};
pub use job::{
    register, ArgumentError, CallArgs, ContextHandle, HandlerFn, HandlerKind, JobDeclaration,
    JobDescriptor, JobRequest, JobSummary, BINARY_STREAM, WEBSOCKET,
};
pub use logging::init_logging;
pub use registry::{DiscoveryReport, JobCatalog, JobRegistry, RegistryCache};
pub use router::{JobOutput, JobStream, Router};

// Re-export the attribute macro
pub use jobrouter_macros::job;

// Re-export the cancellation token accepted by `Router::route_with_cancellation`
pub use tokio_util::sync::CancellationToken;

/// Items used by code that `#[job]` generates. Not public API.
#[doc(hidden)]
pub mod __private {
    pub use futures;
    pub use serde_json;
}
