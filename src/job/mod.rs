//! job: declaring async handlers as routable jobs.
//!
//! A job is an async function (single result) or a function returning a
//! stream (many results), declared with `#[job]`:
//!
//! ```ignore
//! use jobrouter::job;
//! use futures::Stream;
//!
//! #[job(name = "addition", description = "Add two numbers together")]
//! async fn addition(num1: i64, num2: i64) -> i64 {
//!     num1 + num2
//! }
//!
//! #[job(description = "Generate numbers up to a given number")]
//! fn count_up(limit: u64) -> impl Stream<Item = u64> + Send {
//!     futures::stream::iter(0..=limit)
//! }
//!
//! let declarations = jobrouter::jobs![addition, count_up];
//! ```
//!
//! Each declaration becomes a [`JobDescriptor`] through [`register`], which
//! rejects synchronous functions.

mod arguments;
mod declaration;
mod descriptor;
mod request;

pub use arguments::{
    ArgumentError, CallArgs, ContextHandle, FromHandle, BINARY_STREAM, CONTEXT_HANDLE_NAMES,
    WEBSOCKET,
};
pub use declaration::{
    BlockingFn, BoxFuture, HandlerFn, HandlerKind, HandlerStream, JobDeclaration, SingleResultFn,
    StreamingFn,
};
pub use descriptor::{register, JobDescriptor, JobSummary};
pub use request::JobRequest;

/// Collect the declarations of `#[job]` functions.
///
/// Each path must name a function annotated with `#[job]`; the macro calls
/// the `declaration()` function generated next to it.
///
/// # Example
/// ```ignore
/// let catalog = jobrouter::JobCatalog::from_declarations(jobrouter::jobs![
///     handlers::addition,
///     handlers::count_up,
/// ])?;
/// ```
#[macro_export]
macro_rules! jobs {
    ($( $($seg:ident)::+ ),* $(,)?) => {
        ::std::vec![ $( $($seg)::+::declaration() ),* ]
    };
}
