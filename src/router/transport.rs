//! Transport entry points: attach a transport handle, then route.
//!
//! A websocket server or a binary stream listener decodes a [`JobRequest`]
//! from its own framing, then hands the request plus its connection handle
//! to one of these methods. Handlers that declare a `websocket` or
//! `binary_stream` parameter receive the handle.

use super::{JobOutput, Router};
use crate::error::JobError;
use crate::job::{ContextHandle, JobRequest};

impl Router {
    /// Route a request that arrived over a websocket.
    pub async fn websocket_router(
        &self,
        request: JobRequest,
        websocket: ContextHandle,
    ) -> Result<JobOutput, JobError> {
        self.route(request.with_websocket(websocket)).await
    }

    /// Route a request that arrived on a binary stream.
    pub async fn binary_stream_router(
        &self,
        request: JobRequest,
        stream: ContextHandle,
    ) -> Result<JobOutput, JobError> {
        self.route(request.with_binary_stream(stream)).await
    }
}
