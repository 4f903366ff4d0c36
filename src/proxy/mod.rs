//! Dispatch & Rendezvous Core
//!
//! The concurrent heart of the proxy: several HTTP request flows meet
//! through shared state with precise ordering, timeouts and cancellation.
//!
//! ## Data flow
//! 1. **Submission**: `/query` registers a rendezvous slot, then asks the
//!    `WorkerRegistry` to place the job into a ready worker's mailbox;
//!    when no worker takes it, the job parks in the FIFO `JobQueue`.
//! 2. **Delivery**: a worker long-polls `/internal/job/next`, draining the
//!    fallback queue first and otherwise waiting on its own mailbox.
//! 3. **Completion**: the worker posts to `/internal/job/result`, which
//!    completes the `ResultRendezvous` slot and wakes the blocked
//!    submit handler.
//! 4. **Expiry**: a background reaper drops workers whose heartbeats
//!    stopped.
//!
//! ## Submodules
//! - **`registry`**: worker handles, mailbox handshake, dispatch, reaper.
//! - **`queue`**: FIFO fallback parking for undispatched jobs.
//! - **`rendezvous`**: job id to one-shot result channel map.
//! - **`handlers`**: the axum adapters over the three structures above.
//! - **`protocol`**: endpoint paths and DTOs shared with workers.

pub mod handlers;
pub mod protocol;
pub mod queue;
pub mod registry;
pub mod rendezvous;


use crate::settings;
use axum::extract::Extension;
use axum::routing::{get, post};
use axum::Router;
use queue::JobQueue;
use registry::WorkerRegistry;
use rendezvous::ResultRendezvous;
use std::sync::Arc;
use std::time::Duration;

/// Timeouts governing the request flows. Built once in `main` and injected
/// alongside the other collaborators; tests shrink these to keep the suite
/// fast.
#[derive(Debug, Clone, Copy)]
pub struct ProxyConfig {
    /// Server-side deadline for a synchronous `/query` request.
    pub request_timeout: Duration,
    /// How long a worker long poll parks before replying 204.
    pub long_poll_timeout: Duration,
    /// Deadline for the direct-dispatch attempt at submission.
    pub dispatch_timeout: Duration,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            request_timeout: settings::REQUEST_TIMEOUT,
            long_poll_timeout: settings::LONG_POLL_TIMEOUT,
            dispatch_timeout: settings::DISPATCH_TIMEOUT,
        }
    }
}

/// Builds the proxy router around its collaborators.
///
/// All shared state is passed in explicitly; nothing here is a process-wide
/// singleton.
pub fn router(
    registry: Arc<WorkerRegistry>,
    queue: Arc<JobQueue>,
    rendezvous: Arc<ResultRendezvous>,
    config: ProxyConfig,
) -> Router {
    Router::new()
        .route(protocol::ENDPOINT_QUERY, post(handlers::handle_query))
        .route(protocol::ENDPOINT_HEALTHZ, get(handlers::handle_healthz))
        .route(protocol::ENDPOINT_STATS, get(handlers::handle_stats))
        .route(
            protocol::ENDPOINT_WORKER_REGISTER,
            post(handlers::handle_register_worker),
        )
        .route(
            protocol::ENDPOINT_WORKER_HEARTBEAT,
            post(handlers::handle_heartbeat),
        )
        .route(
            protocol::ENDPOINT_WORKER_GOODBYE,
            post(handlers::handle_goodbye),
        )
        .route(protocol::ENDPOINT_JOB_NEXT, get(handlers::handle_next_job))
        .route(
            protocol::ENDPOINT_JOB_RESULT,
            post(handlers::handle_post_result),
        )
        .layer(Extension(registry))
        .layer(Extension(queue))
        .layer(Extension(rendezvous))
        .layer(Extension(config))
}
