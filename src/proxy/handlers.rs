//! HTTP Request Handlers
//!
//! Axum route handlers that drive the dispatch core: the public `/query`
//! surface on one side and the internal worker endpoints on the other.
//! Handlers are thin adapters; the registry, fallback queue and rendezvous
//! do the actual coordination and arrive here as injected extensions.
//!
//! Client aborts deserve a note: axum cancels a handler future outright
//! when the connection goes away, so everything that must happen on *every*
//! exit path (slot deregistration, queue removal, the mailbox exit
//! sequence) lives in drop guards rather than in straight-line code.

use crate::api::results::QueryResults;
use crate::api::types::{now_ms, Job, JobId, JobStatus, QueryRequest};
use crate::proxy::protocol::{
    HeartbeatRequest, RegisterResponse, ResultPayload, StatsResponse, WorkerIdParams,
};
use crate::proxy::queue::JobQueue;
use crate::proxy::registry::WorkerRegistry;
use crate::proxy::rendezvous::ResultRendezvous;
use crate::proxy::ProxyConfig;
use axum::body::Bytes;
use axum::extract::{Extension, Query};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;
use sysinfo::System;

/// Cleanup that must run however the submit handler exits, including the
/// future being dropped on client disconnect: the rendezvous slot goes
/// away exactly once, and a job still parked in the fallback queue is
/// removed best-effort.
struct SubmitGuard {
    rendezvous: Arc<ResultRendezvous>,
    queue: Arc<JobQueue>,
    job_id: JobId,
    responded: bool,
}

impl Drop for SubmitGuard {
    fn drop(&mut self) {
        if !self.responded {
            tracing::warn!(job_id = %self.job_id.0, "client cancelled request");
        }
        self.rendezvous.deregister(&self.job_id);
        if self.queue.remove(&self.job_id) {
            tracing::debug!(job_id = %self.job_id.0, "removed undispatched job from fallback queue");
        }
    }
}

/// Client entry point: submits one query and blocks until its result
/// arrives, the request deadline passes, or the client goes away.
pub async fn handle_query(
    Extension(registry): Extension<Arc<WorkerRegistry>>,
    Extension(queue): Extension<Arc<JobQueue>>,
    Extension(rendezvous): Extension<Arc<ResultRendezvous>>,
    Extension(config): Extension<ProxyConfig>,
    body: Bytes,
) -> Response {
    let request: QueryRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!("rejected malformed query body: {}", e);
            return (StatusCode::BAD_REQUEST, "invalid request body").into_response();
        }
    };

    let job = Job::from_request(request);
    tracing::info!(job_id = %job.id.0, user_id = %job.user_id, "query received");

    let result_rx = rendezvous.register(job.id.clone());
    let mut guard = SubmitGuard {
        rendezvous,
        queue: queue.clone(),
        job_id: job.id.clone(),
        responded: false,
    };

    let deadline = tokio::time::Instant::now() + config.dispatch_timeout;
    if let Err(e) = registry.dispatch(&job, deadline).await {
        // No worker took it. The fallback queue holds the job until a
        // worker poll drains it or the client gives up.
        tracing::warn!(job_id = %job.id.0, "direct dispatch failed, adding to fallback queue: {}", e);
        queue.add(job.clone());
    }

    let response = match tokio::time::timeout(config.request_timeout, result_rx).await {
        Ok(Ok(result)) => {
            if result.error.is_empty() {
                let total_ms = now_ms().saturating_sub(job.created_at);
                match QueryResults::from_result(result, total_ms) {
                    Ok(results) => (StatusCode::OK, Json(results)).into_response(),
                    Err(e) => {
                        tracing::error!(job_id = %job.id.0, "failed to process profiling data: {}", e);
                        (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            "failed to process profiling data",
                        )
                            .into_response()
                    }
                }
            } else {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(QueryResults::from_error(result.error)),
                )
                    .into_response()
            }
        }
        Ok(Err(_)) => {
            // The slot only closes on deregistration, which this handler
            // owns; getting here means the invariant broke.
            tracing::error!(job_id = %job.id.0, "rendezvous slot closed without a result");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
        }
        Err(_) => {
            tracing::error!(job_id = %job.id.0, "request timed out waiting for result");
            (StatusCode::GATEWAY_TIMEOUT, "request timed out").into_response()
        }
    };

    guard.responded = true;
    response
}

pub async fn handle_healthz() -> &'static str {
    "OK"
}

/// Fleet and process statistics.
pub async fn handle_stats(
    Extension(registry): Extension<Arc<WorkerRegistry>>,
    Extension(queue): Extension<Arc<JobQueue>>,
    Extension(rendezvous): Extension<Arc<ResultRendezvous>>,
) -> Json<StatsResponse> {
    let mut sys = System::new_all();
    sys.refresh_cpu();
    sys.refresh_memory();
    let cpu_usage = sys.global_cpu_info().cpu_usage();
    // sysinfo reports memory in bytes.
    let mem_total_mb = sys.total_memory() / (1024 * 1024);
    let mem_used_mb = sys.used_memory() / (1024 * 1024);

    Json(StatsResponse {
        workers: registry.worker_count(),
        ready_workers: registry.ready_count(),
        queued_jobs: queue.len(),
        pending_results: rendezvous.pending(),
        cpu_usage,
        mem_used_mb,
        mem_total_mb,
    })
}

/// Internal endpoint: admits a new worker into the fleet.
pub async fn handle_register_worker(
    Extension(registry): Extension<Arc<WorkerRegistry>>,
) -> Json<RegisterResponse> {
    let handle = registry.register();
    Json(RegisterResponse {
        worker_id: handle.id.clone(),
    })
}

/// Internal endpoint: worker liveness ping.
pub async fn handle_heartbeat(
    Extension(registry): Extension<Arc<WorkerRegistry>>,
    body: Bytes,
) -> StatusCode {
    let Ok(request) = serde_json::from_slice::<HeartbeatRequest>(&body) else {
        return StatusCode::BAD_REQUEST;
    };
    if request.worker_id.0.is_empty() {
        return StatusCode::BAD_REQUEST;
    }
    if registry.heartbeat(&request.worker_id) {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

/// Internal endpoint: graceful worker departure.
pub async fn handle_goodbye(
    Extension(registry): Extension<Arc<WorkerRegistry>>,
    Query(params): Query<WorkerIdParams>,
) -> StatusCode {
    if params.worker_id.0.is_empty() {
        return StatusCode::BAD_REQUEST;
    }
    registry.deregister(&params.worker_id);
    StatusCode::OK
}

/// Internal long poll: serves the next job to a worker.
///
/// Fast path first: drain the fallback queue. Otherwise park on the
/// worker's own mailbox until a dispatcher sends, the long-poll window
/// closes, or the worker's connection drops; the mailbox slot's exit
/// sequence covers all three.
pub async fn handle_next_job(
    Extension(registry): Extension<Arc<WorkerRegistry>>,
    Extension(queue): Extension<Arc<JobQueue>>,
    Extension(config): Extension<ProxyConfig>,
    Query(params): Query<WorkerIdParams>,
) -> Response {
    if params.worker_id.0.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            "worker_id query parameter is required",
        )
            .into_response();
    }
    let Some(handle) = registry.get(&params.worker_id) else {
        return (
            StatusCode::FORBIDDEN,
            "worker not registered or has been deregistered",
        )
            .into_response();
    };
    handle.update_heartbeat();

    let mut job = queue.get();
    if job.is_none() {
        let mut slot = handle.open_mailbox(&queue).await;
        tracing::debug!(worker_id = %handle.id.0, "worker is ready and waiting for a job");
        let received = slot.recv_timeout(config.long_poll_timeout).await;
        if received.is_none() {
            tracing::debug!(worker_id = %handle.id.0, "long poll timeout");
        }
        job = slot.finish(received);
    }

    match job {
        Some(mut job) => {
            job.status = JobStatus::Running;
            job.dispatched_at = now_ms();
            job.updated_at = job.dispatched_at;
            tracing::info!(job_id = %job.id.0, worker_id = %handle.id.0, "dispatching job to worker");

            match serde_json::to_vec(&job) {
                Ok(body) => (
                    StatusCode::OK,
                    [(header::CONTENT_TYPE, "application/json")],
                    body,
                )
                    .into_response(),
                Err(e) => {
                    // An accepted job must never be lost; the fallback
                    // queue is the guaranteed parking spot.
                    tracing::error!(job_id = %job.id.0, "failed to encode job for worker, requeueing: {}", e);
                    queue.add(job);
                    StatusCode::NO_CONTENT.into_response()
                }
            }
        }
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Internal endpoint: workers post finished results here.
///
/// Always replies 200 for a well-formed payload; a result for a job whose
/// client already left is dropped with a log line.
pub async fn handle_post_result(
    Extension(rendezvous): Extension<Arc<ResultRendezvous>>,
    body: Bytes,
) -> StatusCode {
    let Ok(payload) = serde_json::from_slice::<ResultPayload>(&body) else {
        return StatusCode::BAD_REQUEST;
    };
    if !rendezvous.notify(&payload.job_id, payload.result) {
        tracing::warn!(job_id = %payload.job_id.0, "result received for timed-out or unknown job");
    }
    StatusCode::OK
}
