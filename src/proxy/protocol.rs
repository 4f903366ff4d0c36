//! Proxy Wire Protocol
//!
//! Defines the HTTP endpoints and Data Transfer Objects for both sides of
//! the proxy: the public client surface and the internal worker surface.
//! Workers import the same constants, so the two processes cannot drift
//! apart on paths.

use crate::api::types::{JobId, JobResult, WorkerId};
use serde::{Deserialize, Serialize};

// --- Client-facing endpoints ---

/// Public endpoint for synchronous query submission.
pub const ENDPOINT_QUERY: &str = "/query";
/// Liveness probe.
pub const ENDPOINT_HEALTHZ: &str = "/healthz";
/// Process and fleet statistics.
pub const ENDPOINT_STATS: &str = "/health/stats";

// --- Worker-facing internal endpoints ---

/// Workers call this once at startup to join the fleet.
pub const ENDPOINT_WORKER_REGISTER: &str = "/internal/worker/register";
/// Periodic worker liveness pings.
pub const ENDPOINT_WORKER_HEARTBEAT: &str = "/internal/worker/heartbeat";
/// Graceful worker departure.
pub const ENDPOINT_WORKER_GOODBYE: &str = "/internal/worker/goodbye";
/// Long poll serving the next job to a worker.
pub const ENDPOINT_JOB_NEXT: &str = "/internal/job/next";
/// Workers post finished results here.
pub const ENDPOINT_JOB_RESULT: &str = "/internal/job/result";

// --- Data Transfer Objects ---

/// Response to a successful worker registration.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub worker_id: WorkerId,
}

/// Body of a worker heartbeat ping.
#[derive(Debug, Serialize, Deserialize)]
pub struct HeartbeatRequest {
    pub worker_id: WorkerId,
}

/// Query-string identification used by `/internal/job/next` and
/// `/internal/worker/goodbye`.
#[derive(Debug, Serialize, Deserialize)]
pub struct WorkerIdParams {
    pub worker_id: WorkerId,
}

/// A finished result posted back by a worker.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResultPayload {
    pub job_id: JobId,
    pub result: JobResult,
}

/// Snapshot served by the stats endpoint.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub workers: usize,
    pub ready_workers: usize,
    pub queued_jobs: usize,
    pub pending_results: usize,
    pub cpu_usage: f32,
    pub mem_used_mb: u64,
    pub mem_total_mb: u64,
}
