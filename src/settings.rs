//! Shared Tunables
//!
//! Timing constants used by both the proxy and the worker processes.
//! The two sides must agree on the long-poll window: the worker's HTTP
//! client timeout has to stay above the proxy's long-poll deadline or
//! every idle poll would surface as a client error.

use std::time::Duration;

/// Server-side deadline for a synchronous `/query` request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How long `/internal/job/next` parks a worker before replying 204.
/// Strictly below [`WORKER_HTTP_TIMEOUT`].
pub const LONG_POLL_TIMEOUT: Duration = Duration::from_secs(25);

/// Deadline for the direct-dispatch attempt made by the submit handler.
pub const DISPATCH_TIMEOUT: Duration = Duration::from_secs(2);

/// Per-worker mailbox send attempt during dispatch.
pub const WORKER_SEND_TIMEOUT: Duration = Duration::from_millis(500);

/// A worker whose last heartbeat is older than this is considered stale.
pub const STALE_WORKER_TIMEOUT: Duration = Duration::from_secs(60);

/// How often the registry sweeps stale workers out.
pub const REAPER_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Worker-side heartbeat cadence; below half the stale threshold.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);

/// Worker-side HTTP client timeout: the long-poll window plus headroom.
pub const WORKER_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
