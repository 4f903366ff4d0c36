//! Worker Process Module
//!
//! Everything a worker needs to participate in the fleet: the HTTP client
//! that speaks the proxy's internal protocol, and the engine seam where
//! query execution happens.
//!
//! The worker is stateless by design. It registers for an id, heartbeats
//! in the background, long-polls for jobs, executes them, and posts the
//! results back; all coordination state lives in the proxy.
//!
//! ## Submodules
//! - **`client`**: `ProxyClient`, the register/heartbeat/poll/result
//!   round-trips over `reqwest`.
//! - **`engine`**: the `QueryEngine` trait plus `ScalarEngine`, a small
//!   literal-projection stand-in for an embedded analytical engine.

pub mod client;
pub mod engine;

#[cfg(test)]
mod tests;
