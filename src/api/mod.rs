//! Wire Types Module
//!
//! The JSON vocabulary shared by the proxy and its workers: query
//! submissions, jobs in flight, worker results, and the client-facing
//! projection of a completed query.
//!
//! ## Submodules
//! - **`types`**: identifiers, jobs, parameters, and the typed columnar
//!   result payload returned by workers.
//! - **`results`**: the projection sent back to the submitting client,
//!   folding engine profiling output into flat stats.

pub mod results;
pub mod types;

#[cfg(test)]
mod tests;
