//! Query-Dispatch Proxy Library
//!
//! This library crate defines the modules behind the two binaries of the
//! system: the `proxy`, which accepts synchronous SQL queries over HTTP,
//! and the `worker`, which pulls jobs from the proxy and executes them.
//!
//! ## Architecture Modules
//!
//! - **`api`**: the JSON vocabulary shared by both processes: query
//!   requests, jobs, typed columnar results, and the client projection.
//! - **`proxy`**: the dispatch and rendezvous core. Tracks the live worker
//!   fleet, hands each inbound query to exactly one worker, parks the rest
//!   in a FIFO fallback queue, and wakes the original HTTP handler when the
//!   result comes back.
//! - **`worker`**: the worker-side client loop and the engine seam where
//!   query execution happens.
//! - **`settings`**: the timing contract both processes must agree on.

pub mod api;
pub mod proxy;
pub mod settings;
pub mod worker;
