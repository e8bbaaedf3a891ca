//! # Data Retrieval Module
//!
//! HTTP client plumbing shared by everything in the toolkit that talks to the
//! network.
//!
//! ## Contained Modules:
//!
//! - **`descriptor`**: the per-call `RequestDescriptor` and the hooks that
//!   reshape it (`with_headers`, `with_params`, `with_echo`, `with_debug`,
//!   `with_timeout`).
//! - **`pool`**: the process-wide `SharedConnectionPool`.
//! - **`http_service`**: the `HttpService` executor and its `ExecutionResult`.
//! - **`error`**: the `RequestError` taxonomy.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

/// Per-call request descriptor and the hooks that transform it.
pub mod descriptor;
/// Failure taxonomy of a call.
pub mod error;
/// Executor turning descriptors into HTTP calls.
pub mod http_service;
/// Shared, process-wide connection pool.
pub mod pool;

pub use descriptor::{with_debug, with_echo, with_headers, with_params, with_timeout, Hook, RequestDescriptor};
pub use error::RequestError;
pub use http_service::{ExecutionResult, HttpService};
pub use pool::{PoolError, SharedConnectionPool};
