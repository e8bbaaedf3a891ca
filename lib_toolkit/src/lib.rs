//! # lib_toolkit
//!
//! A personal utility toolkit. Each top-level folder is gated behind a cargo
//! feature of the same name so downstream crates only pay for what they use.
//!
//! - **`configs`**: serde-backed configuration structs with environment overlays.
//! - **`loggers`**: a local console/file logger injected into other components.
//! - **`retrieve`**: the configurable HTTP request executor.
//! - **`utils`**: JSON pretty-printing and map/JSON conversion helpers.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

#[cfg(feature = "configs")]
pub mod configs;
#[cfg(feature = "loggers")]
pub mod loggers;
#[cfg(feature = "retrieve")]
pub mod retrieve;
#[cfg(feature = "utils")]
pub mod utils;

// Re-export the pieces most callers reach for
#[cfg(feature = "configs")]
pub use configs::http_config::{ConfigError, HttpServiceConfig};
#[cfg(feature = "loggers")]
pub use loggers::kit_logger::{KitLogger, LogLevel, LoggerOptions};
#[cfg(feature = "retrieve")]
pub use retrieve::descriptor::{Hook, RequestDescriptor};
#[cfg(feature = "retrieve")]
pub use retrieve::error::RequestError;
#[cfg(feature = "retrieve")]
pub use retrieve::http_service::{ExecutionResult, HttpService};
#[cfg(feature = "retrieve")]
pub use retrieve::pool::{PoolError, SharedConnectionPool};
