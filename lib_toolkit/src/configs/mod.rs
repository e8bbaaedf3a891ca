//! # Configuration Modules
//!
//! This module aggregates the configuration structs used across the toolkit.
//! Every struct implements `Default` with the toolkit's production values and
//! can be deserialized from JSON or overlaid from environment variables.

/// Configuration for the HTTP request executor and its shared connection pool.
pub mod http_config;
