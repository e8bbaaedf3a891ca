//! # Shared Connection Pool
//!
//! Every `reqwest::Client` keeps its own idle-connection cache, so the toolkit
//! builds one client at startup and shares it through this wrapper. Clones of
//! the inner client point at the same cache.

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::configs::http_config::HttpServiceConfig;

#[derive(Debug, Error)]
/// Raised when the underlying HTTP client cannot be constructed (TLS backend init).
pub enum PoolError {
    /// The client builder rejected the configuration.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),
}

/// A process-wide connection cache keyed by destination host.
///
/// Safe to share across tasks; wrap it in an `Arc` and hand it to every
/// `HttpService`.
#[derive(Debug, Clone)]
pub struct SharedConnectionPool {
    client: reqwest::Client,
    timeout: Option<Duration>,
    accept_invalid_certs: bool,
}

impl SharedConnectionPool {
    /// Builds the pool from `config`.
    ///
    /// A zero `timeout_secs` or `idle_timeout_secs` means "no limit".
    /// With `accept_invalid_certs` set (the default) TLS certificates are not
    /// verified.
    ///
    /// # Errors
    /// `PoolError::ClientBuild` if the TLS backend fails to initialise.
    pub fn new(config: &HttpServiceConfig) -> Result<Self, PoolError> {
        let timeout = (config.timeout_secs > 0).then(|| config.timeout());
        let idle_timeout = (config.idle_timeout_secs > 0).then(|| config.idle_timeout());

        let mut builder = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .pool_max_idle_per_host(config.max_idle_per_host)
            .pool_idle_timeout(idle_timeout);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        debug!(
            max_idle_per_host = config.max_idle_per_host,
            idle_timeout_secs = config.idle_timeout_secs,
            timeout_secs = config.timeout_secs,
            accept_invalid_certs = config.accept_invalid_certs,
            "Shared connection pool created"
        );

        Ok(Self {
            client,
            timeout,
            accept_invalid_certs: config.accept_invalid_certs,
        })
    }

    /// The pooled client. Every call made through it reuses the same connections.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Overall timeout applied to calls that don't override it.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Whether TLS certificate validation is switched off.
    pub fn accepts_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }
}
