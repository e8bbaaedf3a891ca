use thiserror::Error;

#[derive(Debug, Error)]
/// # Request Error
///
/// Every way a call can fail. All variants are terminal for the call: nothing
/// is retried and no partial result is returned.
pub enum RequestError {
    /// The method, URL or a header could not be turned into a valid request.
    #[error("Failed to build request {method} {url}: {reason}")]
    RequestBuild {
        /// Method as supplied (upper-cased).
        method: String,
        /// URL as supplied.
        url: String,
        /// What was wrong with it.
        reason: String,
    },

    /// DNS, connect, TLS or timeout failure before a response arrived.
    #[error("Transport error for {method} {url}: {source}")]
    Transport {
        /// Method of the failed call.
        method: String,
        /// URL that was dispatched, query included.
        url: String,
        /// Underlying client error.
        source: reqwest::Error,
    },

    /// The response arrived but its body could not be read to the end.
    #[error("Failed to read response body for {method} {url} (status {status}): {source}")]
    ResponseRead {
        /// Method of the failed call.
        method: String,
        /// URL that was dispatched, query included.
        url: String,
        /// Status line code that preceded the broken body.
        status: u16,
        /// Underlying client error.
        source: reqwest::Error,
    },
}

impl RequestError {
    pub(crate) fn build(method: &str, url: &str, reason: String) -> Self {
        RequestError::RequestBuild {
            method: method.to_string(),
            url: url.to_string(),
            reason,
        }
    }

    /// True when the failure came from the overall or per-call timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            RequestError::RequestBuild { .. } => false,
            RequestError::Transport { source, .. } | RequestError::ResponseRead { source, .. } => {
                source.is_timeout()
            }
        }
    }

    /// True for failures to reach the peer at all (refused, unreachable, DNS).
    pub fn is_connect(&self) -> bool {
        matches!(self, RequestError::Transport { source, .. } if source.is_connect())
    }
}
