//! # HTTP Request Executor
//!
//! `HttpService` turns `(method, url, body, hooks)` into one HTTP call over the
//! shared connection pool and hands back an immutable `ExecutionResult`.
//!
//! ## Flow of a call:
//! 1. Build a `RequestDescriptor` and run the hooks over it, in order.
//! 2. Resolve the wire headers (default `Content-Type` only if none were set)
//!    and the final URL (parameters replace the original query).
//! 3. Echo the request when asked to, then dispatch and time the round trip.
//! 4. Drain the body into memory and, in debug mode, echo the response with a
//!    pretty-printed body.
//!
//! Any failure short-circuits the call and is returned as a `RequestError`
//! after being logged. Nothing is retried.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url};
use serde_json::{json, Map, Value};

use super::descriptor::{apply_hooks, Hook, RequestDescriptor};
use super::error::RequestError;
use super::pool::{PoolError, SharedConnectionPool};
use crate::configs::http_config::HttpServiceConfig;
use crate::loggers::kit_logger::KitLogger;
use crate::utils::json::pretty_or_raw;

/// The outcome of a call that got a complete response, whatever its status.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    status: StatusCode,
    headers: HeaderMap,
    content: Bytes,
    text: String,
    elapsed_ms: u64,
    failure: Option<String>,
}

impl ExecutionResult {
    fn new(status: StatusCode, headers: HeaderMap, content: Bytes, elapsed: Duration) -> Self {
        let text = String::from_utf8_lossy(&content).into_owned();
        let failure = (!status.is_success()).then(|| status.to_string());
        Self {
            status,
            headers,
            content,
            text,
            elapsed_ms: elapsed_millis(elapsed),
            failure,
        }
    }

    /// Numeric HTTP status.
    pub fn status(&self) -> u16 {
        self.status.as_u16()
    }

    /// Typed HTTP status.
    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Response headers as received.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw response body.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Raw response body as a cheaply clonable buffer.
    pub fn bytes(&self) -> Bytes {
        self.content.clone()
    }

    /// Response body decoded as UTF-8 (invalid sequences replaced).
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Milliseconds between dispatch and the arrival of the response head.
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Status line of a non-2xx response, e.g. `"404 Not Found"`.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// True for 2xx statuses.
    pub fn success(&self) -> bool {
        self.status.is_success()
    }

    /// Parses the body as JSON.
    ///
    /// # Errors
    /// The `serde_json` error when the body is not valid JSON.
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.content)
    }
}

/// Configurable HTTP request executor.
///
/// Holds no per-call state: one instance can serve any number of concurrent
/// calls, each getting its own descriptor and result.
pub struct HttpService {
    pool: Arc<SharedConnectionPool>,
    logger: Arc<KitLogger>,
    debug: bool,
    default_content_type: String,
}

impl HttpService {
    /// Creates a service over an existing pool.
    ///
    /// # Arguments
    /// * `pool` - The process-wide connection pool.
    /// * `logger` - Destination of request/response echoes and failure reports.
    /// * `config` - Supplies the service-wide debug flag and default content type.
    pub fn new(pool: Arc<SharedConnectionPool>, logger: Arc<KitLogger>, config: &HttpServiceConfig) -> Self {
        Self {
            pool,
            logger,
            debug: config.debug,
            default_content_type: config.default_content_type.clone(),
        }
    }

    /// Builds a fresh pool from `config` and a service over it.
    ///
    /// # Errors
    /// `PoolError` if the HTTP client cannot be constructed.
    pub fn from_config(config: &HttpServiceConfig, logger: Arc<KitLogger>) -> Result<Self, PoolError> {
        let pool = Arc::new(SharedConnectionPool::new(config)?);
        Ok(Self::new(pool, logger, config))
    }

    /// The pool this service dispatches through.
    pub fn pool(&self) -> &Arc<SharedConnectionPool> {
        &self.pool
    }

    /// Whether every call is echoed regardless of its own hooks.
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Executes one HTTP call.
    ///
    /// # Arguments
    /// * `method` - HTTP verb, any case.
    /// * `url` - Absolute URL.
    /// * `body` - Request payload; empty sends no body.
    /// * `hooks` - Descriptor transformations applied in order.
    ///
    /// # Errors
    /// * `RequestError::RequestBuild` for a malformed method, URL or header.
    /// * `RequestError::Transport` when no response arrived.
    /// * `RequestError::ResponseRead` when the body broke off mid-read.
    pub async fn execute<I>(
        &self,
        method: &str,
        url: &str,
        body: &str,
        hooks: I,
    ) -> Result<ExecutionResult, RequestError>
    where
        I: IntoIterator<Item = Hook>,
    {
        // 1. Descriptor first, then the hooks in caller order
        let descriptor = apply_hooks(RequestDescriptor::new(method, url, body)?, hooks);
        let debug = self.debug || descriptor.is_debug();

        // 2. Resolve what actually goes on the wire
        let headers = descriptor.wire_headers(&self.default_content_type)?;
        let target = descriptor.dispatch_url();

        let mut builder = self
            .pool
            .client()
            .request(descriptor.method().clone(), target.clone())
            .headers(headers.clone());
        if !descriptor.body().is_empty() {
            builder = builder.body(descriptor.body().to_owned());
        }
        if let Some(timeout) = descriptor.timeout_override() {
            builder = builder.timeout(timeout);
        }
        let request = builder.build().map_err(|e| {
            RequestError::build(descriptor.method().as_str(), target.as_str(), e.to_string())
        })?;

        if debug || descriptor.is_echo() {
            self.logger
                .info(
                    &request_summary(&descriptor, &target, &headers),
                    Some(request_extras(&descriptor, &target, &headers)),
                )
                .await;
        }

        // 3. Dispatch
        let started = Instant::now();
        let sent = self.pool.client().execute(request).await;
        let elapsed = started.elapsed();

        let response = match sent {
            Ok(response) => response,
            Err(source) => {
                self.logger
                    .error(
                        &format!("HTTP request failed: {}", source),
                        Some(request_extras(&descriptor, &target, &headers)),
                    )
                    .await;
                return Err(RequestError::Transport {
                    method: descriptor.method().to_string(),
                    url: target.to_string(),
                    source,
                });
            }
        };

        let status = response.status();
        let response_headers = response.headers().clone();

        // 4. Drain the body
        let content = match response.bytes().await {
            Ok(content) => content,
            Err(source) => {
                self.logger
                    .error(
                        &format!("Failed to read HTTP response body: {}", source),
                        Some(json!({
                            "request": request_extras(&descriptor, &target, &headers),
                            "response": {
                                "status": status.as_u16(),
                                "elapsed_ms": elapsed_millis(elapsed),
                                "headers": headers_to_json(&response_headers),
                            },
                        })),
                    )
                    .await;
                return Err(RequestError::ResponseRead {
                    method: descriptor.method().to_string(),
                    url: target.to_string(),
                    status: status.as_u16(),
                    source,
                });
            }
        };

        if debug {
            self.logger
                .info(
                    &response_summary(status, elapsed, &content),
                    Some(json!({
                        "status": status.as_u16(),
                        "elapsed_ms": elapsed_millis(elapsed),
                        "headers": headers_to_json(&response_headers),
                    })),
                )
                .await;
        }

        Ok(ExecutionResult::new(status, response_headers, content, elapsed))
    }

    /// GET with a raw, already encoded query string appended to `url`.
    ///
    /// A `with_params` hook still replaces the whole query.
    pub async fn get<I>(&self, url: &str, query: &str, hooks: I) -> Result<ExecutionResult, RequestError>
    where
        I: IntoIterator<Item = Hook>,
    {
        let full_url = if query.is_empty() {
            url.to_string()
        } else if url.contains('?') {
            format!("{}&{}", url, query)
        } else {
            format!("{}?{}", url, query)
        };
        self.execute("GET", &full_url, "", hooks).await
    }

    /// POST with a JSON string body.
    pub async fn post<I>(&self, url: &str, json: &str, hooks: I) -> Result<ExecutionResult, RequestError>
    where
        I: IntoIterator<Item = Hook>,
    {
        self.execute("POST", url, json, hooks).await
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn elapsed_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

fn headers_to_json(headers: &HeaderMap) -> Value {
    let map: Map<String, Value> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()),
            )
        })
        .collect();
    Value::Object(map)
}

fn request_extras(descriptor: &RequestDescriptor, target: &Url, headers: &HeaderMap) -> Value {
    json!({
        "method": descriptor.method().as_str(),
        "url": target.as_str(),
        "headers": headers_to_json(headers),
        "body": descriptor.body(),
    })
}

fn request_summary(descriptor: &RequestDescriptor, target: &Url, headers: &HeaderMap) -> String {
    format!(
        "HTTP request\n    [Headers] {}\n    [Method] {}\n    [Url] {}\n    [Body] {}",
        headers_to_json(headers),
        descriptor.method(),
        target,
        descriptor.body()
    )
}

fn response_summary(status: StatusCode, elapsed: Duration, content: &[u8]) -> String {
    format!(
        "HTTP response\n    [Status] {}\n    [Elapsed] {:.3}s\n    [Body] {}",
        status.as_u16(),
        elapsed.as_secs_f64(),
        pretty_or_raw(content)
    )
}
