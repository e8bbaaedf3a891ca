//! # Request Descriptor & Hooks
//!
//! A `RequestDescriptor` is the in-memory form of one outbound call before it
//! goes on the wire. Hooks are boxed transformations `descriptor -> descriptor`
//! applied strictly in the order the caller lists them, so a later hook always
//! wins over an earlier one touching the same field.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Url};
use url::form_urlencoded;

use super::error::RequestError;

/// A caller-supplied transformation of the descriptor, run before dispatch.
pub type Hook = Box<dyn FnOnce(RequestDescriptor) -> RequestDescriptor + Send>;

/// One outbound HTTP call, owned by a single `execute` invocation.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    url: Url,
    body: String,
    /// Lower-cased header names; inserting an existing name overwrites it.
    headers: BTreeMap<String, String>,
    /// When set, replaces whatever query the URL carried.
    params: Option<BTreeMap<String, String>>,
    echo: bool,
    debug: bool,
    timeout: Option<Duration>,
}

impl RequestDescriptor {
    /// Builds a descriptor from raw caller input.
    ///
    /// Standard verbs are accepted in any case (`get` becomes `GET`). The URL must
    /// be absolute. An empty body is valid and sends no payload.
    ///
    /// # Errors
    /// `RequestError::RequestBuild` when the method is not a valid HTTP token or
    /// the URL does not parse.
    pub fn new(method: &str, url: &str, body: &str) -> Result<Self, RequestError> {
        let normalized = method.trim().to_ascii_uppercase();
        let method = Method::from_bytes(normalized.as_bytes()).map_err(|e| {
            RequestError::build(&normalized, url, format!("invalid method: {}", e))
        })?;
        let url = Url::parse(url.trim())
            .map_err(|e| RequestError::build(method.as_str(), url, format!("invalid url: {}", e)))?;

        Ok(Self {
            method,
            url,
            body: body.to_string(),
            headers: BTreeMap::new(),
            params: None,
            echo: false,
            debug: false,
            timeout: None,
        })
    }

    /// Replaces the whole header mapping. Nothing from the previous mapping survives.
    pub fn replace_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers = headers
            .into_iter()
            .map(|(k, v)| (k.into().to_ascii_lowercase(), v.into()))
            .collect();
        self
    }

    /// Sets one header, overwriting any previous value for the same name.
    pub fn insert_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Replaces the query parameters sent with the call.
    pub fn replace_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params = Some(params.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    /// Toggles the verbose echo of the request.
    pub fn echo(mut self, on: bool) -> Self {
        self.echo = on;
        self
    }

    /// Toggles request and response diagnostics for this call only.
    pub fn debug(mut self, on: bool) -> Self {
        self.debug = on;
        self
    }

    /// Overrides the pool-wide timeout for this call only.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// URL as given by the caller, before parameters are applied.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn params(&self) -> Option<&BTreeMap<String, String>> {
        self.params.as_ref()
    }

    pub fn is_echo(&self) -> bool {
        self.echo
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn timeout_override(&self) -> Option<Duration> {
        self.timeout
    }

    /// The URL actually dispatched: parameters, when set, are form-encoded in
    /// key order and replace the original query. An empty set strips the query.
    pub fn dispatch_url(&self) -> Url {
        let mut url = self.url.clone();
        if let Some(params) = &self.params {
            if params.is_empty() {
                url.set_query(None);
            } else {
                let encoded = form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(params.iter())
                    .finish();
                url.set_query(Some(&encoded));
            }
        }
        url
    }

    /// Headers put on the wire.
    ///
    /// A non-empty mapping is used verbatim. An empty one yields a single
    /// `Content-Type: <default_content_type>`.
    ///
    /// # Errors
    /// `RequestError::RequestBuild` for a header name or value that HTTP forbids.
    pub fn wire_headers(&self, default_content_type: &str) -> Result<HeaderMap, RequestError> {
        let mut wire = HeaderMap::with_capacity(self.headers.len().max(1));

        if self.headers.is_empty() {
            let value = HeaderValue::from_str(default_content_type).map_err(|e| {
                self.build_error(format!("invalid default content type {:?}: {}", default_content_type, e))
            })?;
            wire.insert(CONTENT_TYPE, value);
            return Ok(wire);
        }

        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| self.build_error(format!("invalid header name {:?}: {}", name, e)))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| self.build_error(format!("invalid value for header {:?}: {}", name, e)))?;
            wire.insert(header_name, header_value);
        }
        Ok(wire)
    }

    fn build_error(&self, reason: String) -> RequestError {
        RequestError::build(self.method.as_str(), self.url.as_str(), reason)
    }
}

/// Hook replacing the header mapping wholesale.
pub fn with_headers<I, K, V>(headers: I) -> Hook
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let headers: Vec<(String, String)> = headers
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect();
    Box::new(move |d| d.replace_headers(headers))
}

/// Hook replacing the URL query with the given parameters.
pub fn with_params<I, K, V>(params: I) -> Hook
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let params: Vec<(String, String)> = params
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect();
    Box::new(move |d| d.replace_params(params))
}

/// Hook toggling the verbose request echo.
pub fn with_echo(on: bool) -> Hook {
    Box::new(move |d| d.echo(on))
}

/// Hook toggling request/response diagnostics for one call.
pub fn with_debug(on: bool) -> Hook {
    Box::new(move |d| d.debug(on))
}

/// Hook overriding the overall timeout for one call.
pub fn with_timeout(timeout: Duration) -> Hook {
    Box::new(move |d| d.timeout(timeout))
}

/// Runs `hooks` over `descriptor` in order.
pub fn apply_hooks<I>(descriptor: RequestDescriptor, hooks: I) -> RequestDescriptor
where
    I: IntoIterator<Item = Hook>,
{
    hooks.into_iter().fold(descriptor, |d, hook| hook(d))
}
