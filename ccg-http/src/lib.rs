#![deny(missing_docs)]
//! HTTP transport capability for the ccg-keyvault pipeline.
//!
//! The credential pipeline only ever needs one thing from HTTP: send a `GET`
//! with a handful of headers and hand back the status and body. This crate
//! captures that as the [`HttpTransport`] trait so the token provider and the
//! secret resolver never touch a concrete client. [`ReqwestTransport`] is the
//! production implementation; tests substitute a recording fake.

use async_trait::async_trait;

pub mod client;
pub(crate) mod error;

pub use client::{DEFAULT_TIMEOUT, ReqwestTransport};
pub use error::{TransportError, base_message};

/// An outgoing `GET` request.
///
/// Header order is preserved. Headers added with
/// [`sensitive_header`](HttpRequest::sensitive_header) are redacted from
/// `Debug` output and flagged sensitive on the wire client.
#[derive(Clone)]
pub struct HttpRequest {
    url: String,
    headers: Vec<Header>,
}

#[derive(Clone)]
struct Header {
    name: String,
    value: String,
    sensitive: bool,
}

impl HttpRequest {
    /// Create a `GET` request for the given URL.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    /// Append a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(Header {
            name: name.into(),
            value: value.into(),
            sensitive: false,
        });
        self
    }

    /// Append a header whose value must never be logged.
    #[must_use]
    pub fn sensitive_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(Header {
            name: name.into(),
            value: value.into(),
            sensitive: true,
        });
        self
    }

    /// The request URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Look up the first header with the given name (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Iterate over `(name, value, sensitive)` triples in insertion order.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str, bool)> {
        self.headers
            .iter()
            .map(|h| (h.name.as_str(), h.value.as_str(), h.sensitive))
    }
}

impl std::fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|h| {
                let value = if h.sensitive {
                    "[REDACTED]"
                } else {
                    h.value.as_str()
                };
                (h.name.as_str(), value)
            })
            .collect();
        f.debug_struct("HttpRequest")
            .field("url", &self.url)
            .field("headers", &headers)
            .finish()
    }
}

/// A completed HTTP exchange. Any status is a valid response at this layer;
/// callers decide what a non-success status means for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body decoded as text.
    pub body: String,
}

impl HttpResponse {
    /// Create a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Perform an HTTP request and return the status and body, or fail.
///
/// Implementations must bound every request with a timeout and surface it as
/// [`TransportError::Timeout`].
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send the request.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}
