//! `reqwest`-backed [`HttpTransport`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::map_reqwest_error;
use crate::{HttpRequest, HttpResponse, HttpTransport, TransportError};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Production transport built on [`reqwest::Client`].
///
/// Idle connections are not pooled: the blocking broker entry point runs each
/// call on its own short-lived runtime, and a pooled connection must not
/// outlive the runtime that opened it.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use ccg_http::ReqwestTransport;
///
/// let transport = ReqwestTransport::new().timeout(Duration::from_secs(10));
/// ```
pub struct ReqwestTransport {
    pub(crate) timeout: Duration,
    pub(crate) client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with [`DEFAULT_TIMEOUT`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            client: reqwest::Client::builder()
                .pool_max_idle_per_host(0)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Override the per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn header_map(request: &HttpRequest) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::new();
    for (name, value, sensitive) in request.headers() {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| TransportError::InvalidRequest(format!("header name {name:?}: {e}")))?;
        let mut value = HeaderValue::from_str(value)
            .map_err(|e| TransportError::InvalidRequest(format!("header {name}: {e}")))?;
        value.set_sensitive(sensitive);
        map.append(name, value);
    }
    Ok(map)
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let headers = header_map(&request)?;

        tracing::debug!(url = %request.url(), "sending request");

        let response = self
            .client
            .get(request.url())
            .headers(headers)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, self.timeout))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(e, self.timeout))?;

        tracing::debug!(url = %request.url(), status, "received response");

        Ok(HttpResponse { status, body })
    }
}
