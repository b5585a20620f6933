//! Transport errors and helpers for mapping [`reqwest::Error`] into them.

use std::error::Error as StdError;
use std::time::Duration;

/// Errors from sending an HTTP request.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request did not complete within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection, TLS, or protocol failure.
    #[error("network error: {0}")]
    Network(#[source] Box<dyn StdError + Send + Sync>),

    /// The request could not be built (bad URL or header).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Map a [`reqwest::Error`] to a [`TransportError`].
pub(crate) fn map_reqwest_error(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout)
    } else if err.is_builder() {
        TransportError::InvalidRequest(base_message(&err))
    } else {
        TransportError::Network(Box::new(err))
    }
}

/// Return the message of the innermost error in a `source()` chain.
///
/// Wrapper errors tend to say "error sending request"; the root cause says
/// "connection refused". Log lines want the latter.
pub fn base_message(err: &(dyn StdError + 'static)) -> String {
    let mut current = err;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}
