//! Internal helpers for mapping IMDS HTTP statuses to [`AuthError`].

use ccg_auth::AuthError;

/// Map a non-success status from the metadata endpoint to an [`AuthError`].
///
/// IMDS answers 400 for an unknown identity or bad resource, and 404 when no
/// managed identity is assigned to the host.
pub(crate) fn map_http_status(status: u16, body: &str) -> AuthError {
    match status {
        400 | 401 | 403 | 404 => AuthError::AuthFailed(format!("HTTP {status}: {body}")),
        _ => AuthError::BackendError(format!("HTTP {status}: {body}")),
    }
}
