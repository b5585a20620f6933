#![deny(missing_docs)]
//! Managed identity auth provider backed by the Azure instance metadata
//! service (IMDS).
//!
//! [`ManagedIdentityProvider`] asks the link-local metadata endpoint for an
//! OAuth2 access token on behalf of a user-assigned managed identity, selected
//! by client id. The endpoint is plain HTTP and must carry `metadata: true`.

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use ccg_auth::{AuthError, AuthProvider, AuthRequest, AuthToken};
use ccg_http::{HttpRequest, HttpTransport, base_message};
use ccg_secret::{LogSink, NullLog, mask};
use serde::Deserialize;

pub(crate) mod error;

use crate::error::map_http_status;

/// Default IMDS token endpoint.
pub const DEFAULT_IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";

/// IMDS API version sent with every token request.
pub const IMDS_API_VERSION: &str = "2018-02-01";

/// Token resource for Azure Key Vault.
pub const KEY_VAULT_RESOURCE: &str = "https://vault.azure.net";

/// Obtains access tokens from IMDS for a user-assigned managed identity.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use ccg_auth_imds::ManagedIdentityProvider;
/// use ccg_http::ReqwestTransport;
///
/// let provider = ManagedIdentityProvider::new("00000000-0000-0000-0000-000000000000",
///     Arc::new(ReqwestTransport::new()));
/// ```
pub struct ManagedIdentityProvider {
    client_id: String,
    endpoint: String,
    transport: Arc<dyn HttpTransport>,
    log: Arc<dyn LogSink>,
    redact_response: bool,
}

impl ManagedIdentityProvider {
    /// Create a provider for the identity with `client_id`.
    pub fn new(client_id: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            client_id: client_id.into(),
            endpoint: DEFAULT_IMDS_ENDPOINT.into(),
            transport,
            log: Arc::new(NullLog),
            redact_response: false,
        }
    }

    /// Override the token endpoint (tests, emulators).
    #[must_use]
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    /// Write operator log lines to `log`.
    #[must_use]
    pub fn log_sink(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = log;
        self
    }

    /// Mask the `access_token` value in the logged response body.
    ///
    /// Off by default: the response is logged verbatim.
    #[must_use]
    pub fn redact_response(mut self, redact: bool) -> Self {
        self.redact_response = redact;
        self
    }

    /// Build the token URL for `resource`.
    pub(crate) fn token_url(&self, resource: &str) -> String {
        format!(
            "{}?api-version={IMDS_API_VERSION}&resource={resource}&client_id={}",
            self.endpoint, self.client_id
        )
    }

    fn fail(&self, err: AuthError) -> AuthError {
        self.log.line(&format!("ERROR: {}", base_message(&err)));
        err
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Extract the access token from an IMDS body.
pub(crate) fn parse_token_response(body: &str) -> Result<AuthToken, AuthError> {
    let payload: TokenResponse = serde_json::from_str(body)
        .map_err(|e| AuthError::InvalidResponse(format!("token response: {e}")))?;

    if payload.access_token.is_empty() {
        return Err(AuthError::InvalidResponse(
            "token response: empty access_token".into(),
        ));
    }

    Ok(AuthToken::new(payload.access_token.into_bytes()))
}

/// The body with the decoded `access_token` value masked, re-serialized.
///
/// Works on the parsed value, so escapes such as `\/` in the raw body cannot
/// hide the token. A body that is not JSON is withheld entirely.
fn redacted_body(body: &str) -> String {
    let Ok(mut payload) = serde_json::from_str::<serde_json::Value>(body) else {
        return format!("[{} bytes withheld]", body.len());
    };
    match payload.get_mut("access_token") {
        Some(serde_json::Value::String(token)) => *token = mask(token),
        Some(_) => return format!("[{} bytes withheld]", body.len()),
        None => {}
    }
    payload.to_string()
}

#[async_trait]
impl AuthProvider for ManagedIdentityProvider {
    async fn provide(&self, request: &AuthRequest) -> Result<AuthToken, AuthError> {
        let resource = request.resource.as_deref().unwrap_or(KEY_VAULT_RESOURCE);
        let url = self.token_url(resource);

        tracing::debug!(client_id = %self.client_id, resource, "requesting managed identity token");

        let response = self
            .transport
            .send(HttpRequest::get(url).header("metadata", "true"))
            .await
            .map_err(|e| self.fail(AuthError::Transport(e)))?;

        if !response.is_success() {
            tracing::warn!(status = response.status, "token endpoint returned an error status");
            return Err(self.fail(map_http_status(response.status, &response.body)));
        }

        let logged = if self.redact_response {
            Cow::Owned(redacted_body(&response.body))
        } else {
            Cow::Borrowed(response.body.as_str())
        };
        self.log.line(&format!("Got response: {logged}"));

        parse_token_response(&response.body).map_err(|e| self.fail(e))
    }
}
