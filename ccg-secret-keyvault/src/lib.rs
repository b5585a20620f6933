#![deny(missing_docs)]
//! Azure Key Vault secret resolver.
//!
//! [`KeyVaultResolver`] reads the current version of a secret through the
//! Key Vault REST API (`GET /secrets/{name}?api-version=7.3`) using a bearer
//! token obtained elsewhere.

use std::sync::Arc;

use async_trait::async_trait;
use ccg_http::{HttpRequest, HttpTransport, base_message};
use ccg_secret::{LogSink, NullLog, SecretError, SecretRef, SecretResolver, SecretValue};
use serde::Deserialize;
use zeroize::Zeroizing;

/// Default vault URL template. `{vault}` is replaced by the vault name.
pub const DEFAULT_VAULT_ENDPOINT: &str = "https://{vault}.vault.azure.net";

/// Key Vault API version sent with every secret request.
pub const SECRETS_API_VERSION: &str = "7.3";

/// Resolves secrets from Azure Key Vault.
pub struct KeyVaultResolver {
    endpoint: String,
    transport: Arc<dyn HttpTransport>,
    log: Arc<dyn LogSink>,
}

impl KeyVaultResolver {
    /// Create a resolver using [`DEFAULT_VAULT_ENDPOINT`].
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            endpoint: DEFAULT_VAULT_ENDPOINT.into(),
            transport,
            log: Arc::new(NullLog),
        }
    }

    /// Override the vault URL template. `{vault}` is replaced by the vault name.
    #[must_use]
    pub fn endpoint(mut self, template: impl Into<String>) -> Self {
        self.endpoint = template.into();
        self
    }

    /// Write operator log lines to `log`.
    #[must_use]
    pub fn log_sink(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = log;
        self
    }

    /// Build the secret URL for `secret`.
    pub fn secret_url(&self, secret: &SecretRef) -> String {
        let vault_url = self.endpoint.replace("{vault}", &secret.vault_name);
        format!(
            "{vault_url}/secrets/{}?api-version={SECRETS_API_VERSION}",
            secret.secret_name
        )
    }

    fn fail(&self, err: SecretError) -> SecretError {
        self.log.line(&format!("ERROR: {}", base_message(&err)));
        err
    }
}

fn map_http_status(status: u16, body: &str) -> SecretError {
    match status {
        404 => SecretError::NotFound(format!("HTTP 404: {body}")),
        401 | 403 => SecretError::AccessDenied(format!("HTTP {status}: {body}")),
        _ => SecretError::BackendError(format!("HTTP {status}: {body}")),
    }
}

#[derive(Deserialize)]
struct SecretBundle {
    value: String,
}

/// Extract `value` from a Key Vault secret bundle.
///
/// JSON decoding turns the vault's `\\` back into the single `\` separating
/// domain from username.
pub(crate) fn parse_secret_bundle(body: &str) -> Result<SecretValue, SecretError> {
    let bundle: SecretBundle = serde_json::from_str(body)
        .map_err(|e| SecretError::InvalidResponse(format!("secret bundle: {e}")))?;
    Ok(SecretValue::from(bundle.value))
}

#[async_trait]
impl SecretResolver for KeyVaultResolver {
    async fn resolve(
        &self,
        secret: &SecretRef,
        bearer: &SecretValue,
    ) -> Result<SecretValue, SecretError> {
        let url = self.secret_url(secret);

        let authorization = bearer.with_bytes(|b| {
            std::str::from_utf8(b)
                .map(|token| Zeroizing::new(format!("Bearer {token}")))
                .map_err(|_| SecretError::AccessDenied("bearer token is not valid UTF-8".into()))
        });
        let authorization = authorization.map_err(|e| self.fail(e))?;

        self.log.line(&format!("Calling: {url}"));
        tracing::debug!(url = %url, vault = %secret.vault_name, "fetching secret");

        let response = self
            .transport
            .send(HttpRequest::get(url).sensitive_header("Authorization", authorization.as_str()))
            .await
            .map_err(|e| self.fail(SecretError::Transport(e)))?;

        if !response.is_success() {
            tracing::warn!(status = response.status, vault = %secret.vault_name, "vault returned an error status");
            return Err(self.fail(map_http_status(response.status, &response.body)));
        }

        // The bundle is never logged: it carries the secret.
        parse_secret_bundle(&response.body).map_err(|e| self.fail(e))
    }
}
