#![deny(missing_docs)]
//! Authentication providers for ccg-keyvault.
//!
//! This crate defines the [`AuthProvider`] trait for obtaining the bearer
//! token that authorizes a secret fetch.
//!
//! ## Separation of Concerns
//!
//! Auth providers produce credentials (tokens). Secret resolvers consume them.
//! The broker asks an `AuthProvider` for a token, then hands that token to a
//! `SecretResolver`, so the two exchanges are always strictly ordered.

use async_trait::async_trait;
use ccg_http::TransportError;
use ccg_secret::SecretValue;
use thiserror::Error;

/// Errors from authentication providers.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AuthError {
    /// The identity endpoint refused to issue a token (unknown identity,
    /// bad request, etc.).
    #[error("auth failed: {0}")]
    AuthFailed(String),

    /// The identity endpoint answered with an unexpected status.
    #[error("backend error: {0}")]
    BackendError(String),

    /// The identity endpoint answered, but the body did not carry a token.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The request never produced a response.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Context for an authentication request.
#[non_exhaustive]
#[derive(Debug, Clone, Default)]
pub struct AuthRequest {
    /// Target resource identifier (e.g., `https://vault.azure.net`).
    pub resource: Option<String>,
}

impl AuthRequest {
    /// Create an empty auth request (no specific context).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target resource.
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }
}

/// An opaque bearer token, held for a single call.
/// Uses [`SecretValue`] internally for in-memory protection.
pub struct AuthToken {
    inner: SecretValue,
}

impl AuthToken {
    /// Create a new auth token.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            inner: SecretValue::new(bytes),
        }
    }

    /// Scoped exposure of the token bytes.
    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        self.inner.with_bytes(f)
    }

    /// Borrow the token as a bearer credential for a secret resolver.
    pub fn as_secret(&self) -> &SecretValue {
        &self.inner
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken([REDACTED])")
    }
}

/// Provide authentication credentials for accessing a secret backend.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Provide an authentication token for the given request context.
    async fn provide(&self, request: &AuthRequest) -> Result<AuthToken, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn _assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn auth_provider_is_object_safe_send_sync() {
        _assert_send_sync::<Box<dyn AuthProvider>>();
        _assert_send_sync::<Arc<dyn AuthProvider>>();
    }

    #[test]
    fn auth_token_debug_is_redacted() {
        let token = AuthToken::new(b"secret-token".to_vec());
        let debug = format!("{:?}", token);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn auth_token_with_bytes_exposes_content() {
        let token = AuthToken::new(b"my-token".to_vec());
        token.with_bytes(|bytes| {
            assert_eq!(bytes, b"my-token");
        });
        token
            .as_secret()
            .with_bytes(|bytes| assert_eq!(bytes, b"my-token"));
    }

    #[test]
    fn auth_request_builder() {
        let req = AuthRequest::new().with_resource("https://vault.azure.net");
        assert_eq!(req.resource.as_deref(), Some("https://vault.azure.net"));
        assert!(AuthRequest::new().resource.is_none());
    }

    struct StaticTokenProvider {
        token: Vec<u8>,
    }
    #[async_trait]
    impl AuthProvider for StaticTokenProvider {
        async fn provide(&self, _request: &AuthRequest) -> Result<AuthToken, AuthError> {
            Ok(AuthToken::new(self.token.clone()))
        }
    }

    #[tokio::test]
    async fn provider_behind_arc_returns_token() {
        let provider: Arc<dyn AuthProvider> = Arc::new(StaticTokenProvider {
            token: b"static".to_vec(),
        });
        let token = provider.provide(&AuthRequest::new()).await.unwrap();
        token.with_bytes(|b| assert_eq!(b, b"static"));
    }

    #[test]
    fn auth_error_display_all_variants() {
        assert_eq!(
            AuthError::AuthFailed("identity not found".into()).to_string(),
            "auth failed: identity not found"
        );
        assert_eq!(
            AuthError::BackendError("HTTP 500".into()).to_string(),
            "backend error: HTTP 500"
        );
        assert_eq!(
            AuthError::InvalidResponse("missing field `access_token`".into()).to_string(),
            "invalid response: missing field `access_token`"
        );
        assert_eq!(
            AuthError::Transport(TransportError::InvalidRequest("bad url".into())).to_string(),
            "invalid request: bad url"
        );
    }
}
