#![deny(missing_docs)]
//! Secret resolution for ccg-keyvault.
//!
//! This crate defines the [`SecretResolver`] trait, the [`SecretValue`] in-memory
//! wrapper (no Display, no Clone, memory zeroed on drop), the [`SecretRef`]
//! naming a secret inside a vault, and the [`LogSink`] seam that every pipeline
//! component writes its operator log through.
//!
//! ## Design
//!
//! - Resolvers receive the bearer credential per call. Acquiring it is the job
//!   of an `AuthProvider` (see `ccg-auth`), sequenced by the broker.
//! - [`SecretValue`] uses scoped exposure (`with_bytes`) to prevent accidental leaks.
//! - The log sink is handed to each component explicitly; nothing swaps a
//!   logger behind a component's back.

use async_trait::async_trait;
use ccg_http::TransportError;
use thiserror::Error;
use zeroize::Zeroizing;

mod sink;

pub use sink::{LogSink, NullLog, mask};

/// Errors from secret resolution.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SecretError {
    /// The secret was not found in the backend.
    #[error("secret not found: {0}")]
    NotFound(String),

    /// The bearer credential was rejected.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// The backend answered with an unexpected status.
    #[error("backend error: {0}")]
    BackendError(String),

    /// The backend answered, but the body did not carry a secret value.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The request never produced a response.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// An opaque secret value. Cannot be logged, displayed, or cloned.
/// Memory is zeroed on drop via [`Zeroizing`].
///
/// The only way to access the bytes is through [`SecretValue::with_bytes`],
/// which enforces scoped exposure; the secret is only visible inside the closure.
pub struct SecretValue {
    inner: Zeroizing<Vec<u8>>,
}

impl SecretValue {
    /// Create a new secret value. The input vector is moved, not copied.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            inner: Zeroizing::new(bytes),
        }
    }

    /// Scoped exposure. The secret bytes are only accessible inside the closure.
    /// This is the ONLY way to read the value.
    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&self.inner)
    }
}

impl From<String> for SecretValue {
    fn from(value: String) -> Self {
        Self::new(value.into_bytes())
    }
}

impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

// Intentionally: no Display, no Clone, no Serialize, no PartialEq.

/// Names a secret inside a vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRef {
    /// Vault name (the `<vault>` in `https://<vault>.vault.azure.net`).
    pub vault_name: String,
    /// Secret name within the vault.
    pub secret_name: String,
}

impl SecretRef {
    /// Create a reference to `secret_name` in `vault_name`.
    pub fn new(vault_name: impl Into<String>, secret_name: impl Into<String>) -> Self {
        Self {
            vault_name: vault_name.into(),
            secret_name: secret_name.into(),
        }
    }
}

/// Resolve a secret from a specific backend.
///
/// Resolvers do not authenticate themselves. The caller obtains a bearer
/// credential first and passes it in, which keeps the token request strictly
/// ahead of the secret request.
#[async_trait]
pub trait SecretResolver: Send + Sync {
    /// Fetch the secret's raw value using `bearer` for authorization.
    async fn resolve(
        &self,
        secret: &SecretRef,
        bearer: &SecretValue,
    ) -> Result<SecretValue, SecretError>;
}
