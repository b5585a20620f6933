//! Splitting a vault secret into domain, username and password.

use ccg_secret::{SecretValue, mask};
use thiserror::Error;
use zeroize::Zeroizing;

/// Why a raw secret could not be decomposed. Never carries secret material.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedSecret {
    /// No `:` between the account and the password.
    #[error("secret is not in the form domain\\username:password: missing ':'")]
    MissingPasswordSeparator,

    /// No `\` between the domain and the username.
    #[error("secret is not in the form domain\\username:password: missing '\\'")]
    MissingDomainSeparator,

    /// The secret bytes are not UTF-8.
    #[error("secret is not valid UTF-8")]
    NotUtf8,
}

/// A gMSA account credential handed back to the host.
pub struct PasswordCredentials {
    domain_name: String,
    username: String,
    password: Zeroizing<String>,
}

impl PasswordCredentials {
    /// Build a credential from its parts.
    pub fn new(
        domain_name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            domain_name: domain_name.into(),
            username: username.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    /// Split `domain\username:password`.
    ///
    /// The first `:` ends the account part, so the password may itself
    /// contain `:`. The account part is split on `\`; anything after a second
    /// `\` is dropped (`a\b\c:pw` yields `a`, `b`, `pw`).
    pub fn decompose(secret: &str) -> Result<Self, MalformedSecret> {
        let (account, password) = secret
            .split_once(':')
            .ok_or(MalformedSecret::MissingPasswordSeparator)?;

        let mut parts = account.split('\\');
        let domain_name = parts.next().unwrap_or_default();
        let username = parts.next().ok_or(MalformedSecret::MissingDomainSeparator)?;

        Ok(Self::new(domain_name, username, password))
    }

    /// Decompose a secret still held as bytes.
    pub fn from_secret(secret: &SecretValue) -> Result<Self, MalformedSecret> {
        secret.with_bytes(|bytes| {
            let raw = std::str::from_utf8(bytes).map_err(|_| MalformedSecret::NotUtf8)?;
            Self::decompose(raw)
        })
    }

    /// Domain the account belongs to.
    pub fn domain_name(&self) -> &str {
        &self.domain_name
    }

    /// Account name without the domain.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The plaintext password.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// One `*` per password character, for log lines.
    pub fn masked_password(&self) -> String {
        mask(&self.password)
    }

    /// Consume into `(domain_name, username, password)`.
    pub fn into_parts(self) -> (String, String, Zeroizing<String>) {
        (self.domain_name, self.username, self.password)
    }
}

impl std::fmt::Debug for PasswordCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordCredentials")
            .field("domain_name", &self.domain_name)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
