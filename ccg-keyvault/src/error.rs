use std::path::PathBuf;

use ccg_auth::AuthError;
use ccg_secret::SecretError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::credential::MalformedSecret;

/// Why a credential request failed.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The plugin input was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    /// No access token could be obtained from the metadata endpoint.
    #[error("token acquisition failed: {0}")]
    TokenAcquisition(#[from] AuthError),

    /// The secret could not be read from Key Vault.
    #[error("secret retrieval failed: {0}")]
    SecretRetrieval(#[from] SecretError),

    /// The secret is not `domain\username:password`.
    #[error("malformed secret: {0}")]
    MalformedSecret(#[from] MalformedSecret),

    /// The configured log file or its directory could not be created.
    #[error("cannot open log file {path:?}: {source}")]
    LogFile {
        /// Configured log file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The blocking entry point could not start its runtime.
    #[error("cannot start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}
