#![deny(missing_docs)]
//! # ccg-keyvault
//!
//! Container Credential Guard plugin core. Given a plugin input such as
//! `keyVaultName=kv;clientId=<guid>;keyVaultSecret=gmsa`, the
//! [`CredentialBroker`] obtains an access token for the host's user-assigned
//! managed identity, reads the named Key Vault secret and splits it into a
//! gMSA `domain`, `username` and `password`.
//!
//! The host registration itself (COM, FFI) lives outside this crate; a
//! binding implements its calling convention on top of
//! [`CcgDomainAuthCredentials`].

pub mod broker;
pub mod config;
pub mod credential;
mod error;
pub mod log;

pub use broker::CredentialBroker;
pub use config::{ConfigError, MAX_ENTRIES, PluginConfig};
pub use credential::{MalformedSecret, PasswordCredentials};
pub use error::BrokerError;
pub use log::FileLog;

pub use ccg_auth_imds::DEFAULT_IMDS_ENDPOINT;
pub use ccg_http::DEFAULT_TIMEOUT;
pub use ccg_secret_keyvault::DEFAULT_VAULT_ENDPOINT;

/// What the Container Credential Guard host asks of a plugin.
pub trait CcgDomainAuthCredentials: Send + Sync {
    /// Resolve the gMSA credential described by `plugin_input`.
    fn get_password_credentials(
        &self,
        plugin_input: &str,
    ) -> Result<PasswordCredentials, BrokerError>;
}

/// Happy-path imports.
pub mod prelude {
    pub use crate::{
        BrokerError, CcgDomainAuthCredentials, CredentialBroker, PasswordCredentials,
        PluginConfig,
    };
    pub use ccg_http::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
    pub use ccg_secret::{LogSink, NullLog};
}
