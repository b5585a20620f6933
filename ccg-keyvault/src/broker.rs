//! The credential pipeline: parse, authenticate, fetch, decompose.

use std::sync::Arc;
use std::time::Duration;

use ccg_auth::{AuthProvider, AuthRequest};
use ccg_auth_imds::{DEFAULT_IMDS_ENDPOINT, KEY_VAULT_RESOURCE, ManagedIdentityProvider};
use ccg_http::{DEFAULT_TIMEOUT, HttpTransport, ReqwestTransport};
use ccg_secret::{LogSink, NullLog, SecretResolver};
use ccg_secret_keyvault::{DEFAULT_VAULT_ENDPOINT, KeyVaultResolver};

use crate::CcgDomainAuthCredentials;
use crate::config::PluginConfig;
use crate::credential::PasswordCredentials;
use crate::error::BrokerError;
use crate::log::FileLog;

/// Turns a plugin input into a gMSA credential.
///
/// Each call parses its own input, opens its own log sink and talks to the
/// token endpoint strictly before Key Vault. Nothing is cached between calls.
///
/// The log file is only opened once the plugin input has parsed, so a
/// rejected input never reaches it; it is reported through `tracing` only.
///
/// # Example
///
/// ```no_run
/// use ccg_keyvault::CredentialBroker;
///
/// let creds = CredentialBroker::new()
///     .get_password_credentials("keyVaultName=kv;clientId=123;keyVaultSecret=gmsa")?;
/// println!("{}\\{}", creds.domain_name(), creds.username());
/// # Ok::<(), ccg_keyvault::BrokerError>(())
/// ```
pub struct CredentialBroker {
    transport: Option<Arc<dyn HttpTransport>>,
    imds_endpoint: String,
    vault_endpoint: String,
    timeout: Duration,
    redact_token_response: bool,
}

impl Default for CredentialBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialBroker {
    /// A broker talking to the real metadata endpoint and Key Vault.
    pub fn new() -> Self {
        Self {
            transport: None,
            imds_endpoint: DEFAULT_IMDS_ENDPOINT.into(),
            vault_endpoint: DEFAULT_VAULT_ENDPOINT.into(),
            timeout: DEFAULT_TIMEOUT,
            redact_token_response: false,
        }
    }

    /// Send requests through `transport` instead of a fresh reqwest client.
    ///
    /// [`CredentialBroker::timeout`] does not apply to a supplied transport.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Override the token endpoint URL.
    #[must_use]
    pub fn imds_endpoint(mut self, url: impl Into<String>) -> Self {
        self.imds_endpoint = url.into();
        self
    }

    /// Override the vault URL template (`{vault}` is replaced by the vault name).
    #[must_use]
    pub fn vault_endpoint(mut self, template: impl Into<String>) -> Self {
        self.vault_endpoint = template.into();
        self
    }

    /// Per-request timeout for the default transport.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Mask the access token in the logged token response.
    #[must_use]
    pub fn redact_token_response(mut self, redact: bool) -> Self {
        self.redact_token_response = redact;
        self
    }

    fn http(&self) -> Arc<dyn HttpTransport> {
        match &self.transport {
            Some(transport) => transport.clone(),
            None => Arc::new(ReqwestTransport::new().timeout(self.timeout)),
        }
    }

    /// Run the pipeline for `plugin_input`.
    pub async fn resolve(&self, plugin_input: &str) -> Result<PasswordCredentials, BrokerError> {
        let config = PluginConfig::parse(plugin_input).map_err(|e| {
            tracing::warn!(error = %e, "rejected plugin input");
            BrokerError::from(e)
        })?;

        let log = open_log(&config)?;

        log.line(&format!("Using KeyVault: {}", config.key_vault_name));
        log.line(&format!("Using ClientId: {}", config.client_id));
        log.line(&format!("Using KeyVault Secret: {}", config.key_vault_secret_name));

        let transport = self.http();

        log.line("Getting Access Token from token endpoint");
        let token = ManagedIdentityProvider::new(&config.client_id, transport.clone())
            .endpoint(&self.imds_endpoint)
            .log_sink(log.clone())
            .redact_response(self.redact_token_response)
            .provide(&AuthRequest::new().with_resource(KEY_VAULT_RESOURCE))
            .await?;

        log.line("Getting Password from KeyVault");
        let secret = KeyVaultResolver::new(transport)
            .endpoint(&self.vault_endpoint)
            .log_sink(log.clone())
            .resolve(&config.secret_ref(), token.as_secret())
            .await?;

        let creds = PasswordCredentials::from_secret(&secret).map_err(|e| {
            log.line(&format!("ERROR: {e}"));
            BrokerError::from(e)
        })?;

        log.line(&format!("Got Domain: {}", creds.domain_name()));
        log.line(&format!("Got Username: {}", creds.username()));
        log.line(&format!("Got Password: {}", creds.masked_password()));

        tracing::debug!(
            vault = %config.key_vault_name,
            domain = %creds.domain_name(),
            username = %creds.username(),
            "resolved credentials"
        );
        Ok(creds)
    }

    /// Blocking form of [`CredentialBroker::resolve`].
    ///
    /// Runs on a current-thread runtime built for this call. When the caller
    /// is already on a tokio runtime, that runtime is left alone and the call
    /// runs on a scoped thread of its own, so this never panics on nesting.
    pub fn get_password_credentials(
        &self,
        plugin_input: &str,
    ) -> Result<PasswordCredentials, BrokerError> {
        if tokio::runtime::Handle::try_current().is_err() {
            return self.block_on_resolve(plugin_input);
        }

        tracing::debug!("called from inside a tokio runtime, resolving on a dedicated thread");
        std::thread::scope(|scope| {
            scope
                .spawn(|| self.block_on_resolve(plugin_input))
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
        })
    }

    fn block_on_resolve(&self, plugin_input: &str) -> Result<PasswordCredentials, BrokerError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(BrokerError::Runtime)?;
        runtime.block_on(self.resolve(plugin_input))
    }
}

fn open_log(config: &PluginConfig) -> Result<Arc<dyn LogSink>, BrokerError> {
    match &config.log_file {
        Some(path) => {
            let log = FileLog::open(path).map_err(|source| {
                tracing::warn!(path = %path.display(), error = %source, "cannot open log file");
                BrokerError::LogFile {
                    path: path.clone(),
                    source,
                }
            })?;
            Ok(Arc::new(log))
        }
        None => Ok(Arc::new(NullLog)),
    }
}

impl CcgDomainAuthCredentials for CredentialBroker {
    fn get_password_credentials(
        &self,
        plugin_input: &str,
    ) -> Result<PasswordCredentials, BrokerError> {
        CredentialBroker::get_password_credentials(self, plugin_input)
    }
}
