//! Plugin-input parsing.
//!
//! The host passes a single string such as
//! `keyVaultName=kv;clientId=123;keyVaultSecret=gmsa;logFile=C:\logs\ccg.log`.
//! Keys are case-insensitive; values are taken verbatim.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use ccg_secret::SecretRef;
use thiserror::Error;

/// Most entries a plugin input may carry.
pub const MAX_ENTRIES: usize = 4;

const KEY_VAULT_NAME: &str = "KEYVAULTNAME";
const KEY_VAULT_SECRET: &str = "KEYVAULTSECRET";
const CLIENT_ID: &str = "CLIENTID";
const LOG_FILE: &str = "LOGFILE";

const KNOWN_KEYS: [&str; 4] = [KEY_VAULT_NAME, KEY_VAULT_SECRET, CLIENT_ID, LOG_FILE];

/// Why a plugin input was rejected.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// More than [`MAX_ENTRIES`] `;`-separated entries.
    #[error("{0} entries, at most {max} allowed", max = MAX_ENTRIES)]
    TooManyEntries(usize),

    /// An entry without `=`.
    #[error("entry {0:?} is not key=value")]
    MalformedEntry(String),

    /// A required key is absent or empty. Carries the key's canonical spelling.
    #[error("missing {0} config")]
    MissingKey(&'static str),

    /// A key outside `keyVaultName`, `keyVaultSecret`, `clientId`, `logFile`.
    #[error("unknown key {0:?}")]
    UnknownKey(String),

    /// The same key (ignoring case) given twice.
    #[error("duplicate key {0:?}")]
    DuplicateKey(String),
}

/// Validated plugin input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginConfig {
    /// Key Vault name.
    pub key_vault_name: String,
    /// Name of the secret holding `domain\username:password`.
    pub key_vault_secret_name: String,
    /// Client id of the user-assigned managed identity.
    pub client_id: String,
    /// Append-only operator log; `None` disables file logging.
    pub log_file: Option<PathBuf>,
}

impl PluginConfig {
    /// Parse and validate a plugin input string.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let entries: Vec<&str> = input.split(';').collect();
        if entries.len() > MAX_ENTRIES {
            return Err(ConfigError::TooManyEntries(entries.len()));
        }

        let mut values: HashMap<String, &str> = HashMap::with_capacity(entries.len());
        for entry in entries {
            let (key, value) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::MalformedEntry(entry.to_string()))?;
            let normalized = key.to_uppercase();
            if !KNOWN_KEYS.contains(&normalized.as_str()) {
                return Err(ConfigError::UnknownKey(key.to_string()));
            }
            if values.insert(normalized, value).is_some() {
                return Err(ConfigError::DuplicateKey(key.to_string()));
            }
        }

        let required = |key: &str, name: &'static str| {
            values
                .get(key)
                .filter(|v| !v.is_empty())
                .map(|v| v.to_string())
                .ok_or(ConfigError::MissingKey(name))
        };

        Ok(Self {
            key_vault_name: required(KEY_VAULT_NAME, "keyVaultName")?,
            key_vault_secret_name: required(KEY_VAULT_SECRET, "keyVaultSecret")?,
            client_id: required(CLIENT_ID, "clientId")?,
            log_file: values
                .get(LOG_FILE)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        })
    }

    /// True when a log file is configured.
    pub fn logging_enabled(&self) -> bool {
        self.log_file.is_some()
    }

    /// The vault secret this configuration points at.
    pub fn secret_ref(&self) -> SecretRef {
        SecretRef::new(&self.key_vault_name, &self.key_vault_secret_name)
    }
}

impl FromStr for PluginConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
