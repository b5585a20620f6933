//! End-to-end pipeline tests without a network.
//!
//! A recording transport stands in for both the metadata endpoint and Key
//! Vault, so every request the broker makes (URL, headers, order) can be
//! asserted exactly.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ccg_http::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use ccg_keyvault::{BrokerError, CcgDomainAuthCredentials, ConfigError, CredentialBroker};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// RecordingTransport: canned responses, every request kept
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

const VALID_TOKEN_RESPONSE: &str = r#"{
  "access_token": "eyJ0eXAi...",
  "refresh_token": "",
  "expires_in": "3599",
  "expires_on": "1506484173",
  "not_before": "1506480273",
  "resource": "https://management.azure.com/",
  "token_type": "Bearer"
}"#;

const VALID_KEY_VAULT_RESPONSE: &str = r#"{
  "value": "domain\\username:password",
  "id": "https://keyvault.vault.azure.net/secrets/my_secret/123",
  "attributes": {
    "enabled": true,
    "created": 1493938410,
    "updated": 1493938410,
    "recoveryLevel": "Recoverable+Purgeable"
  }
}"#;

const TOKEN_URL: &str = "http://169.254.169.254/metadata/identity/oauth2/token?api-version=2018-02-01&resource=https://vault.azure.net&client_id=123";
const SECRET_URL: &str = "https://keyvault.vault.azure.net/secrets/my_secret?api-version=7.3";

const PLUGIN_INPUT: &str = "keyVaultName=keyvault;clientId=123;keyVaultSecret=my_secret";

#[derive(Debug, Clone)]
struct Recorded {
    url: String,
    headers: Vec<(String, String)>,
}

impl Recorded {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

struct RecordingTransport {
    secret_body: String,
    requests: Mutex<Vec<Recorded>>,
}

impl RecordingTransport {
    fn new() -> Arc<Self> {
        Self::with_secret(VALID_KEY_VAULT_RESPONSE)
    }

    fn with_secret(body: &str) -> Arc<Self> {
        Arc::new(Self {
            secret_body: body.to_string(),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let recorded = Recorded {
            url: request.url().to_string(),
            headers: request
                .headers()
                .map(|(n, v, _)| (n.to_string(), v.to_string()))
                .collect(),
        };
        self.requests.lock().unwrap().push(recorded);

        let response = if request.url().contains("169.254.169.254") {
            HttpResponse::new(200, VALID_TOKEN_RESPONSE)
        } else if request.url().contains(".vault.azure.net/secrets/") {
            HttpResponse::new(200, self.secret_body.as_str())
        } else {
            HttpResponse::new(404, "")
        };
        Ok(response)
    }
}

fn broker(transport: Arc<RecordingTransport>) -> CredentialBroker {
    CredentialBroker::new().transport(transport)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Happy path
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn returns_domain_username_password() {
    let transport = RecordingTransport::new();
    let (domain, username, password) = broker(transport)
        .get_password_credentials(PLUGIN_INPUT)
        .unwrap()
        .into_parts();

    assert_eq!(domain, "domain");
    assert_eq!(username, "username");
    assert_eq!(password.as_str(), "password");
}

#[test]
fn token_request_carries_metadata_header() {
    let transport = RecordingTransport::new();
    broker(transport.clone())
        .get_password_credentials(PLUGIN_INPUT)
        .unwrap();

    let requests = transport.requests();
    assert_eq!(requests[0].url, TOKEN_URL);
    assert_eq!(requests[0].header("metadata"), Some("true"));
    assert_eq!(requests[0].header("authorization"), None);
}

#[test]
fn secret_request_carries_bearer_token() {
    let transport = RecordingTransport::new();
    broker(transport.clone())
        .get_password_credentials(PLUGIN_INPUT)
        .unwrap();

    let requests = transport.requests();
    assert_eq!(requests[1].url, SECRET_URL);
    assert_eq!(
        requests[1].header("Authorization"),
        Some("Bearer eyJ0eXAi...")
    );
}

#[test]
fn repeated_calls_are_identical_and_ordered() {
    let transport = RecordingTransport::new();
    let broker = broker(transport.clone());

    let first = broker.get_password_credentials(PLUGIN_INPUT).unwrap();
    let second = broker.get_password_credentials(PLUGIN_INPUT).unwrap();

    assert_eq!(first.domain_name(), second.domain_name());
    assert_eq!(first.username(), second.username());
    assert_eq!(first.password(), second.password());

    let urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
    assert_eq!(urls, vec![TOKEN_URL, SECRET_URL, TOKEN_URL, SECRET_URL]);
}

#[test]
fn host_adapter_trait_object_works() {
    let host: Arc<dyn CcgDomainAuthCredentials> = Arc::new(broker(RecordingTransport::new()));
    let creds = host.get_password_credentials(PLUGIN_INPUT).unwrap();
    assert_eq!(creds.username(), "username");
}

#[tokio::test]
async fn host_adapter_called_from_async_code_does_not_panic() {
    let host: Arc<dyn CcgDomainAuthCredentials> = Arc::new(broker(RecordingTransport::new()));
    let (domain, username, password) = host
        .get_password_credentials(PLUGIN_INPUT)
        .unwrap()
        .into_parts();
    assert_eq!(
        (domain.as_str(), username.as_str(), password.as_str()),
        ("domain", "username", "password")
    );
}

#[tokio::test]
async fn async_entry_point_inside_runtime() {
    let creds = broker(RecordingTransport::new())
        .resolve(PLUGIN_INPUT)
        .await
        .unwrap();
    assert_eq!(creds.domain_name(), "domain");
}

#[test]
fn file_log_never_contains_password() {
    let dir = tempfile::tempdir().unwrap();
    let log_file = dir.path().join("ccg").join("ccg.log");
    let input = format!("{PLUGIN_INPUT};logFile={}", log_file.display());

    broker(RecordingTransport::new())
        .get_password_credentials(&input)
        .unwrap();

    let contents = std::fs::read_to_string(&log_file).unwrap();
    assert!(contents.contains("Got Password: ********\r\n"));
    assert!(!contents.contains(":password"));
    assert!(!contents.contains("Got Password: password"));
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Failures
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn too_many_entries_is_invalid_configuration() {
    let transport = RecordingTransport::new();
    let err = broker(transport.clone())
        .get_password_credentials(
            "keyVaultName=keyvault;clientId=123;keyVaultSecret=my_secret;logFile=c:\\temp\\logfile.log;banana=x",
        )
        .unwrap_err();

    assert!(
        matches!(err, BrokerError::InvalidConfiguration(ConfigError::TooManyEntries(5))),
        "got: {err:?}"
    );
    assert!(transport.requests().is_empty());
}

#[test]
fn missing_client_id_is_invalid_configuration() {
    let err = broker(RecordingTransport::new())
        .get_password_credentials("keyVaultName=keyvault;keyVaultSecret=my_secret")
        .unwrap_err();

    assert!(
        matches!(err, BrokerError::InvalidConfiguration(ConfigError::MissingKey("clientId"))),
        "got: {err:?}"
    );
}

#[test]
fn secret_without_separator_is_malformed() {
    let transport = RecordingTransport::with_secret(r#"{"value": "noseparator"}"#);
    let err = broker(transport)
        .get_password_credentials(PLUGIN_INPUT)
        .unwrap_err();

    assert!(matches!(err, BrokerError::MalformedSecret(_)), "got: {err:?}");
    assert!(!format!("{err} {err:?}").contains("noseparator"));
}

#[test]
fn extra_domain_segments_are_truncated() {
    let transport = RecordingTransport::with_secret(r#"{"value": "a\\b\\c:pw"}"#);
    let creds = broker(transport)
        .get_password_credentials(PLUGIN_INPUT)
        .unwrap();

    assert_eq!(creds.domain_name(), "a");
    assert_eq!(creds.username(), "b");
    assert_eq!(creds.password(), "pw");
}
