//! API credential loading
//!
//! Credentials are a JSON document with four string fields. Where it is read
//! from depends on the deployment mode:
//! - `local`: a file next to the process (`credentials.local_path`)
//! - `lambda`: an object-storage item (`credentials.bucket` / `credentials.key`)
//!
//! The mode comes from the `ENVIRONMENT` variable and defaults to `local`.
//! Any other value is rejected before the first network request.
//!
//! # Example
//!
//! ```no_run
//! use libfeedcast::config::Config;
//! use libfeedcast::credentials::{load_credentials, DeploymentMode};
//!
//! # async fn example() -> libfeedcast::Result<()> {
//! let config = Config::load()?;
//! let mode = DeploymentMode::from_env()?;
//! let credentials = load_credentials(mode, &config).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::Config;
use crate::error::{ConfigError, CredentialError, Result};

pub const DEPLOYMENT_MODE_VAR: &str = "ENVIRONMENT";

/// Where the process runs, which decides where credentials live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMode {
    Local,
    Lambda,
}

impl DeploymentMode {
    /// Read the mode from `ENVIRONMENT`, defaulting to `local`
    pub fn from_env() -> Result<Self> {
        match std::env::var(DEPLOYMENT_MODE_VAR) {
            Ok(value) => value.parse(),
            Err(_) => Ok(DeploymentMode::Local),
        }
    }
}

impl FromStr for DeploymentMode {
    type Err = crate::error::FeedcastError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "local" => Ok(DeploymentMode::Local),
            "lambda" => Ok(DeploymentMode::Lambda),
            other => Err(ConfigError::InvalidConfiguration(format!(
                "Invalid env: \"{}\"",
                other
            ))
            .into()),
        }
    }
}

impl std::fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeploymentMode::Local => write!(f, "local"),
            DeploymentMode::Lambda => write!(f, "lambda"),
        }
    }
}

/// OAuth 1.0a credentials for the social account
pub struct Credentials {
    pub access_token: SecretString,
    pub access_secret: SecretString,
    pub consumer_key: SecretString,
    pub consumer_secret: SecretString,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"[REDACTED]")
            .field("access_secret", &"[REDACTED]")
            .field("consumer_key", &"[REDACTED]")
            .field("consumer_secret", &"[REDACTED]")
            .finish()
    }
}

#[derive(Deserialize)]
struct CredentialsDocument {
    #[serde(rename = "ACCESS_TOKEN")]
    access_token: String,
    #[serde(rename = "ACCESS_SECRET")]
    access_secret: String,
    #[serde(rename = "CONSUMER_KEY")]
    consumer_key: String,
    #[serde(rename = "CONSUMER_SECRET")]
    consumer_secret: String,
}

impl Credentials {
    /// Parse the JSON credentials document
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Malformed` when a field is missing or not a
    /// string and `CredentialError::MissingField` when a field is empty.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let doc: CredentialsDocument =
            serde_json::from_slice(bytes).map_err(CredentialError::Malformed)?;

        let fields = [
            ("ACCESS_TOKEN", &doc.access_token),
            ("ACCESS_SECRET", &doc.access_secret),
            ("CONSUMER_KEY", &doc.consumer_key),
            ("CONSUMER_SECRET", &doc.consumer_secret),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(CredentialError::MissingField(name.to_string()).into());
            }
        }

        Ok(Self {
            access_token: SecretString::from(doc.access_token),
            access_secret: SecretString::from(doc.access_secret),
            consumer_key: SecretString::from(doc.consumer_key),
            consumer_secret: SecretString::from(doc.consumer_secret),
        })
    }

    pub fn consumer_key(&self) -> &str {
        self.consumer_key.expose_secret()
    }

    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }
}

/// A place credentials can be read from
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Fetch and parse the credentials document
    async fn load(&self) -> Result<Credentials>;

    /// Short name used in log lines
    fn name(&self) -> &str;
}

/// Credentials stored in a local JSON file
pub struct LocalFileSource {
    path: PathBuf,
}

impl LocalFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CredentialSource for LocalFileSource {
    async fn load(&self) -> Result<Credentials> {
        let path = shellexpand::tilde(&self.path.to_string_lossy()).to_string();
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| CredentialError::Read {
                path: path.clone(),
                source,
            })?;
        Credentials::from_json(&bytes)
    }

    fn name(&self) -> &str {
        "local_file"
    }
}

/// Credentials stored as an object-storage item, fetched over HTTPS
///
/// The URL is expected to be readable by the process, e.g. a bucket policy
/// granting the function's role access or a presigned URL.
pub struct ObjectStorageSource {
    client: reqwest::Client,
    url: String,
}

impl ObjectStorageSource {
    pub fn new(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl CredentialSource for ObjectStorageSource {
    async fn load(&self) -> Result<Credentials> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| CredentialError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CredentialError::Fetch(format!(
                "{} returned HTTP {}",
                self.url,
                response.status()
            ))
            .into());
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CredentialError::Fetch(e.to_string()))?;
        Credentials::from_json(&bytes)
    }

    fn name(&self) -> &str {
        "object_storage"
    }
}

/// Build the credential source for a deployment mode
pub fn source_for(mode: DeploymentMode, config: &Config) -> Box<dyn CredentialSource> {
    match mode {
        DeploymentMode::Local => Box::new(LocalFileSource::new(&config.credentials.local_path)),
        DeploymentMode::Lambda => Box::new(ObjectStorageSource::new(
            reqwest::Client::new(),
            config.credentials_url(),
        )),
    }
}

/// Load credentials for the given deployment mode
pub async fn load_credentials(mode: DeploymentMode, config: &Config) -> Result<Credentials> {
    let source = source_for(mode, config);
    tracing::debug!("Loading credentials from {} ({} mode)", source.name(), mode);
    source.load().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedcastError;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DOC: &str = r#"{
        "ACCESS_TOKEN": "token",
        "ACCESS_SECRET": "token-secret",
        "CONSUMER_KEY": "key",
        "CONSUMER_SECRET": "key-secret"
    }"#;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("local".parse::<DeploymentMode>().unwrap(), DeploymentMode::Local);
        assert_eq!("lambda".parse::<DeploymentMode>().unwrap(), DeploymentMode::Lambda);
    }

    #[test]
    fn test_unknown_mode_is_invalid_configuration() {
        let err = "staging".parse::<DeploymentMode>().unwrap_err();
        assert!(matches!(
            err,
            FeedcastError::Config(ConfigError::InvalidConfiguration(_))
        ));
        assert!(err.to_string().contains("Invalid env: \"staging\""));
    }

    #[test]
    #[serial]
    fn test_mode_defaults_to_local() {
        std::env::remove_var(DEPLOYMENT_MODE_VAR);
        assert_eq!(DeploymentMode::from_env().unwrap(), DeploymentMode::Local);
    }

    #[test]
    #[serial]
    fn test_mode_from_env() {
        std::env::set_var(DEPLOYMENT_MODE_VAR, "lambda");
        let mode = DeploymentMode::from_env();
        std::env::remove_var(DEPLOYMENT_MODE_VAR);
        assert_eq!(mode.unwrap(), DeploymentMode::Lambda);
    }

    #[test]
    fn test_parse_document() {
        let credentials = Credentials::from_json(DOC.as_bytes()).unwrap();
        assert_eq!(credentials.consumer_key(), "key");
        assert_eq!(credentials.access_token(), "token");
        assert_eq!(credentials.access_secret.expose_secret(), "token-secret");
        assert_eq!(credentials.consumer_secret.expose_secret(), "key-secret");
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let err = Credentials::from_json(br#"{"ACCESS_TOKEN": "t"}"#).unwrap_err();
        assert!(matches!(
            err,
            FeedcastError::Credential(CredentialError::Malformed(_))
        ));
    }

    #[test]
    fn test_empty_field_rejected() {
        let doc = r#"{"ACCESS_TOKEN": "", "ACCESS_SECRET": "a", "CONSUMER_KEY": "b", "CONSUMER_SECRET": "c"}"#;
        let err = Credentials::from_json(doc.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("ACCESS_TOKEN"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let credentials = Credentials::from_json(DOC.as_bytes()).unwrap();
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("token-secret"));
    }

    #[tokio::test]
    async fn test_local_file_source() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(DOC.as_bytes()).unwrap();

        let source = LocalFileSource::new(file.path());
        let credentials = source.load().await.unwrap();
        assert_eq!(credentials.consumer_key(), "key");
        assert_eq!(source.name(), "local_file");
    }

    #[tokio::test]
    async fn test_local_file_missing() {
        let source = LocalFileSource::new("/nonexistent/credentials.json");
        let err = source.load().await.unwrap_err();
        assert!(matches!(
            err,
            FeedcastError::Credential(CredentialError::Read { .. })
        ));
    }

    #[tokio::test]
    async fn test_object_storage_source() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bot-bucket/credentials.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(DOC))
            .mount(&server)
            .await;

        let mut config = Config::default();
        config.credentials.bucket = "bot-bucket".to_string();
        config.credentials.object_endpoint = format!("{}/{{bucket}}/{{key}}", server.uri());

        let credentials = load_credentials(DeploymentMode::Lambda, &config)
            .await
            .unwrap();
        assert_eq!(credentials.access_token(), "token");
    }

    #[tokio::test]
    async fn test_object_storage_denied() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let source = ObjectStorageSource::new(
            reqwest::Client::new(),
            format!("{}/bucket/credentials.json", server.uri()),
        );
        let err = source.load().await.unwrap_err();
        assert!(matches!(
            err,
            FeedcastError::Credential(CredentialError::Fetch(_))
        ));
        assert!(err.to_string().contains("403"));
    }
}
