//! Error types for Feedcast

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FeedcastError>;

#[derive(Error, Debug)]
pub enum FeedcastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

impl FeedcastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            FeedcastError::Config(_) => 2,
            FeedcastError::Credential(_) => 2,
            FeedcastError::Platform(PlatformError::Authentication(_)) => 2,
            FeedcastError::Platform(_) => 1,
            FeedcastError::Feed(_) => 1,
            FeedcastError::Parse(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Failed to read credentials file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch credentials from object storage: {0}")]
    Fetch(String),

    #[error("Malformed credentials document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Credential field is empty: {0}")]
    MissingField(String),
}

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Failed to fetch feed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Feed request returned HTTP {0}")]
    Http(u16),

    #[error("Failed to parse feed: {0}")]
    Parse(String),
}

/// Which record a timestamp belonged to when it failed to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Article,
    Post,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Article => write!(f, "article"),
            RecordKind::Post => write!(f, "post"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{kind} timestamp '{value}' does not match format '{format}'")]
    Timestamp {
        kind: RecordKind,
        value: String,
        format: &'static str,
    },

    #[error("{kind} is missing field '{field}'")]
    MissingField { kind: RecordKind, field: &'static str },
}

#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Posting failed: {0}")]
    Posting(String),

    #[error("Duplicate status rejected: {0}")]
    Duplicate(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Unexpected response: {0}")]
    Response(String),
}
