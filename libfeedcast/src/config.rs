//! Configuration management for Feedcast
//!
//! Every field has a default, so a deployment without a config file runs
//! against the built-in blog and account settings.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

pub const DEFAULT_BLOG_URL: &str = "https://www.celticscentral.blogspot.com.celticscentral.com";
pub const DEFAULT_FEED_PATH: &str = "/feeds/posts/default";
pub const DEFAULT_TRACKING_SUFFIX: &str = "?spref=tw";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub feed: FeedConfig,
    pub twitter: TwitterConfig,
    pub window: WindowConfig,
    pub credentials: CredentialsConfig,
    pub publish: PublishConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub blog_url: String,
    pub feed_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterConfig {
    pub api_base: String,
    /// How many timeline posts to inspect for duplicates
    pub history_count: u32,
    pub tracking_suffix: String,
    /// Substring identifying blog links on the timeline; defaults to `feed.blog_url`
    pub domain_marker: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Lookback window as a humantime duration, e.g. "20m"
    pub recent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub local_path: String,
    pub bucket: String,
    pub key: String,
    /// URL template with `{bucket}` and `{key}` placeholders
    pub object_endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PublishConfig {
    pub on_failure: FailurePolicy,
}

/// What the publisher does when the platform rejects a post
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop at the first rejected post; the next run picks up the rest
    #[default]
    Abort,
    /// Log the rejection and move on to the next article
    Continue,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            blog_url: DEFAULT_BLOG_URL.to_string(),
            feed_path: DEFAULT_FEED_PATH.to_string(),
        }
    }
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.twitter.com/1.1".to_string(),
            history_count: 200,
            tracking_suffix: DEFAULT_TRACKING_SUFFIX.to_string(),
            domain_marker: None,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            recent: "20m".to_string(),
        }
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            local_path: "credentials.json".to_string(),
            bucket: "celtics-sentinel-twitter-bot".to_string(),
            key: "credentials.json".to_string(),
            object_endpoint: "https://{bucket}.s3.amazonaws.com/{key}".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// A missing file at the default location is not an error: the built-in
    /// defaults are used. A path given through `FEEDCAST_CONFIG` must exist.
    pub fn load() -> Result<Self> {
        let (config_path, explicit) = resolve_config_path()?;
        if !explicit && !config_path.exists() {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values a run depends on
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.feed_url()).map_err(|e| ConfigError::InvalidValue {
            field: "feed.blog_url".to_string(),
            reason: e.to_string(),
        })?;

        if self.twitter.history_count == 0 {
            return Err(ConfigError::InvalidValue {
                field: "twitter.history_count".to_string(),
                reason: "must be greater than zero".to_string(),
            }
            .into());
        }

        if self.twitter.tracking_suffix.is_empty() {
            return Err(ConfigError::MissingField("twitter.tracking_suffix".to_string()).into());
        }

        if self.domain_marker().is_empty() {
            return Err(ConfigError::MissingField("twitter.domain_marker".to_string()).into());
        }

        if self.recent_window()? <= chrono::Duration::zero() {
            return Err(ConfigError::InvalidValue {
                field: "window.recent".to_string(),
                reason: "must be greater than zero".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Full URL of the syndication feed
    pub fn feed_url(&self) -> String {
        format!(
            "{}{}",
            self.feed.blog_url.trim_end_matches('/'),
            self.feed.feed_path
        )
    }

    pub fn domain_marker(&self) -> &str {
        self.twitter
            .domain_marker
            .as_deref()
            .unwrap_or(&self.feed.blog_url)
    }

    /// The recency window as a signed duration
    pub fn recent_window(&self) -> Result<chrono::Duration> {
        let invalid = |reason: String| ConfigError::InvalidValue {
            field: "window.recent".to_string(),
            reason,
        };

        let std_duration =
            humantime::parse_duration(&self.window.recent).map_err(|e| invalid(e.to_string()))?;
        let duration =
            chrono::Duration::from_std(std_duration).map_err(|e| invalid(e.to_string()))?;
        Ok(duration)
    }

    /// Object storage URL of the credentials document
    pub fn credentials_url(&self) -> String {
        self.credentials
            .object_endpoint
            .replace("{bucket}", &self.credentials.bucket)
            .replace("{key}", &self.credentials.key)
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
///
/// Returns the path and whether it was set explicitly through `FEEDCAST_CONFIG`.
pub fn resolve_config_path() -> Result<(PathBuf, bool)> {
    if let Ok(path) = std::env::var("FEEDCAST_CONFIG") {
        return Ok((PathBuf::from(shellexpand::tilde(&path).to_string()), true));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok((config_dir.join("feedcast").join("config.toml"), false))
}
