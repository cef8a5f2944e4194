//! One announcement run: feed → timeline → filter → dedup → publish
//!
//! Clients are built and authenticated once by [`Sentinel::from_config`] (or
//! injected through [`Sentinel::connect`]) and reused by every invocation of
//! [`Sentinel::handle_event`].

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::info;

use crate::config::Config;
use crate::credentials::{load_credentials, DeploymentMode};
use crate::dedup::extract_posted_links;
use crate::error::Result;
use crate::feed::{ArticleSource, FeedReader};
use crate::platforms::twitter::TwitterClient;
use crate::platforms::Platform;
use crate::publisher::Publisher;
use crate::recency::{recent_articles, recent_posts};
use crate::types::PublishReport;

/// The feed-to-timeline announcer
pub struct Sentinel {
    config: Config,
    source: Box<dyn ArticleSource>,
    platform: Box<dyn Platform>,
    handle: String,
}

impl Sentinel {
    /// Authenticate `platform` and assemble a sentinel around the given collaborators
    pub async fn connect(
        config: Config,
        source: Box<dyn ArticleSource>,
        mut platform: Box<dyn Platform>,
    ) -> Result<Self> {
        let handle = platform.authenticate().await?;
        info!("Authenticated with {} as @{}", platform.name(), handle);

        Ok(Self {
            config,
            source,
            platform,
            handle,
        })
    }

    /// Load credentials for `mode` and build the real feed reader and Twitter client
    ///
    /// # Errors
    ///
    /// Fails before any network activity if the configuration is invalid.
    pub async fn from_config(config: Config, mode: DeploymentMode) -> Result<Self> {
        config.validate()?;

        let credentials = load_credentials(mode, &config).await?;
        let platform = TwitterClient::new(config.twitter.api_base.clone(), credentials)?;
        let source = FeedReader::new(config.feed_url())?;

        Self::connect(config, Box::new(source), Box::new(platform)).await
    }

    /// Account handle resolved during authentication
    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Invocation entry point; `event` and `context` are accepted and ignored
    pub async fn handle_event(
        &self,
        _event: &serde_json::Value,
        _context: &serde_json::Value,
    ) -> Result<PublishReport> {
        self.run_at(Utc::now()).await
    }

    /// Run the pipeline with `now` as the reference time for both filters
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<PublishReport> {
        let window = self.config.recent_window()?;

        let articles = self.source.fetch_articles().await?;
        let articles = recent_articles(articles, window, now)?;
        info!(
            "Found {} recent articles: {:?}",
            articles.len(),
            articles.iter().map(|a| a.title.as_str()).collect::<Vec<_>>()
        );

        let timeline = self
            .platform
            .recent_posts(self.config.twitter.history_count)
            .await?;
        let timeline = recent_posts(timeline, window, now)?;
        let already_posted = extract_posted_links(&timeline, self.config.domain_marker());
        info!(
            "Found {} already posted articles: {:?}",
            already_posted.len(),
            already_posted
        );

        let already_posted: HashSet<String> = already_posted.into_iter().collect();
        Publisher::new(&*self.platform, self.config.twitter.tracking_suffix.as_str())
            .with_failure_policy(self.config.publish.on_failure)
            .publish(&articles, &already_posted)
            .await
    }
}
