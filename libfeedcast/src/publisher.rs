//! Announcing articles on the platform
//!
//! The feed lists articles newest first. They are posted in reverse, oldest
//! first, so that the timeline reads chronologically even when a run stops
//! halfway through.

use std::collections::HashSet;
use tracing::{info, warn};

use crate::config::FailurePolicy;
use crate::dedup::normalize_link;
use crate::error::{FeedcastError, Result};
use crate::platforms::Platform;
use crate::types::{Article, PublishReport};

/// Posts recent articles that are not on the timeline yet
pub struct Publisher<'a> {
    platform: &'a dyn Platform,
    tracking_suffix: String,
    on_failure: FailurePolicy,
}

impl<'a> Publisher<'a> {
    pub fn new(platform: &'a dyn Platform, tracking_suffix: impl Into<String>) -> Self {
        Self {
            platform,
            tracking_suffix: tracking_suffix.into(),
            on_failure: FailurePolicy::Abort,
        }
    }

    pub fn with_failure_policy(mut self, on_failure: FailurePolicy) -> Self {
        self.on_failure = on_failure;
        self
    }

    /// Post every article whose normalized link is not in `already_posted`
    ///
    /// `articles` must be in feed order (newest first).
    ///
    /// # Errors
    ///
    /// With [`FailurePolicy::Abort`] the first platform error is returned and
    /// the remaining articles are left for the next run. With
    /// [`FailurePolicy::Continue`] errors are logged and counted in the report.
    pub async fn publish(
        &self,
        articles: &[Article],
        already_posted: &HashSet<String>,
    ) -> Result<PublishReport> {
        let mut report = PublishReport::default();

        for article in articles.iter().rev() {
            let link = normalize_link(&article.link, &self.tracking_suffix);

            if already_posted.contains(&link) {
                info!("Article \"{}\" has already been posted", article.title);
                report.skipped += 1;
                continue;
            }

            let status = format!("{} {}", article.title, link);
            info!("Posting to {}: {}", self.platform.name(), status);

            match self.platform.post(&status).await {
                Ok(post_id) => {
                    report.posted += 1;
                    report.post_ids.push(post_id);
                }
                Err(FeedcastError::Platform(e)) if self.on_failure == FailurePolicy::Continue => {
                    warn!("Failed to post \"{}\": {}", article.title, e);
                    report.failed += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlatformError;
    use crate::platforms::mock::MockPlatform;
    use chrono::{TimeZone, Utc};

    const SUFFIX: &str = "?spref=tw";

    fn article(title: &str, link: &str) -> Article {
        Article::new(
            title.to_string(),
            link.to_string(),
            Utc.with_ymd_and_hms(2021, 1, 2, 12, 0, 0).unwrap().fixed_offset(),
        )
    }

    #[tokio::test]
    async fn test_posts_oldest_first() {
        let platform = MockPlatform::success("mock");
        let publisher = Publisher::new(&platform, SUFFIX);
        let articles = vec![
            article("A", "http://blog.example/a"),
            article("B", "http://blog.example/b"),
            article("C", "http://blog.example/c"),
        ];

        let report = publisher.publish(&articles, &HashSet::new()).await.unwrap();

        assert_eq!(report.posted, 3);
        assert_eq!(report.post_ids.len(), 3);
        assert_eq!(
            platform.posted_content(),
            vec![
                "C http://blog.example/c?spref=tw".to_string(),
                "B http://blog.example/b?spref=tw".to_string(),
                "A http://blog.example/a?spref=tw".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_already_posted_is_skipped() {
        let platform = MockPlatform::success("mock");
        let publisher = Publisher::new(&platform, SUFFIX);
        let articles = vec![
            article("New", "http://blog.example/new"),
            article("Old", "http://blog.example/old"),
        ];
        let posted: HashSet<String> = ["http://blog.example/old?spref=tw".to_string()]
            .into_iter()
            .collect();

        let report = publisher.publish(&articles, &posted).await.unwrap();

        assert_eq!(report.posted, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(
            platform.posted_content(),
            vec!["New http://blog.example/new?spref=tw".to_string()]
        );
    }

    #[tokio::test]
    async fn test_link_with_suffix_not_doubled() {
        let platform = MockPlatform::success("mock");
        let publisher = Publisher::new(&platform, SUFFIX);
        let articles = vec![article("Tagged", "http://blog.example/t?spref=tw")];

        publisher.publish(&articles, &HashSet::new()).await.unwrap();

        assert_eq!(
            platform.posted_content(),
            vec!["Tagged http://blog.example/t?spref=tw".to_string()]
        );
    }

    #[tokio::test]
    async fn test_unnormalized_history_link_does_not_match() {
        let platform = MockPlatform::success("mock");
        let publisher = Publisher::new(&platform, SUFFIX);
        let articles = vec![article("P", "http://blog.example/p")];
        let posted: HashSet<String> = ["http://blog.example/p".to_string()].into_iter().collect();

        let report = publisher.publish(&articles, &posted).await.unwrap();
        assert_eq!(report.posted, 1);
    }

    #[tokio::test]
    async fn test_abort_stops_remaining_posts() {
        let platform = MockPlatform::failing_post(
            "mock",
            1,
            PlatformError::RateLimit("Rate limit exceeded".to_string()),
        );
        let publisher = Publisher::new(&platform, SUFFIX);
        let articles = vec![
            article("Newer", "http://blog.example/2"),
            article("Older", "http://blog.example/1"),
        ];

        let err = publisher
            .publish(&articles, &HashSet::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FeedcastError::Platform(PlatformError::RateLimit(_))
        ));
        assert_eq!(platform.post_call_count(), 1);
        assert!(platform.posted_content().is_empty());
    }

    #[tokio::test]
    async fn test_continue_posts_remaining() {
        let platform = MockPlatform::failing_post(
            "mock",
            1,
            PlatformError::Duplicate("Status is a duplicate.".to_string()),
        );
        let publisher =
            Publisher::new(&platform, SUFFIX).with_failure_policy(FailurePolicy::Continue);
        let articles = vec![
            article("Newer", "http://blog.example/2"),
            article("Older", "http://blog.example/1"),
        ];

        let report = publisher.publish(&articles, &HashSet::new()).await.unwrap();

        assert_eq!(report.posted, 1);
        assert_eq!(report.failed, 1);
        assert!(!report.is_clean());
        assert_eq!(
            platform.posted_content(),
            vec!["Newer http://blog.example/2?spref=tw".to_string()]
        );
    }
}
