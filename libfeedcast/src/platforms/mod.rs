//! Social platform abstraction and implementations
//!
//! The pipeline only needs three things from a platform: confirm who we are,
//! read the account's recent posts, and publish a new one.
//!
//! # Examples
//!
//! ```no_run
//! use libfeedcast::platforms::{twitter::TwitterClient, Platform};
//! use libfeedcast::credentials::Credentials;
//!
//! # async fn example(credentials: Credentials) -> libfeedcast::Result<()> {
//! let mut platform = TwitterClient::new("https://api.twitter.com/1.1", credentials)?;
//!
//! let handle = platform.authenticate().await?;
//! let history = platform.recent_posts(200).await?;
//! println!("{} has {} recent posts", handle, history.len());
//!
//! let post_id = platform.post("New Post https://blog.example/p1?spref=tw").await?;
//! println!("Posted: {}", post_id);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::error::Result;
use crate::types::TimelinePost;

pub mod mock;
pub mod oauth;
pub mod twitter;

/// Platform trait for the social account the feed is announced on
#[async_trait]
pub trait Platform: Send + Sync {
    /// Verify the credentials and resolve the account handle
    ///
    /// Must be called before [`Platform::recent_posts`].
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Authentication` when the platform rejects the
    /// credentials.
    async fn authenticate(&mut self) -> Result<String>;

    /// Fetch the account's most recent posts, newest first
    ///
    /// # Errors
    ///
    /// Returns `ParseError` when a post's timestamp is malformed, and a
    /// `PlatformError` for transport or API failures.
    async fn recent_posts(&self, count: u32) -> Result<Vec<TimelinePost>>;

    /// Publish `content` and return the platform's post id
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Duplicate` when the platform refuses a repeated
    /// status, `PlatformError::RateLimit` when throttled, and other
    /// `PlatformError` variants for any other rejection.
    async fn post(&self, content: &str) -> Result<String>;

    /// Lowercase identifier for log lines (e.g. "twitter")
    fn name(&self) -> &str;
}
