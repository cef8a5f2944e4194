//! Feedcast - announce new blog articles on a social account
//!
//! A single run fetches the blog's feed and the account's recent timeline,
//! keeps what falls inside the recency window, drops articles whose links are
//! already on the timeline and posts the rest, oldest first.

pub mod config;
pub mod credentials;
pub mod dedup;
pub mod error;
pub mod feed;
pub mod logging;
pub mod pipeline;
pub mod platforms;
pub mod publisher;
pub mod recency;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use credentials::{Credentials, DeploymentMode};
pub use error::{FeedcastError, Result};
pub use pipeline::Sentinel;
pub use types::{Article, PublishReport, TimelinePost};
