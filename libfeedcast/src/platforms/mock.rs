//! Mock platform implementation for testing
//!
//! A scripted platform: it serves a fixed timeline, records every posted text
//! and can be told to fail authentication or a specific post. Available in all
//! builds so integration tests can inject it into the pipeline.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::error::{PlatformError, Result};
use crate::platforms::Platform;
use crate::types::TimelinePost;

/// Configuration for mock platform behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Platform name (e.g., "mock-twitter")
    pub name: String,

    /// Handle returned by `authenticate`
    pub handle: String,

    /// Whether authentication should succeed
    pub auth_succeeds: bool,

    /// Timeline served by `recent_posts`, newest first
    pub timeline: Vec<TimelinePost>,

    /// 1-based index of the post call that fails, if any
    pub fail_on_post: Option<usize>,

    /// Error returned by the failing post call
    pub post_error: PlatformError,

    /// Number of times post has been called
    pub post_call_count: Arc<Mutex<usize>>,

    /// Count requested by the last `recent_posts` call
    pub requested_history: Arc<Mutex<Option<u32>>>,

    /// Texts that were posted successfully (for verification)
    pub posted_content: Arc<Mutex<Vec<String>>>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            handle: "mock_account".to_string(),
            auth_succeeds: true,
            timeline: Vec::new(),
            fail_on_post: None,
            post_error: PlatformError::Posting("Mock posting failed".to_string()),
            post_call_count: Arc::new(Mutex::new(0)),
            requested_history: Arc::new(Mutex::new(None)),
            posted_content: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Mock platform for testing
pub struct MockPlatform {
    config: MockConfig,
    authenticated: bool,
}

impl MockPlatform {
    /// Create a new mock platform with the given configuration
    pub fn new(config: MockConfig) -> Self {
        Self {
            config,
            authenticated: false,
        }
    }

    /// Create a mock platform with an empty timeline that accepts every post
    pub fn success(name: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            ..Default::default()
        })
    }

    /// Create a mock platform serving the given timeline
    pub fn with_timeline(name: &str, timeline: Vec<TimelinePost>) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            timeline,
            ..Default::default()
        })
    }

    /// Create a mock platform that fails authentication
    pub fn auth_failure(name: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            auth_succeeds: false,
            ..Default::default()
        })
    }

    /// Create a mock platform whose `nth` post call (1-based) fails with `error`
    pub fn failing_post(name: &str, nth: usize, error: PlatformError) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            fail_on_post: Some(nth),
            post_error: error,
            ..Default::default()
        })
    }

    /// Shared handle to the posted texts, usable after the platform is boxed
    pub fn posted_handle(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.config.posted_content)
    }

    /// Shared handle to the post call counter, usable after the platform is boxed
    pub fn post_calls_handle(&self) -> Arc<Mutex<usize>> {
        Arc::clone(&self.config.post_call_count)
    }

    /// Get the number of times post was called
    pub fn post_call_count(&self) -> usize {
        *self.config.post_call_count.lock().unwrap()
    }

    /// Get all content that was posted
    pub fn posted_content(&self) -> Vec<String> {
        self.config.posted_content.lock().unwrap().clone()
    }

    /// History size requested by the last `recent_posts` call
    pub fn requested_history(&self) -> Option<u32> {
        *self.config.requested_history.lock().unwrap()
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn authenticate(&mut self) -> Result<String> {
        if self.config.auth_succeeds {
            self.authenticated = true;
            Ok(self.config.handle.clone())
        } else {
            Err(PlatformError::Authentication("Mock authentication failed".to_string()).into())
        }
    }

    async fn recent_posts(&self, count: u32) -> Result<Vec<TimelinePost>> {
        if !self.authenticated {
            return Err(PlatformError::Authentication("Not authenticated".to_string()).into());
        }

        *self.config.requested_history.lock().unwrap() = Some(count);
        Ok(self
            .config
            .timeline
            .iter()
            .take(count as usize)
            .cloned()
            .collect())
    }

    async fn post(&self, content: &str) -> Result<String> {
        let call = {
            let mut calls = self.config.post_call_count.lock().unwrap();
            *calls += 1;
            *calls
        };

        if self.config.fail_on_post == Some(call) {
            return Err(self.config.post_error.clone().into());
        }

        self.config
            .posted_content
            .lock()
            .unwrap()
            .push(content.to_string());

        Ok(format!("{}:mock-{}", self.config.name, uuid::Uuid::new_v4()))
    }

    fn name(&self) -> &str {
        &self.config.name
    }
}
