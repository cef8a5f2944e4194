//! Syndication feed reader
//!
//! Fetches the blog's Atom/RSS feed and turns its entries into [`Article`]s,
//! newest first as the feed lists them.

use async_trait::async_trait;
use feed_rs::model::Entry;
use chrono::Utc;
use reqwest::Client;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::error::{FeedError, ParseError, RecordKind, Result};
use crate::types::{parse_article_timestamp, Article};

const CONNECT_TIMEOUT_SECS: u64 = 10;
const TOTAL_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = concat!("feedcast/", env!("CARGO_PKG_VERSION"));

/// Anything that can produce the current list of articles
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Fetch all articles, in feed order
    async fn fetch_articles(&self) -> Result<Vec<Article>>;
}

/// HTTP feed reader
pub struct FeedReader {
    client: Client,
    url: String,
}

impl FeedReader {
    /// Create a reader for the feed at `url`
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(TOTAL_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(FeedError::Network)?;

        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ArticleSource for FeedReader {
    async fn fetch_articles(&self) -> Result<Vec<Article>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(FeedError::Network)?;

        if !response.status().is_success() {
            return Err(FeedError::Http(response.status().as_u16()).into());
        }

        let bytes = response.bytes().await.map_err(FeedError::Network)?;
        parse_articles(&bytes)
    }
}

/// Parse a feed document into articles
///
/// Timestamps must be in [`crate::types::ARTICLE_TIME_FORMAT`]; anything else is not
/// guessed at.
///
/// # Errors
///
/// Returns `FeedError::Parse` when the document is not a feed,
/// `ParseError::Timestamp` when an entry's publish time is in another format and
/// `ParseError::MissingField` when an entry has no title, link or publish time.
pub fn parse_articles(bytes: &[u8]) -> Result<Vec<Article>> {
    // feed-rs drops timestamps its parser rejects; keep them for the error
    let rejected: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    let parser = {
        let rejected = Rc::clone(&rejected);
        feed_rs::parser::Builder::new()
            .timestamp_parser(move |text| {
                let text = text.trim();
                match parse_article_timestamp(text) {
                    Ok(ts) => Some(ts.with_timezone(&Utc)),
                    Err(_) => {
                        rejected.borrow_mut().push(text.to_string());
                        None
                    }
                }
            })
            .build()
    };

    let feed = parser
        .parse(bytes)
        .map_err(|e| FeedError::Parse(e.to_string()))?;

    let rejected = rejected.borrow();
    let mut articles = Vec::with_capacity(feed.entries.len());
    for entry in feed.entries {
        articles.push(article_from_entry(entry, &rejected)?);
    }
    Ok(articles)
}

fn article_from_entry(
    entry: Entry,
    rejected: &[String],
) -> std::result::Result<Article, ParseError> {
    let missing = |field| ParseError::MissingField {
        kind: RecordKind::Article,
        field,
    };

    let published_at = match entry.published {
        Some(ts) => ts.fixed_offset(),
        None => match rejected.first() {
            // Re-run the strict parse to report the offending value
            Some(value) => parse_article_timestamp(value)?,
            None => return Err(missing("published")),
        },
    };
    let link = alternate_link(&entry).ok_or_else(|| missing("link"))?;
    let title = entry.title.map(|t| t.content).ok_or_else(|| missing("title"))?;

    Ok(Article::new(title, link, published_at))
}

/// The entry's public page: the `alternate` link, or the first link without a rel
fn alternate_link(entry: &Entry) -> Option<String> {
    entry
        .links
        .iter()
        .find(|l| l.rel.as_deref() == Some("alternate"))
        .or_else(|| entry.links.iter().find(|l| l.rel.is_none()))
        .map(|l| l.href.clone())
}
