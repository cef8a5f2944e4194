//! Core types for Feedcast

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::error::{ParseError, RecordKind};

/// Timestamp format of feed entries, e.g. `2021-01-01T04:55:00.001-05:00`
///
/// The fractional seconds are mandatory; see [`parse_article_timestamp`].
pub const ARTICLE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Byte offset of the `.` that starts the fractional seconds
const FRACTION_OFFSET: usize = "YYYY-MM-DDTHH:MM:SS".len();

/// Timestamp format of timeline posts, e.g. `Sat Jan 02 02:19:12 +0000 2021`
pub const POST_TIME_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// A feed entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    pub title: String,
    pub link: String,
    pub published_at: DateTime<FixedOffset>,
}

impl Article {
    pub fn new(title: String, link: String, published_at: DateTime<FixedOffset>) -> Self {
        Self {
            title,
            link,
            published_at,
        }
    }

    /// Build an article from a raw `published` string
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Timestamp` when `published` is not in
    /// [`ARTICLE_TIME_FORMAT`].
    pub fn parse(title: &str, link: &str, published: &str) -> Result<Self, ParseError> {
        let published_at = parse_article_timestamp(published)?;
        Ok(Self::new(title.to_string(), link.to_string(), published_at))
    }
}

/// A post from the account's timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelinePost {
    pub created_at: DateTime<FixedOffset>,
    /// Expanded URLs referenced by the post, in the order the platform reports them
    pub entity_urls: Vec<String>,
}

impl TimelinePost {
    pub fn new(created_at: DateTime<FixedOffset>, entity_urls: Vec<String>) -> Self {
        Self {
            created_at,
            entity_urls,
        }
    }

    /// Build a timeline post from the platform's raw `created_at` string
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Timestamp` when `created_at` is not in
    /// [`POST_TIME_FORMAT`].
    pub fn parse(created_at: &str, entity_urls: Vec<String>) -> Result<Self, ParseError> {
        let created_at = parse_timestamp(created_at, POST_TIME_FORMAT, RecordKind::Post)?;
        Ok(Self::new(created_at, entity_urls))
    }
}

/// Parse a feed timestamp in [`ARTICLE_TIME_FORMAT`]
///
/// chrono treats `%.f` as optional, so the `.` followed by at least one digit
/// is checked here. `Z` is not accepted as an offset.
pub fn parse_article_timestamp(value: &str) -> Result<DateTime<FixedOffset>, ParseError> {
    let bytes = value.as_bytes();
    let has_fraction = bytes.get(FRACTION_OFFSET) == Some(&b'.')
        && bytes
            .get(FRACTION_OFFSET + 1)
            .is_some_and(|b| b.is_ascii_digit());

    if !has_fraction {
        return Err(ParseError::Timestamp {
            kind: RecordKind::Article,
            value: value.to_string(),
            format: ARTICLE_TIME_FORMAT,
        });
    }
    parse_timestamp(value, ARTICLE_TIME_FORMAT, RecordKind::Article)
}

fn parse_timestamp(
    value: &str,
    format: &'static str,
    kind: RecordKind,
) -> Result<DateTime<FixedOffset>, ParseError> {
    DateTime::parse_from_str(value, format).map_err(|_| ParseError::Timestamp {
        kind,
        value: value.to_string(),
        format,
    })
}

/// Outcome of one publishing pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    /// Number of articles submitted successfully
    pub posted: usize,
    /// Number of articles whose link was already on the timeline
    pub skipped: usize,
    /// Number of submissions the platform rejected (only non-zero when continuing on failure)
    pub failed: usize,
    /// Platform ids of the submitted posts, in submission order
    pub post_ids: Vec<String>,
}

impl PublishReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}
