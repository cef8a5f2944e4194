//! Time-window filtering for articles and timeline posts
//!
//! An item is recent when `now - timestamp <= window`. Items stamped in the
//! future have a negative elapsed time and are therefore always kept.

use chrono::{DateTime, Duration, FixedOffset, Utc};

use crate::error::ParseError;
use crate::types::{Article, TimelinePost};

/// Keep the items published within `window` of `now`, preserving input order
///
/// `timestamp_of` extracts each item's timestamp. Offsets are normalized to UTC
/// before subtracting.
///
/// # Errors
///
/// Returns the first `ParseError` produced by `timestamp_of`; no partial result
/// is returned in that case.
pub fn filter_recent<T, F>(
    items: Vec<T>,
    window: Duration,
    now: DateTime<Utc>,
    timestamp_of: F,
) -> Result<Vec<T>, ParseError>
where
    F: Fn(&T) -> Result<DateTime<FixedOffset>, ParseError>,
{
    let mut recent = Vec::with_capacity(items.len());

    for item in items {
        let elapsed = now.signed_duration_since(timestamp_of(&item)?.with_timezone(&Utc));
        if elapsed <= window {
            recent.push(item);
        }
    }

    Ok(recent)
}

/// Articles published within `window` of `now`
pub fn recent_articles(
    articles: Vec<Article>,
    window: Duration,
    now: DateTime<Utc>,
) -> Result<Vec<Article>, ParseError> {
    filter_recent(articles, window, now, |article| Ok(article.published_at))
}

/// Timeline posts created within `window` of `now`
pub fn recent_posts(
    posts: Vec<TimelinePost>,
    window: Duration,
    now: DateTime<Utc>,
) -> Result<Vec<TimelinePost>, ParseError> {
    filter_recent(posts, window, now, |post| Ok(post.created_at))
}
