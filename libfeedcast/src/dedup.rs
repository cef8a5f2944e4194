//! Duplicate detection against the account's recent timeline

use crate::types::TimelinePost;

/// Collect every entity URL that contains `domain_marker`
///
/// URLs keep post order, then in-post order. Repeats across posts are kept;
/// callers treat the result as a membership set.
pub fn extract_posted_links(posts: &[TimelinePost], domain_marker: &str) -> Vec<String> {
    posts
        .iter()
        .flat_map(|post| post.entity_urls.iter())
        .filter(|url| url.contains(domain_marker))
        .cloned()
        .collect()
}

/// Append `suffix` to `link` unless it already ends with it
///
/// The platform rewrites shared blog links with a tracking suffix, so the
/// article link must carry it to compare equal to timeline URLs.
pub fn normalize_link(link: &str, suffix: &str) -> String {
    if link.ends_with(suffix) {
        link.to_string()
    } else {
        format!("{link}{suffix}")
    }
}
