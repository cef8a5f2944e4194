//! Twitter platform implementation
//!
//! Talks to the v1.1 REST API with OAuth 1.0a user credentials:
//! - `account/verify_credentials.json` to resolve the handle
//! - `statuses/user_timeline.json` for post history
//! - `statuses/update.json` to publish

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::credentials::Credentials;
use crate::error::{PlatformError, Result};
use crate::platforms::oauth;
use crate::platforms::Platform;
use crate::types::TimelinePost;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// API error code for "Status is a duplicate."
const DUPLICATE_STATUS_CODE: u32 = 187;
/// API error code for "Rate limit exceeded"
const RATE_LIMIT_CODE: u32 = 88;
/// API error codes for invalid or expired tokens
const AUTH_ERROR_CODES: &[u32] = &[32, 89, 135];

/// Twitter platform client
pub struct TwitterClient {
    client: Client,
    /// API root, e.g. "https://api.twitter.com/1.1"
    api_base: String,
    credentials: Credentials,
    /// Resolved by `authenticate`
    screen_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Account {
    screen_name: String,
}

#[derive(Debug, Deserialize)]
struct RawTweet {
    created_at: String,
    #[serde(default)]
    entities: RawEntities,
}

#[derive(Debug, Default, Deserialize)]
struct RawEntities {
    #[serde(default)]
    urls: Vec<RawUrl>,
}

#[derive(Debug, Deserialize)]
struct RawUrl {
    expanded_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusCreated {
    id_str: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrors {
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: u32,
    message: String,
}

impl TwitterClient {
    /// Create a client for the API rooted at `api_base`
    pub fn new(api_base: impl Into<String>, credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| PlatformError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            credentials,
            screen_name: None,
        })
    }

    /// The handle resolved by `authenticate`, if any
    pub fn screen_name(&self) -> Option<&str> {
        self.screen_name.as_deref()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    async fn get(&self, path: &str, query: &[(&str, &str)], context: &str) -> Result<String> {
        let url = self.endpoint(path);
        let auth = oauth::authorization_header(&self.credentials, "GET", &url, query)?;

        let full_url = if query.is_empty() {
            url
        } else {
            format!("{}?{}", url, encode_pairs(query))
        };

        let response = self
            .client
            .get(full_url)
            .header(AUTHORIZATION, auth)
            .send()
            .await
            .map_err(|e| map_transport_error(e, context))?;

        read_body(response, context).await
    }

    async fn post_form(&self, path: &str, form: &[(&str, &str)], context: &str) -> Result<String> {
        let url = self.endpoint(path);
        let auth = oauth::authorization_header(&self.credentials, "POST", &url, form)?;

        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, auth)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(encode_pairs(form))
            .send()
            .await
            .map_err(|e| map_transport_error(e, context))?;

        read_body(response, context).await
    }
}

#[async_trait]
impl Platform for TwitterClient {
    async fn authenticate(&mut self) -> Result<String> {
        let body = self
            .get("account/verify_credentials.json", &[], "verify credentials")
            .await?;
        let account: Account = decode(&body, "verify credentials")?;

        tracing::debug!("Authenticated as @{}", account.screen_name);
        self.screen_name = Some(account.screen_name.clone());
        Ok(account.screen_name)
    }

    async fn recent_posts(&self, count: u32) -> Result<Vec<TimelinePost>> {
        let screen_name = self.screen_name.as_deref().ok_or_else(|| {
            PlatformError::Authentication("Not authenticated".to_string())
        })?;

        let count = count.to_string();
        let body = self
            .get(
                "statuses/user_timeline.json",
                &[("screen_name", screen_name), ("count", count.as_str())],
                "user timeline",
            )
            .await?;
        let tweets: Vec<RawTweet> = decode(&body, "user timeline")?;

        let mut posts = Vec::with_capacity(tweets.len());
        for tweet in tweets {
            let urls = tweet
                .entities
                .urls
                .into_iter()
                .filter_map(|u| u.expanded_url)
                .collect();
            posts.push(TimelinePost::parse(&tweet.created_at, urls)?);
        }
        Ok(posts)
    }

    async fn post(&self, content: &str) -> Result<String> {
        let body = self
            .post_form("statuses/update.json", &[("status", content)], "post status")
            .await?;
        let created: StatusCreated = decode(&body, "post status")?;
        Ok(created.id_str)
    }

    fn name(&self) -> &str {
        "twitter"
    }
}

fn encode_pairs(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", oauth::encode(k), oauth::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

async fn read_body(response: reqwest::Response, context: &str) -> Result<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| map_transport_error(e, context))?;

    if status.is_success() {
        Ok(body)
    } else {
        Err(map_api_error(status, &body, context).into())
    }
}

fn decode<T: serde::de::DeserializeOwned>(body: &str, context: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| {
        PlatformError::Response(format!("Twitter response parse error ({}): {}", context, e))
            .into()
    })
}

fn map_transport_error(error: reqwest::Error, context: &str) -> PlatformError {
    PlatformError::Network(format!("Twitter request failed ({}): {}", context, error))
}

/// Map an unsuccessful API response to PlatformError
///
/// API error codes take precedence over the HTTP status, since the platform
/// reports duplicates and some auth failures under 403.
fn map_api_error(status: StatusCode, body: &str, context: &str) -> PlatformError {
    let errors = serde_json::from_str::<ApiErrors>(body)
        .unwrap_or_default()
        .errors;
    let detail = if errors.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        errors
            .iter()
            .map(|e| format!("{} (code {})", e.message, e.code))
            .collect::<Vec<_>>()
            .join("; ")
    };
    let has_code = |code: u32| errors.iter().any(|e| e.code == code);

    if has_code(DUPLICATE_STATUS_CODE) {
        return PlatformError::Duplicate(format!("Twitter ({}): {}", context, detail));
    }

    if status == StatusCode::TOO_MANY_REQUESTS || has_code(RATE_LIMIT_CODE) {
        return PlatformError::RateLimit(format!("Twitter ({}): {}", context, detail));
    }

    if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || AUTH_ERROR_CODES.iter().any(|c| has_code(*c))
    {
        return PlatformError::Authentication(format!(
            "Twitter authentication failed ({}): {}. \
                Suggestion: check the access token and consumer key in the credentials document.",
            context, detail
        ));
    }

    if status.is_server_error() {
        return PlatformError::Network(format!("Twitter server error ({}): {}", context, detail));
    }

    PlatformError::Posting(format!("Twitter ({}): {}", context, detail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedcastError;
    use wiremock::matchers::{body_string_contains, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> Credentials {
        Credentials::from_json(
            br#"{"ACCESS_TOKEN": "t", "ACCESS_SECRET": "s", "CONSUMER_KEY": "k", "CONSUMER_SECRET": "c"}"#,
        )
        .unwrap()
    }

    async fn authenticated_client(server: &MockServer) -> TwitterClient {
        Mock::given(method("GET"))
            .and(path("/1.1/account/verify_credentials.json"))
            .and(header_exists("authorization"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"screen_name": "blogbot", "id_str": "1"}"#),
            )
            .mount(server)
            .await;

        let mut client = TwitterClient::new(format!("{}/1.1", server.uri()), credentials()).unwrap();
        client.authenticate().await.unwrap();
        client
    }

    #[tokio::test]
    async fn test_authenticate_resolves_handle() {
        let server = MockServer::start().await;
        let client = authenticated_client(&server).await;
        assert_eq!(client.screen_name(), Some("blogbot"));
    }

    #[tokio::test]
    async fn test_recent_posts_requires_authentication() {
        let client = TwitterClient::new("https://api.example/1.1", credentials()).unwrap();
        let err = client.recent_posts(200).await.unwrap_err();
        assert!(matches!(
            err,
            FeedcastError::Platform(PlatformError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn test_recent_posts_decodes_timeline() {
        let server = MockServer::start().await;
        let client = authenticated_client(&server).await;

        Mock::given(method("GET"))
            .and(path("/1.1/statuses/user_timeline.json"))
            .and(query_param("screen_name", "blogbot"))
            .and(query_param("count", "200"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"[
                    {
                        "created_at": "Sat Jan 02 02:19:12 +0000 2021",
                        "text": "Post https://t.co/x",
                        "entities": {"urls": [
                            {"url": "https://t.co/x", "expanded_url": "https://blog.example/p1?spref=tw"},
                            {"url": "https://t.co/y", "expanded_url": null}
                        ]}
                    },
                    {"created_at": "Fri Jan 01 10:00:00 +0000 2021", "text": "no links"}
                ]"#,
            ))
            .mount(&server)
            .await;

        let posts = client.recent_posts(200).await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].entity_urls, vec!["https://blog.example/p1?spref=tw"]);
        assert!(posts[1].entity_urls.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_created_at_is_parse_error() {
        let server = MockServer::start().await;
        let client = authenticated_client(&server).await;

        Mock::given(method("GET"))
            .and(path("/1.1/statuses/user_timeline.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"[{"created_at": "2021-01-02 02:19:12"}]"#),
            )
            .mount(&server)
            .await;

        let err = client.recent_posts(200).await.unwrap_err();
        assert!(matches!(err, FeedcastError::Parse(_)));
    }

    #[tokio::test]
    async fn test_post_sends_encoded_status() {
        let server = MockServer::start().await;
        let client = authenticated_client(&server).await;

        Mock::given(method("POST"))
            .and(path("/1.1/statuses/update.json"))
            .and(body_string_contains(
                "status=New%20Post%20http%3A%2F%2Fblog.example%2Fp1%3Fspref%3Dtw",
            ))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"id_str": "1346000000000000000"}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let id = client
            .post("New Post http://blog.example/p1?spref=tw")
            .await
            .unwrap();
        assert_eq!(id, "1346000000000000000");
    }

    #[tokio::test]
    async fn test_duplicate_status_mapped() {
        let server = MockServer::start().await;
        let client = authenticated_client(&server).await;

        Mock::given(method("POST"))
            .and(path("/1.1/statuses/update.json"))
            .respond_with(ResponseTemplate::new(403).set_body_string(
                r#"{"errors": [{"code": 187, "message": "Status is a duplicate."}]}"#,
            ))
            .mount(&server)
            .await;

        let err = client.post("again").await.unwrap_err();
        assert!(matches!(
            err,
            FeedcastError::Platform(PlatformError::Duplicate(_))
        ));
        assert!(err.to_string().contains("Status is a duplicate."));
    }

    #[test]
    fn test_error_mapping_by_status() {
        assert!(matches!(
            map_api_error(StatusCode::TOO_MANY_REQUESTS, "", "post"),
            PlatformError::RateLimit(_)
        ));
        assert!(matches!(
            map_api_error(
                StatusCode::BAD_REQUEST,
                r#"{"errors": [{"code": 88, "message": "Rate limit exceeded"}]}"#,
                "post"
            ),
            PlatformError::RateLimit(_)
        ));
        assert!(matches!(
            map_api_error(StatusCode::UNAUTHORIZED, "", "post"),
            PlatformError::Authentication(_)
        ));
        assert!(matches!(
            map_api_error(StatusCode::BAD_GATEWAY, "<html>", "post"),
            PlatformError::Network(_)
        ));
        assert!(matches!(
            map_api_error(StatusCode::BAD_REQUEST, "{}", "post"),
            PlatformError::Posting(_)
        ));
    }
}
