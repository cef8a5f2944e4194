//! OAuth 1.0a request signing (HMAC-SHA1)

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use secrecy::ExposeSecret;
use sha1::Sha1;

use crate::credentials::Credentials;
use crate::error::{PlatformError, Result};

type HmacSha1 = Hmac<Sha1>;

const NONCE_LEN: usize = 32;

/// Build the `Authorization` header for a request
///
/// `params` are the query and form-body parameters of the request, unencoded.
pub fn authorization_header(
    credentials: &Credentials,
    method: &str,
    url: &str,
    params: &[(&str, &str)],
) -> Result<String> {
    let nonce: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect();
    let timestamp = chrono::Utc::now().timestamp().to_string();

    header_with(credentials, method, url, params, &nonce, &timestamp)
}

fn header_with(
    credentials: &Credentials,
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    nonce: &str,
    timestamp: &str,
) -> Result<String> {
    let mut oauth_params = vec![
        ("oauth_consumer_key", credentials.consumer_key.expose_secret()),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp),
        ("oauth_token", credentials.access_token.expose_secret()),
        ("oauth_version", "1.0"),
    ];

    let mut all_params = oauth_params.clone();
    all_params.extend_from_slice(params);

    let signature = sign(
        credentials.consumer_secret.expose_secret(),
        credentials.access_secret.expose_secret(),
        method,
        url,
        &all_params,
    )?;
    oauth_params.push(("oauth_signature", signature.as_str()));
    oauth_params.sort();

    let fields: Vec<String> = oauth_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect();
    Ok(format!("OAuth {}", fields.join(", ")))
}

/// Compute the base64 HMAC-SHA1 signature of a request
pub fn sign(
    consumer_secret: &str,
    token_secret: &str,
    method: &str,
    url: &str,
    params: &[(&str, &str)],
) -> Result<String> {
    let base = signature_base(method, url, params);
    let key = format!("{}&{}", encode(consumer_secret), encode(token_secret));

    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| PlatformError::Authentication(format!("Invalid signing key: {}", e)))?;
    mac.update(base.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

fn signature_base(method: &str, url: &str, params: &[(&str, &str)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(url),
        encode(&param_string)
    )
}

/// RFC 3986 percent-encoding: everything except `A-Za-z0-9-._~`
pub fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
