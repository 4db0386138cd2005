//! Authentication header builders.
//!
//! Azure DevOps accepts a Personal Access Token through Basic auth with an
//! empty username (`Authorization: Basic base64(":" + PAT)`); GitHub uses a
//! plain bearer token. Both builders mark the resulting header as sensitive
//! so reqwest never logs it.

use base64::Engine;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use secrecy::{ExposeSecret, SecretString};

use crate::error::ApiError;

const USER_AGENT_VALUE: &str = concat!("opskit/", env!("CARGO_PKG_VERSION"));

/// Build the Basic auth header value for an Azure DevOps PAT.
pub(crate) fn basic_pat_header(pat: &SecretString) -> Result<HeaderValue, ApiError> {
    let encoded =
        base64::engine::general_purpose::STANDARD.encode(format!(":{}", pat.expose_secret()));
    let mut value = HeaderValue::from_str(&format!("Basic {encoded}"))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Default header map for an Azure DevOps client.
pub(crate) fn azure_headers(pat: &SecretString) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, basic_pat_header(pat)?);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// Default header map for a GitHub client.
pub(crate) fn github_headers(token: &SecretString) -> Result<HeaderMap, ApiError> {
    let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);
    headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github.v3+json"));
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
    Ok(headers)
}
