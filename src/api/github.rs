//! GitHub REST API v3 client.
//!
//! Covers the pull request surface the dispatch layer needs: fetch,
//! approve (a review with event `APPROVE`), and merge.

use reqwest::Client;
use secrecy::SecretString;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::auth;
use crate::error::ApiError;
use crate::models::{GhMergeResult, GhPullRequest, GhReview};

const DEFAULT_BASE_URL: &str = "https://api.github.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Merge strategy for [`GitHubClient::merge_pull_request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeMethod {
    #[default]
    Merge,
    Squash,
    Rebase,
}

impl MergeMethod {
    fn as_str(self) -> &'static str {
        match self {
            MergeMethod::Merge => "merge",
            MergeMethod::Squash => "squash",
            MergeMethod::Rebase => "rebase",
        }
    }
}

/// Client for the GitHub v3 API.
///
/// Not bound to a repository; every call names its owner and repo.
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: String,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    /// Creates a new client for `https://api.github.com`.
    pub fn new(token: impl Into<String>) -> Result<Self, ApiError> {
        let token = SecretString::from(token.into());
        Self::with_base_url(DEFAULT_BASE_URL, &token)
    }

    /// Creates a new client from an already-wrapped token.
    pub fn new_with_secret(token: &SecretString) -> Result<Self, ApiError> {
        Self::with_base_url(DEFAULT_BASE_URL, token)
    }

    /// Creates a client against an alternative API root (GitHub Enterprise,
    /// or a mock server in tests).
    pub fn with_base_url(
        base_url: impl Into<String>,
        token: &SecretString,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .default_headers(auth::github_headers(token)?)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Ok(Self { client, base_url })
    }

    fn pr_url(&self, owner: &str, repo: &str, number: u64, suffix: &str) -> String {
        format!("{}/repos/{owner}/{repo}/pulls/{number}{suffix}", self.base_url)
    }

    /// Fetches a pull request.
    pub async fn get_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<GhPullRequest, ApiError> {
        let url = self.pr_url(owner, repo, number, "");
        debug!(url, "GET");
        let response = self.client.get(&url).send().await?;
        let response =
            check(response, &format!("pull request {owner}/{repo}#{number}"))
                .await?;
        Ok(response.json().await?)
    }

    /// Approves a pull request by posting a review with event `APPROVE`.
    pub async fn approve_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        body: Option<&str>,
    ) -> Result<GhReview, ApiError> {
        let url = self.pr_url(owner, repo, number, "/reviews");
        let mut payload = json!({ "event": "APPROVE" });
        if let Some(body) = body {
            payload["body"] = json!(body);
        }
        debug!(url, "POST approve review");
        let response = self.client.post(&url).json(&payload).send().await?;
        let response =
            check(response, &format!("pull request {owner}/{repo}#{number}"))
                .await?;
        Ok(response.json().await?)
    }

    /// Merges a pull request.
    pub async fn merge_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        method: MergeMethod,
    ) -> Result<GhMergeResult, ApiError> {
        let url = self.pr_url(owner, repo, number, "/merge");
        debug!(url, method = method.as_str(), "PUT merge");
        let response = self
            .client
            .put(&url)
            .json(&json!({ "merge_method": method.as_str() }))
            .send()
            .await?;
        let response =
            check(response, &format!("pull request {owner}/{repo}#{number}"))
                .await?;
        Ok(response.json().await?)
    }
}

async fn check(
    response: reqwest::Response,
    resource: &str,
) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::from_status(status, resource, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn test_client(base_url: &str) -> GitHubClient {
        let token = SecretString::from("gh-token".to_string());
        GitHubClient::with_base_url(base_url, &token).unwrap()
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let client = test_client("http://localhost:9999");
        assert!(!format!("{client:?}").contains("gh-token"));
    }

    #[tokio::test]
    async fn test_approve_posts_review() {
        let mut server = Server::new_async().await;
        let review = server
            .mock("POST", "/repos/acme/app/pulls/7/reviews")
            .match_header("authorization", "Bearer gh-token")
            .match_header("accept", "application/vnd.github.v3+json")
            .match_body(mockito::Matcher::Json(json!({ "event": "APPROVE" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "id": 555, "state": "APPROVED" }).to_string())
            .create_async()
            .await;

        let client = test_client(&server.url());
        let result = client
            .approve_pull_request("acme", "app", 7, None)
            .await
            .unwrap();
        assert_eq!(result.id, 555);
        review.assert_async().await;
    }

    #[tokio::test]
    async fn test_merge_sends_method() {
        let mut server = Server::new_async().await;
        let merge = server
            .mock("PUT", "/repos/acme/app/pulls/7/merge")
            .match_body(mockito::Matcher::Json(json!({ "merge_method": "squash" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({ "merged": true, "message": "Pull Request successfully merged", "sha": "abc" })
                    .to_string(),
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        let result = client
            .merge_pull_request("acme", "app", 7, MergeMethod::Squash)
            .await
            .unwrap();
        assert!(result.merged);
        merge.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_pull_request() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/repos/acme/app/pulls/404")
            .with_status(404)
            .with_body(r#"{"message": "Not Found"}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client
            .get_pull_request("acme", "app", 404)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
    }
}
