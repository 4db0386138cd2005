//! Host-agnostic pull request operations.
//!
//! Inspects a local repository's `origin` remote and routes the requested
//! operation to the matching API client: Azure DevOps repositories go
//! through [`AzureDevOpsClient`], GitHub repositories through
//! [`GitHubClient`]. The caller never names the host.

use secrecy::SecretString;
use std::path::Path;
use tracing::info;

use crate::api::{AzureDevOpsClient, GitHubClient, MergeMethod};
use crate::config::ResolvedConfig;
use crate::error::{ConfigError, Error};
use crate::remote::{self, Remote};

const AZURE_BASE_URL: &str = "https://dev.azure.com";
const GITHUB_BASE_URL: &str = "https://api.github.com";

/// Routes pull request operations to the host the repository lives on.
///
/// Credentials are optional per host; an operation fails with a config
/// error only when it actually needs the missing token.
pub struct Dispatcher {
    azure_pat: Option<SecretString>,
    github_token: Option<SecretString>,
    azure_base_url: String,
    github_base_url: String,
}

impl Dispatcher {
    pub fn new(azure_pat: Option<SecretString>, github_token: Option<SecretString>) -> Self {
        Self {
            azure_pat,
            github_token,
            azure_base_url: AZURE_BASE_URL.to_string(),
            github_base_url: GITHUB_BASE_URL.to_string(),
        }
    }

    /// Build a dispatcher from resolved configuration.
    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self::new(Some(config.pat.clone()), config.github_token.clone())
    }

    /// Override the Azure DevOps service root (for tests or on-prem servers).
    #[must_use]
    pub fn with_azure_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.azure_base_url = base_url.into();
        self
    }

    /// Override the GitHub API root.
    #[must_use]
    pub fn with_github_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.github_base_url = base_url.into();
        self
    }

    /// Approve the pull request on whichever host the repository's `origin`
    /// remote points at.
    pub async fn approve_pull_request<P: AsRef<Path>>(
        &self,
        repo_path: P,
        pr_number: u64,
    ) -> Result<(), Error> {
        match remote::detect(repo_path)? {
            Remote::AzureDevOps(azure) => {
                let client = self.azure_client(&azure.organization, &azure.project)?;
                info!(
                    organization = %azure.organization,
                    repository = %azure.repository,
                    pr_number,
                    "approving pull request on Azure DevOps"
                );
                client
                    .approve_pull_request(&azure.repository, i32::try_from(pr_number).unwrap_or(i32::MAX))
                    .await?;
            }
            Remote::GitHub(github) => {
                let client = self.github_client()?;
                info!(
                    owner = %github.owner,
                    repository = %github.repository,
                    pr_number,
                    "approving pull request on GitHub"
                );
                client
                    .approve_pull_request(&github.owner, &github.repository, pr_number, None)
                    .await?;
            }
        }
        Ok(())
    }

    /// Complete (merge) the pull request on whichever host the repository's
    /// `origin` remote points at.
    ///
    /// `delete_source_branch` only applies to Azure DevOps; GitHub's merge
    /// endpoint does not delete branches.
    pub async fn complete_pull_request<P: AsRef<Path>>(
        &self,
        repo_path: P,
        pr_number: u64,
        delete_source_branch: bool,
    ) -> Result<(), Error> {
        match remote::detect(repo_path)? {
            Remote::AzureDevOps(azure) => {
                let client = self.azure_client(&azure.organization, &azure.project)?;
                info!(
                    organization = %azure.organization,
                    repository = %azure.repository,
                    pr_number,
                    "completing pull request on Azure DevOps"
                );
                client
                    .complete_pull_request(
                        &azure.repository,
                        i32::try_from(pr_number).unwrap_or(i32::MAX),
                        delete_source_branch,
                    )
                    .await?;
            }
            Remote::GitHub(github) => {
                let client = self.github_client()?;
                info!(
                    owner = %github.owner,
                    repository = %github.repository,
                    pr_number,
                    "merging pull request on GitHub"
                );
                client
                    .merge_pull_request(
                        &github.owner,
                        &github.repository,
                        pr_number,
                        MergeMethod::Merge,
                    )
                    .await?;
            }
        }
        Ok(())
    }

    fn azure_client(
        &self,
        organization: &str,
        project: &str,
    ) -> Result<AzureDevOpsClient, Error> {
        let pat = self.azure_pat.as_ref().ok_or_else(|| {
            ConfigError::MissingRequired {
                field: "pat".to_string(),
                env_var: "OPSKIT_PAT".to_string(),
            }
        })?;
        Ok(AzureDevOpsClient::with_base_url(
            &self.azure_base_url,
            organization,
            project,
            pat,
        )?)
    }

    fn github_client(&self) -> Result<GitHubClient, Error> {
        let token = self.github_token.as_ref().ok_or_else(|| {
            ConfigError::MissingRequired {
                field: "github_token".to_string(),
                env_var: "OPSKIT_GITHUB_TOKEN".to_string(),
            }
        })?;
        Ok(GitHubClient::with_base_url(&self.github_base_url, token)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use std::process::Command;
    use tempfile::TempDir;

    fn git_repo_with_origin(url: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        let run = |args: &[&str]| {
            let status = Command::new("git")
                .current_dir(dir.path())
                .args(args)
                .status()
                .unwrap();
            assert!(status.success(), "git {args:?} failed");
        };
        run(&["init", "--quiet"]);
        run(&["remote", "add", "origin", url]);
        dir
    }

    /// # Dispatch by Remote URL
    ///
    /// Tests that an approve against a GitHub-hosted repo goes to the
    /// GitHub API.
    ///
    /// ## Test Scenario
    /// - Creates a local repo whose origin points at github.com
    /// - Dispatches an approve with the API root swapped for a mock server
    ///
    /// ## Expected Outcome
    /// - The GitHub review endpoint receives the request
    #[tokio::test]
    async fn test_approve_routes_to_github() {
        let repo = git_repo_with_origin("https://github.com/acme/widgets.git");
        let mut server = Server::new_async().await;
        let review = server
            .mock("POST", "/repos/acme/widgets/pulls/9/reviews")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 1, "state": "APPROVED"}"#)
            .create_async()
            .await;

        let dispatcher = Dispatcher::new(
            None,
            Some(SecretString::from("gh-token".to_string())),
        )
        .with_github_base_url(server.url());

        dispatcher
            .approve_pull_request(repo.path(), 9)
            .await
            .unwrap();
        review.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_routes_to_azure() {
        let repo =
            git_repo_with_origin("https://dev.azure.com/myorg/myproject/_git/myrepo");
        let mut server = Server::new_async().await;

        let _get = server
            .mock(
                "GET",
                "/myorg/myproject/_apis/git/repositories/myrepo/pullrequests/4?api-version=7.1",
            )
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"pullRequestId": 4, "title": "x", "status": "active",
                    "lastMergeSourceCommit": {"commitId": "abc"}}"#,
            )
            .create_async()
            .await;
        let patch = server
            .mock(
                "PATCH",
                "/myorg/myproject/_apis/git/repositories/myrepo/pullrequests/4?api-version=7.1",
            )
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"pullRequestId": 4, "title": "x", "status": "completed"}"#)
            .create_async()
            .await;

        let dispatcher = Dispatcher::new(
            Some(SecretString::from("azure-pat".to_string())),
            None,
        )
        .with_azure_base_url(server.url());

        dispatcher
            .complete_pull_request(repo.path(), 4, false)
            .await
            .unwrap();
        patch.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_token_for_detected_host() {
        let repo = git_repo_with_origin("https://github.com/acme/widgets.git");
        let dispatcher = Dispatcher::new(
            Some(SecretString::from("azure-pat".to_string())),
            None,
        );

        let err = dispatcher
            .approve_pull_request(repo.path(), 9)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::MissingRequired { .. })));
    }

    #[tokio::test]
    async fn test_unsupported_remote_host() {
        let repo = git_repo_with_origin("https://gitlab.com/acme/widgets.git");
        let dispatcher = Dispatcher::new(None, None);

        let err = dispatcher
            .approve_pull_request(repo.path(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Remote(_)));
    }
}
