//! Azure DevOps REST API client.
//!
//! A thin, typed wrapper over the documented REST surface (API versions
//! 7.0/7.1): projects, repositories, pull requests, work items, and
//! pipelines. Variable group operations live in
//! [`variable_groups`](super::variable_groups).
//!
//! Every operation is a single sequential request (or a short, fixed chain
//! of them); nothing is retried and nothing is cached.
//!
//! ## Example
//!
//! ```rust,no_run
//! use opskit::AzureDevOpsClient;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AzureDevOpsClient::new("my-org", "my-project", "my-pat")?;
//! let repos = client.list_repositories().await?;
//! println!("Found {} repositories", repos.len());
//! # Ok(())
//! # }
//! ```

use reqwest::{Client, Response};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::auth;
use crate::error::ApiError;
use crate::models::{
    ListEnvelope, NewPullRequest, Pipeline, PipelineRun, Project, PullRequest, Repository,
    WorkItem,
};

const DEFAULT_BASE_URL: &str = "https://dev.azure.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the Azure DevOps REST API, scoped to one organization and
/// project.
///
/// The PAT is folded into the client's default headers at construction time
/// and never stored in plaintext afterwards.
#[derive(Clone)]
pub struct AzureDevOpsClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) organization: String,
    pub(crate) project: String,
}

impl std::fmt::Debug for AzureDevOpsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureDevOpsClient")
            .field("base_url", &self.base_url)
            .field("organization", &self.organization)
            .field("project", &self.project)
            .finish_non_exhaustive()
    }
}

impl AzureDevOpsClient {
    /// Creates a new client for `https://dev.azure.com`.
    pub fn new(
        organization: impl Into<String>,
        project: impl Into<String>,
        pat: impl Into<String>,
    ) -> Result<Self, ApiError> {
        let pat = SecretString::from(pat.into());
        Self::with_base_url(DEFAULT_BASE_URL, organization, project, &pat)
    }

    /// Creates a new client from an already-wrapped PAT.
    pub fn new_with_secret(
        organization: impl Into<String>,
        project: impl Into<String>,
        pat: &SecretString,
    ) -> Result<Self, ApiError> {
        Self::with_base_url(DEFAULT_BASE_URL, organization, project, pat)
    }

    /// Creates a client against an alternative service root.
    ///
    /// Used by tests to point the client at a mock server; also useful for
    /// Azure DevOps Server installations with a non-standard host.
    pub fn with_base_url(
        base_url: impl Into<String>,
        organization: impl Into<String>,
        project: impl Into<String>,
        pat: &SecretString,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .default_headers(auth::azure_headers(pat)?)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Ok(Self {
            client,
            base_url,
            organization: organization.into(),
            project: project.into(),
        })
    }

    /// Returns the organization name.
    pub fn organization(&self) -> &str {
        &self.organization
    }

    /// Returns the project name.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Organization-scoped API URL (`{base}/{org}/_apis/...`).
    pub(crate) fn org_url(&self, path: &str) -> String {
        format!("{}/{}/_apis/{}", self.base_url, self.organization, path)
    }

    /// Project-scoped API URL (`{base}/{org}/{project}/_apis/...`).
    pub(crate) fn project_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}/_apis/{}",
            self.base_url, self.organization, self.project, path
        )
    }

    /// Translate an unsuccessful response into an [`ApiError`], attaching the
    /// service's message verbatim.
    pub(crate) async fn check(response: Response, resource: &str) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, resource, body))
    }

    pub(crate) async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        resource: &str,
    ) -> Result<T, ApiError> {
        debug!(url, "GET");
        let response = self.client.get(url).send().await?;
        let response = Self::check(response, resource).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ApiError::ParseError {
            message: format!("{resource}: {e}"),
        })
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    /// Lists all team projects in the organization.
    pub async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        let url = self.org_url("projects?api-version=7.1");
        let envelope: ListEnvelope<Project> = self.get_json(&url, "projects").await?;
        Ok(envelope.value)
    }

    /// Fetches a single project by name or id.
    pub async fn get_project(&self, name: &str) -> Result<Project, ApiError> {
        let url = self.org_url(&format!("projects/{name}?api-version=7.1"));
        self.get_json(&url, &format!("project '{name}'")).await
    }

    // -----------------------------------------------------------------------
    // Repositories
    // -----------------------------------------------------------------------

    /// Lists git repositories in the project.
    pub async fn list_repositories(&self) -> Result<Vec<Repository>, ApiError> {
        let url = self.project_url("git/repositories?api-version=7.1");
        let envelope: ListEnvelope<Repository> = self.get_json(&url, "repositories").await?;
        Ok(envelope.value)
    }

    /// Fetches a repository by name or id.
    pub async fn get_repository(&self, repository: &str) -> Result<Repository, ApiError> {
        let url = self.project_url(&format!("git/repositories/{repository}?api-version=7.1"));
        self.get_json(&url, &format!("repository '{repository}'"))
            .await
    }

    /// Creates an empty git repository in the project.
    pub async fn create_repository(&self, name: &str) -> Result<Repository, ApiError> {
        let url = self.project_url("git/repositories?api-version=7.1");
        debug!(url, name, "POST create repository");
        let response = self
            .client
            .post(&url)
            .json(&json!({ "name": name }))
            .send()
            .await?;
        let response = Self::check(response, &format!("repository '{name}'")).await?;
        Ok(response.json().await?)
    }

    // -----------------------------------------------------------------------
    // Pull requests
    // -----------------------------------------------------------------------

    /// Lists pull requests in a repository, optionally filtered by status
    /// (`active`, `completed`, `abandoned`, `all`) and target branch name.
    pub async fn list_pull_requests(
        &self,
        repository: &str,
        status: Option<&str>,
        target_branch: Option<&str>,
    ) -> Result<Vec<PullRequest>, ApiError> {
        let mut url = self.project_url(&format!(
            "git/repositories/{repository}/pullrequests?api-version=7.1"
        ));
        if let Some(status) = status {
            url.push_str(&format!("&searchCriteria.status={status}"));
        }
        if let Some(branch) = target_branch {
            url.push_str(&format!(
                "&searchCriteria.targetRefName=refs/heads/{branch}"
            ));
        }
        let envelope: ListEnvelope<PullRequest> = self.get_json(&url, "pull requests").await?;
        Ok(envelope.value)
    }

    /// Fetches a single pull request by id.
    pub async fn get_pull_request(
        &self,
        repository: &str,
        pr_id: i32,
    ) -> Result<PullRequest, ApiError> {
        let url = self.project_url(&format!(
            "git/repositories/{repository}/pullrequests/{pr_id}?api-version=7.1"
        ));
        self.get_json(&url, &format!("pull request {pr_id}")).await
    }

    /// Creates a pull request.
    pub async fn create_pull_request(
        &self,
        repository: &str,
        request: &NewPullRequest,
    ) -> Result<PullRequest, ApiError> {
        let url = self.project_url(&format!(
            "git/repositories/{repository}/pullrequests?api-version=7.1"
        ));
        debug!(url, title = %request.title, "POST create pull request");
        let response = self.client.post(&url).json(request).send().await?;
        let response = Self::check(response, "pull request").await?;
        Ok(response.json().await?)
    }

    /// Casts an "approved" vote (10) on a pull request as the authenticated
    /// user.
    ///
    /// Azure DevOps has no dedicated approve endpoint; the caller's identity
    /// is resolved through `connectionData` first and then added as a
    /// reviewer with the approving vote.
    pub async fn approve_pull_request(
        &self,
        repository: &str,
        pr_id: i32,
    ) -> Result<(), ApiError> {
        let me = self.authenticated_user_id().await?;
        let url = self.project_url(&format!(
            "git/repositories/{repository}/pullrequests/{pr_id}/reviewers/{me}?api-version=7.1"
        ));
        debug!(url, "PUT approve vote");
        let response = self
            .client
            .put(&url)
            .json(&json!({ "vote": 10 }))
            .send()
            .await?;
        Self::check(response, &format!("pull request {pr_id}")).await?;
        Ok(())
    }

    /// Completes (merges) a pull request.
    ///
    /// The completion PATCH requires the PR's last merge source commit, so
    /// this is a fixed GET-then-PATCH chain; the read failing aborts before
    /// any write is attempted.
    pub async fn complete_pull_request(
        &self,
        repository: &str,
        pr_id: i32,
        delete_source_branch: bool,
    ) -> Result<PullRequest, ApiError> {
        let pr = self.get_pull_request(repository, pr_id).await?;
        let commit = pr
            .last_merge_source_commit
            .ok_or(ApiError::NoMergeSourceCommit { pr_id })?;

        let url = self.project_url(&format!(
            "git/repositories/{repository}/pullrequests/{pr_id}?api-version=7.1"
        ));
        debug!(url, commit = %commit.commit_id, "PATCH complete pull request");
        let response = self
            .client
            .patch(&url)
            .json(&json!({
                "status": "completed",
                "lastMergeSourceCommit": { "commitId": commit.commit_id },
                "completionOptions": { "deleteSourceBranch": delete_source_branch }
            }))
            .send()
            .await?;
        let response = Self::check(response, &format!("pull request {pr_id}")).await?;
        Ok(response.json().await?)
    }

    async fn authenticated_user_id(&self) -> Result<String, ApiError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct ConnectionData {
            authenticated_user: AuthenticatedUser,
        }
        #[derive(Deserialize)]
        struct AuthenticatedUser {
            id: String,
        }

        let url = self.org_url("connectionData");
        let data: ConnectionData = self.get_json(&url, "connection data").await?;
        Ok(data.authenticated_user.id)
    }

    // -----------------------------------------------------------------------
    // Work items
    // -----------------------------------------------------------------------

    /// Fetches a work item by id.
    pub async fn get_work_item(&self, work_item_id: i32) -> Result<WorkItem, ApiError> {
        let url = self.project_url(&format!("wit/workitems/{work_item_id}?api-version=7.1"));
        self.get_json(&url, &format!("work item {work_item_id}"))
            .await
    }

    /// Updates a work item's state via a JSON-patch document.
    pub async fn set_work_item_state(
        &self,
        work_item_id: i32,
        new_state: &str,
    ) -> Result<WorkItem, ApiError> {
        let url = self.project_url(&format!("wit/workitems/{work_item_id}?api-version=7.1"));
        let patch = json!([
            { "op": "add", "path": "/fields/System.State", "value": new_state }
        ]);
        debug!(url, new_state, "PATCH work item state");
        let response = self
            .client
            .patch(&url)
            .header("Content-Type", "application/json-patch+json")
            .json(&patch)
            .send()
            .await?;
        let response = Self::check(response, &format!("work item {work_item_id}")).await?;
        Ok(response.json().await?)
    }

    // -----------------------------------------------------------------------
    // Pipelines
    // -----------------------------------------------------------------------

    /// Lists pipeline definitions in the project.
    pub async fn list_pipelines(&self) -> Result<Vec<Pipeline>, ApiError> {
        let url = self.project_url("pipelines?api-version=7.1");
        let envelope: ListEnvelope<Pipeline> = self.get_json(&url, "pipelines").await?;
        Ok(envelope.value)
    }

    /// Queues a run of the given pipeline, optionally on a specific branch.
    pub async fn run_pipeline(
        &self,
        pipeline_id: i32,
        branch: Option<&str>,
    ) -> Result<PipelineRun, ApiError> {
        let url = self.project_url(&format!("pipelines/{pipeline_id}/runs?api-version=7.1"));
        let body = match branch {
            Some(branch) => json!({
                "resources": {
                    "repositories": {
                        "self": { "refName": format!("refs/heads/{branch}") }
                    }
                }
            }),
            None => json!({}),
        };
        debug!(url, ?branch, "POST run pipeline");
        let response = self.client.post(&url).json(&body).send().await?;
        let response = Self::check(response, &format!("pipeline {pipeline_id}")).await?;
        Ok(response.json().await?)
    }
}
