//! Typed records for the Azure DevOps and GitHub wire formats.
//!
//! The upstream services speak JSON with camelCase keys (and `System.*`
//! field names for work items); everything the library exposes is an
//! explicit struct rather than an ad hoc property bag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Envelope for Azure DevOps list responses (`{ "count": n, "value": [...] }`).
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListEnvelope<T> {
    pub value: Vec<T>,
    #[serde(default)]
    #[allow(dead_code)]
    pub count: Option<i64>,
}

/// An Azure DevOps team project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// An Azure DevOps git repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub ssh_url: Option<String>,
    #[serde(default)]
    pub remote_url: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
}

/// A user reference as returned by Azure DevOps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRef {
    pub display_name: String,
    #[serde(default)]
    pub unique_name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

/// A commit reference attached to a pull request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitCommitRef {
    pub commit_id: String,
}

/// An Azure DevOps pull request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    #[serde(rename = "pullRequestId")]
    pub id: i32,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source_ref_name: Option<String>,
    #[serde(default)]
    pub target_ref_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_by: Option<IdentityRef>,
    #[serde(default)]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_merge_source_commit: Option<GitCommitRef>,
}

/// Request body for creating a pull request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPullRequest {
    pub source_ref_name: String,
    pub target_ref_name: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Work item fields the library cares about; the service exposes many more.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkItemFields {
    #[serde(rename = "System.Title", default)]
    pub title: Option<String>,
    #[serde(rename = "System.State", default)]
    pub state: Option<String>,
    #[serde(rename = "System.WorkItemType", default)]
    pub work_item_type: Option<String>,
    #[serde(rename = "System.AssignedTo", default)]
    pub assigned_to: Option<IdentityRef>,
    #[serde(rename = "System.IterationPath", default)]
    pub iteration_path: Option<String>,
}

/// An Azure DevOps work item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: i32,
    pub fields: WorkItemFields,
}

/// An Azure DevOps pipeline definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub folder: Option<String>,
}

/// A queued or running pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRun {
    pub id: i32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub url: Option<String>,
}

// ---------------------------------------------------------------------------
// Variable groups
// ---------------------------------------------------------------------------

/// A single value inside a variable group.
///
/// The service returns `value: null` for secret variables; the flag is what
/// marks them, not the missing value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableValue {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub is_secret: bool,
}

impl VariableValue {
    /// A plain, non-secret variable value.
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            is_secret: false,
        }
    }

    /// A secret variable value (masked by the service on read).
    pub fn secret(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            is_secret: true,
        }
    }
}

/// Reference to the project a variable group is shared with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectReference {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Per-project reference entry carried on a variable group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableGroupProjectReference {
    pub project_reference: ProjectReference,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// An Azure DevOps variable group.
///
/// The client only ever holds a transient copy fetched via GET; the service
/// owns the authoritative state, and writes replace the entire variable map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableGroup {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default = "default_group_type")]
    pub group_type: String,
    #[serde(default)]
    pub variables: BTreeMap<String, VariableValue>,
    #[serde(rename = "variableGroupProjectReferences", default)]
    pub project_references: Vec<VariableGroupProjectReference>,
}

fn default_group_type() -> String {
    "Vsts".to_string()
}

/// Whether an upsert inserted a new variable or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpsertAction {
    Added,
    Updated,
}

impl std::fmt::Display for UpsertAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpsertAction::Added => write!(f, "Added"),
            UpsertAction::Updated => write!(f, "Updated"),
        }
    }
}

/// Result record of a variable upsert.
///
/// `value` is `None` whenever the variable is secret so that callers can log
/// the outcome without leaking the plaintext.
#[derive(Debug, Clone, Serialize)]
pub struct VariableUpsert {
    pub group_id: i64,
    pub group_name: String,
    pub variable: String,
    pub action: UpsertAction,
    pub value: Option<String>,
}

// ---------------------------------------------------------------------------
// GitHub
// ---------------------------------------------------------------------------

/// Head/base reference on a GitHub pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct GhRef {
    pub sha: String,
    #[serde(rename = "ref")]
    pub ref_name: Option<String>,
}

/// A GitHub pull request (the fields this library consumes).
#[derive(Debug, Clone, Deserialize)]
pub struct GhPullRequest {
    pub number: u64,
    #[serde(default)]
    pub title: Option<String>,
    pub state: String,
    #[serde(default)]
    pub merged: Option<bool>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub head: Option<GhRef>,
}

/// A review posted on a GitHub pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct GhReview {
    pub id: u64,
    #[serde(default)]
    pub state: Option<String>,
}

/// Result of merging a GitHub pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct GhMergeResult {
    pub merged: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub sha: Option<String>,
}
