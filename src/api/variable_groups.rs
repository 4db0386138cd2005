//! Variable group operations, including the read-merge-write upsert.
//!
//! Azure DevOps has no per-variable endpoint: a variable group is always
//! written as a whole. The upsert therefore fetches the full group, merges
//! one entry into the map in memory, and PUTs the complete body back. If
//! the read fails nothing is written, and variables not named in the call
//! are carried through untouched.
//!
//! Reads are project-scoped; creates and updates go through the
//! organization-scoped endpoint and must carry the project reference list.

use serde_json::json;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::azure::AzureDevOpsClient;
use crate::error::ApiError;
use crate::models::{
    ListEnvelope, ProjectReference, UpsertAction, VariableGroup, VariableGroupProjectReference,
    VariableUpsert, VariableValue,
};

const API_VERSION: &str = "api-version=7.1-preview.2";

/// How to address a variable group: by numeric id or by display name.
///
/// Name lookup must match exactly one group; zero matches and ambiguous
/// matches are both errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupRef {
    Id(i64),
    Name(String),
}

impl From<i64> for GroupRef {
    fn from(id: i64) -> Self {
        GroupRef::Id(id)
    }
}

impl From<&str> for GroupRef {
    fn from(name: &str) -> Self {
        GroupRef::Name(name.to_string())
    }
}

impl std::fmt::Display for GroupRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupRef::Id(id) => write!(f, "#{id}"),
            GroupRef::Name(name) => write!(f, "'{name}'"),
        }
    }
}

/// Merge one variable into a group's variable map.
///
/// Matching is case-sensitive. On update the prior secret flag is preserved
/// unless `secret` overrides it; on insert an unspecified flag defaults to
/// non-secret.
pub(crate) fn merge_variable(
    variables: &BTreeMap<String, VariableValue>,
    name: &str,
    value: &str,
    secret: Option<bool>,
) -> (BTreeMap<String, VariableValue>, UpsertAction) {
    let mut merged = variables.clone();
    let (is_secret, action) = match merged.get(name) {
        Some(existing) => (secret.unwrap_or(existing.is_secret), UpsertAction::Updated),
        None => (secret.unwrap_or(false), UpsertAction::Added),
    };
    merged.insert(
        name.to_string(),
        VariableValue {
            value: Some(value.to_string()),
            is_secret,
        },
    );
    (merged, action)
}

impl AzureDevOpsClient {
    /// Fetches a variable group by id.
    pub async fn get_variable_group(&self, group_id: i64) -> Result<VariableGroup, ApiError> {
        let url = self.project_url(&format!(
            "distributedtask/variablegroups/{group_id}?{API_VERSION}"
        ));
        self.get_json(&url, &format!("variable group {group_id}"))
            .await
    }

    /// Looks up a variable group by display name.
    ///
    /// Exactly one group must match; the service treats `groupName` as a
    /// filter and can return several.
    pub async fn find_variable_group(&self, name: &str) -> Result<VariableGroup, ApiError> {
        let encoded: String = url::form_urlencoded::byte_serialize(name.as_bytes()).collect();
        let url = self.project_url(&format!(
            "distributedtask/variablegroups?groupName={encoded}&{API_VERSION}"
        ));
        let envelope: ListEnvelope<VariableGroup> =
            self.get_json(&url, &format!("variable group '{name}'")).await?;

        let mut groups = envelope.value;
        match groups.len() {
            0 => Err(ApiError::GroupNotFound {
                name: name.to_string(),
            }),
            1 => Ok(groups.remove(0)),
            count => Err(ApiError::AmbiguousGroup {
                name: name.to_string(),
                count,
            }),
        }
    }

    /// Lists all variable groups in the project.
    pub async fn list_variable_groups(&self) -> Result<Vec<VariableGroup>, ApiError> {
        let url = self.project_url(&format!("distributedtask/variablegroups?{API_VERSION}"));
        let envelope: ListEnvelope<VariableGroup> =
            self.get_json(&url, "variable groups").await?;
        Ok(envelope.value)
    }

    /// Creates a variable group in the project.
    pub async fn create_variable_group(
        &self,
        name: &str,
        description: Option<&str>,
        variables: BTreeMap<String, VariableValue>,
    ) -> Result<VariableGroup, ApiError> {
        let url = format!(
            "{}/{}/_apis/distributedtask/variablegroups?{API_VERSION}",
            self.base_url, self.organization
        );
        let body = json!({
            "name": name,
            "description": description,
            "type": "Vsts",
            "variables": variables,
            "variableGroupProjectReferences": [{
                "name": name,
                "description": description,
                "projectReference": { "name": self.project }
            }]
        });
        debug!(url, name, "POST create variable group");
        let response = self.client.post(&url).json(&body).send().await?;
        let response = Self::check(response, &format!("variable group '{name}'")).await?;
        Ok(response.json().await?)
    }

    /// Replaces a variable group with the given state.
    ///
    /// The write is whole-body: whatever `group.variables` holds becomes the
    /// group's entire content.
    pub async fn update_variable_group(
        &self,
        group: &VariableGroup,
    ) -> Result<VariableGroup, ApiError> {
        let url = format!(
            "{}/{}/_apis/distributedtask/variablegroups/{}?{API_VERSION}",
            self.base_url, self.organization, group.id
        );

        // The org-scoped endpoint rejects a body without project references;
        // project-scoped GETs omit them, so backfill from our own scope.
        let mut group = group.clone();
        if group.project_references.is_empty() {
            group.project_references.push(VariableGroupProjectReference {
                project_reference: ProjectReference {
                    id: None,
                    name: Some(self.project.clone()),
                },
                name: Some(group.name.clone()),
                description: group.description.clone(),
            });
        }

        debug!(url, group = %group.name, "PUT variable group");
        let response = self.client.put(&url).json(&group).send().await?;
        let response =
            Self::check(response, &format!("variable group {}", group.id)).await?;
        Ok(response.json().await?)
    }

    async fn resolve_group(&self, group: &GroupRef) -> Result<VariableGroup, ApiError> {
        match group {
            GroupRef::Id(id) => self.get_variable_group(*id).await,
            GroupRef::Name(name) => self.find_variable_group(name).await,
        }
    }

    /// Inserts or replaces one variable in a group, leaving every other
    /// variable untouched.
    ///
    /// `secret: None` preserves the prior secret flag on update and defaults
    /// to non-secret on insert; `Some(flag)` forces the flag either way.
    /// Secret values are absent from the returned record and from logs.
    pub async fn upsert_variable(
        &self,
        group: impl Into<GroupRef>,
        name: &str,
        value: &str,
        secret: Option<bool>,
    ) -> Result<VariableUpsert, ApiError> {
        let group = group.into();
        let current = self.resolve_group(&group).await?;

        let (variables, action) = merge_variable(&current.variables, name, value, secret);
        let is_secret = variables[name].is_secret;

        let updated = VariableGroup {
            variables,
            ..current
        };
        let written = self.update_variable_group(&updated).await?;

        info!(
            group_id = written.id,
            group = %written.name,
            variable = name,
            action = %action,
            secret = is_secret,
            "variable upserted"
        );

        Ok(VariableUpsert {
            group_id: written.id,
            group_name: written.name,
            variable: name.to_string(),
            action,
            value: (!is_secret).then(|| value.to_string()),
        })
    }
}
