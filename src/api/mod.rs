//! HTTP clients for the supported hosts.
//!
//! - [`AzureDevOpsClient`]: projects, repositories, pull requests, work
//!   items, pipelines, and variable groups
//! - [`GitHubClient`]: pull request approval and merging via the v3 API
//!
//! Both clients accept an alternative base URL so tests can run against a
//! local mock server.

mod auth;
mod azure;
mod github;
mod variable_groups;

pub use azure::AzureDevOpsClient;
pub use github::{GitHubClient, MergeMethod};
pub use variable_groups::GroupRef;
