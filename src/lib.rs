//! # opskit
//!
//! Typed clients and helpers for automating Azure DevOps and GitHub:
//!
//! - Azure DevOps REST API: projects, repositories, pull requests,
//!   work items, variable groups (including a read-merge-write upsert),
//!   and pipelines
//! - GitHub REST API v3: pull request approval and merging
//! - Remote-URL based dispatch between the two hosts
//! - Configuration from file, environment, and git remote detection
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use opskit::{AzureDevOpsClient, GroupRef};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AzureDevOpsClient::new("my-org", "my-project", "my-pat")?;
//!
//! // Ensure a variable exists in variable group 42 without touching its siblings
//! let outcome = client
//!     .upsert_variable(GroupRef::Id(42), "ApiUrl", "https://example.test", None)
//!     .await?;
//! println!("{} {}", outcome.action, outcome.variable);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod models;
pub mod net;
pub mod remote;

// Re-export commonly used types for convenience
pub use api::{AzureDevOpsClient, GitHubClient, GroupRef};
pub use config::{Config, ResolvedConfig};
pub use error::{ApiError, ConfigError, Error, RemoteError};
pub use models::{UpsertAction, VariableGroup, VariableUpsert, VariableValue};

/// Core result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
