//! Unified error handling for the opskit library.
//!
//! This module provides an error hierarchy using `thiserror` for better
//! programmatic error handling and more informative error messages.
//!
//! ## Error Categories
//!
//! - [`ApiError`]: Errors from Azure DevOps / GitHub API interactions
//! - [`ConfigError`]: Errors from configuration loading and validation
//! - [`RemoteError`]: Errors from git remote inspection and dispatch
//!
//! ## Example
//!
//! ```rust,no_run
//! use opskit::error::{Error, ApiError};
//!
//! fn example() -> Result<(), Error> {
//!     // Errors are automatically converted via From trait
//!     Err(ApiError::Unauthorized)?;
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the opskit library.
#[derive(Error, Debug)]
pub enum Error {
    /// An error occurred while interacting with a remote service API.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// An error occurred while loading or validating configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An error occurred while inspecting a git remote.
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// A generic error for cases not covered by specific error types.
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Errors that can occur when interacting with the Azure DevOps or GitHub API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The API request was unauthorized (401).
    #[error("Unauthorized: invalid or expired token")]
    Unauthorized,

    /// The requested resource was not found (404).
    #[error("Resource not found: {resource}")]
    NotFound {
        /// Description of the resource that was not found.
        resource: String,
    },

    /// No variable group matched the given name.
    #[error("Variable group '{name}' not found; it must exist before a variable can be upserted")]
    GroupNotFound {
        /// The group name that was looked up.
        name: String,
    },

    /// A name lookup matched more than one variable group.
    #[error("Variable group name '{name}' is ambiguous: {count} groups matched")]
    AmbiguousGroup {
        /// The group name that was looked up.
        name: String,
        /// Number of groups that matched.
        count: usize,
    },

    /// The API returned an error response.
    #[error("API request failed with status {status}: {message}")]
    RequestFailed {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Failed to parse the API response.
    #[error("Failed to parse API response: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
    },

    /// A network error occurred.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The token could not be encoded into an HTTP header.
    #[error("Token is not a valid HTTP header value")]
    InvalidToken(#[from] reqwest::header::InvalidHeaderValue),

    /// The pull request cannot be completed because it has no merge source commit.
    #[error("Pull request {pr_id} has no last merge source commit")]
    NoMergeSourceCommit {
        /// The PR ID that lacks a merge source commit.
        pr_id: i32,
    },
}

impl ApiError {
    /// Translate an HTTP error status and response body into an [`ApiError`].
    ///
    /// 401 maps to [`ApiError::Unauthorized`], 404 to [`ApiError::NotFound`],
    /// everything else carries the status and the service's message verbatim.
    pub fn from_status(status: reqwest::StatusCode, resource: &str, body: String) -> Self {
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            404 => ApiError::NotFound {
                resource: resource.to_string(),
            },
            code => ApiError::RequestFailed {
                status: code,
                message: body,
            },
        }
    }
}

/// Errors that can occur during configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required configuration field is missing.
    #[error("{field} is required (set it in the config file or via the {env_var} env var)")]
    MissingRequired {
        /// Name of the missing field.
        field: String,
        /// Environment variable name for this field.
        env_var: String,
    },

    /// Failed to read the configuration file.
    #[error("Failed to read config file at {path}: {message}")]
    FileReadError {
        /// Path to the config file.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Failed to parse the configuration file.
    #[error("Failed to parse config file at {path}: {message}")]
    ParseError {
        /// Path to the config file.
        path: PathBuf,
        /// Parse error message.
        message: String,
    },

    /// An invalid value was provided for a configuration field.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        /// Name of the field with invalid value.
        field: String,
        /// Description of why the value is invalid.
        message: String,
    },
}

/// Errors that can occur while inspecting a git remote for dispatch.
#[derive(Error, Debug, Clone)]
pub enum RemoteError {
    /// The specified path is not a valid git repository.
    #[error("Not a valid git repository: {path}")]
    NotARepository {
        /// Path that was expected to be a repository.
        path: PathBuf,
    },

    /// The repository has no usable origin remote.
    #[error("Failed to read origin remote: {message}")]
    NoOriginRemote {
        /// Error message from git.
        message: String,
    },

    /// The remote URL does not belong to a supported host.
    #[error("Remote '{url}' is neither an Azure DevOps nor a GitHub repository")]
    UnsupportedHost {
        /// The remote URL that could not be classified.
        url: String,
    },
}

/// Type alias for Results using the library error type.
///
/// Note: This is not re-exported from the crate root to avoid shadowing `anyhow::Result`.
/// Use explicitly as `error::Result<T>` when needed.
pub type Result<T> = std::result::Result<T, Error>;
