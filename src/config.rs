//! Configuration management.
//!
//! Configuration is assembled from multiple sources:
//! - TOML configuration files following the XDG Base Directory specification
//! - Environment variables (`OPSKIT_*`)
//! - Git remote detection for repositories hosted on Azure DevOps or GitHub
//!
//! ## Example
//!
//! ```rust,no_run
//! use opskit::Config;
//!
//! # fn main() -> Result<(), opskit::ConfigError> {
//! let file = Config::load_from_file()?;
//! let env = Config::load_from_env();
//!
//! // Env takes precedence over file values
//! let resolved = file.merge(env).resolve()?;
//! println!("Organization: {}", resolved.organization);
//! # Ok(())
//! # }
//! ```

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::remote::{self, Remote};

/// Partial configuration, any field may still be missing.
///
/// Merge the sources you care about, then call [`Config::resolve`] to
/// validate that everything required is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Azure DevOps organization name.
    pub organization: Option<String>,
    /// Azure DevOps project name.
    pub project: Option<String>,
    /// Default repository name.
    pub repository: Option<String>,
    /// Personal access token for Azure DevOps.
    pub pat: Option<String>,
    /// Token for the GitHub API (only needed for GitHub-hosted repos).
    pub github_token: Option<String>,
}

/// Fully validated configuration, ready to construct clients from.
///
/// Tokens are wrapped so they never show up in Debug output or logs.
#[derive(Debug)]
pub struct ResolvedConfig {
    pub organization: String,
    pub project: String,
    pub repository: Option<String>,
    pub pat: SecretString,
    pub github_token: Option<SecretString>,
}

impl Config {
    /// Load configuration from the XDG config directory.
    ///
    /// A missing file is not an error; it yields an empty config.
    #[must_use = "this returns the loaded configuration which should be used"]
    pub fn load_from_file() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content =
            fs::read_to_string(&config_path).map_err(|e| ConfigError::FileReadError {
                path: config_path.clone(),
                message: e.to_string(),
            })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: config_path,
            message: e.to_string(),
        })
    }

    /// Load configuration from `OPSKIT_*` environment variables.
    pub fn load_from_env() -> Self {
        Self {
            organization: std::env::var("OPSKIT_ORGANIZATION").ok(),
            project: std::env::var("OPSKIT_PROJECT").ok(),
            repository: std::env::var("OPSKIT_REPOSITORY").ok(),
            pat: std::env::var("OPSKIT_PAT").ok(),
            github_token: std::env::var("OPSKIT_GITHUB_TOKEN").ok(),
        }
    }

    /// Detect organization, project, and repository from a local repository's
    /// `origin` remote.
    ///
    /// GitHub remotes map the owner onto `organization` and leave `project`
    /// unset. Detection failures yield an empty config rather than an error.
    pub fn detect_from_git_remote<P: AsRef<std::path::Path>>(repo_path: P) -> Self {
        match remote::detect(repo_path) {
            Ok(Remote::AzureDevOps(azure)) => Self {
                organization: Some(azure.organization),
                project: Some(azure.project),
                repository: Some(azure.repository),
                ..Self::default()
            },
            Ok(Remote::GitHub(github)) => Self {
                organization: Some(github.owner),
                repository: Some(github.repository),
                ..Self::default()
            },
            Err(_) => Self::default(),
        }
    }

    /// Merge this config with another, preferring values from `other` when
    /// they exist.
    pub fn merge(self, other: Self) -> Self {
        Self {
            organization: other.organization.or(self.organization),
            project: other.project.or(self.project),
            repository: other.repository.or(self.repository),
            pat: other.pat.or(self.pat),
            github_token: other.github_token.or(self.github_token),
        }
    }

    /// Validate that required fields are present and wrap the tokens.
    pub fn resolve(self) -> Result<ResolvedConfig, ConfigError> {
        let organization = self.organization.ok_or_else(|| missing("organization"))?;
        let project = self.project.ok_or_else(|| missing("project"))?;
        let pat = self.pat.ok_or_else(|| missing("pat"))?;

        Ok(ResolvedConfig {
            organization,
            project,
            repository: self.repository,
            pat: SecretString::from(pat),
            github_token: self.github_token.map(SecretString::from),
        })
    }

    /// The XDG config file path (`$XDG_CONFIG_HOME/opskit/config.toml`).
    fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|_| {
                dirs::home_dir()
                    .map(|home| home.join(".config"))
                    .ok_or_else(|| ConfigError::InvalidValue {
                        field: "config path".to_string(),
                        message: "could not determine home directory".to_string(),
                    })
            })?;

        Ok(config_dir.join("opskit").join("config.toml"))
    }
}

fn missing(field: &str) -> ConfigError {
    ConfigError::MissingRequired {
        field: field.to_string(),
        env_var: format!("OPSKIT_{}", field.to_uppercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::file_serial;
    use std::env;
    use tempfile::TempDir;

    fn clear_env() {
        unsafe {
            env::remove_var("OPSKIT_ORGANIZATION");
            env::remove_var("OPSKIT_PROJECT");
            env::remove_var("OPSKIT_REPOSITORY");
            env::remove_var("OPSKIT_PAT");
            env::remove_var("OPSKIT_GITHUB_TOKEN");
        }
    }

    /// # Config Default Values
    ///
    /// Tests that the default configuration is empty.
    ///
    /// ## Test Scenario
    /// - Creates a default Config instance
    ///
    /// ## Expected Outcome
    /// - Every field is None; nothing is assumed
    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config, Config::default());
        assert!(config.organization.is_none());
        assert!(config.project.is_none());
        assert!(config.repository.is_none());
        assert!(config.pat.is_none());
        assert!(config.github_token.is_none());
    }

    /// # Load Config from Environment Variables
    ///
    /// Tests loading configuration when environment variables are present.
    ///
    /// ## Test Scenario
    /// - Sets OPSKIT_* environment variables
    /// - Loads configuration from environment
    ///
    /// ## Expected Outcome
    /// - Configuration reflects all provided environment values
    #[test]
    #[file_serial(env_tests)]
    fn test_load_from_env() {
        unsafe {
            env::set_var("OPSKIT_ORGANIZATION", "test-org");
            env::set_var("OPSKIT_PROJECT", "test-project");
            env::set_var("OPSKIT_PAT", "test-pat");
        }

        let config = Config::load_from_env();
        assert_eq!(config.organization.as_deref(), Some("test-org"));
        assert_eq!(config.project.as_deref(), Some("test-project"));
        assert_eq!(config.pat.as_deref(), Some("test-pat"));

        clear_env();
    }

    #[test]
    #[file_serial(env_tests)]
    fn test_load_from_env_no_variables() {
        clear_env();
        let config = Config::load_from_env();
        assert_eq!(config, Config::default());
    }

    /// # Config Merge (Other Takes Precedence)
    ///
    /// Tests configuration merging where the other config takes precedence.
    ///
    /// ## Test Scenario
    /// - Creates base and override configurations
    /// - Merges them
    ///
    /// ## Expected Outcome
    /// - Override values replace base values; base fills the gaps
    #[test]
    fn test_config_merge_other_takes_precedence() {
        let base = Config {
            organization: Some("base-org".to_string()),
            project: Some("base-project".to_string()),
            repository: None,
            pat: Some("base-pat".to_string()),
            github_token: None,
        };
        let other = Config {
            organization: Some("other-org".to_string()),
            project: None,
            repository: Some("other-repo".to_string()),
            pat: None,
            github_token: Some("gh".to_string()),
        };

        let merged = base.merge(other);
        assert_eq!(merged.organization.as_deref(), Some("other-org"));
        assert_eq!(merged.project.as_deref(), Some("base-project"));
        assert_eq!(merged.repository.as_deref(), Some("other-repo"));
        assert_eq!(merged.pat.as_deref(), Some("base-pat"));
        assert_eq!(merged.github_token.as_deref(), Some("gh"));
    }

    /// # Load Config from File (Valid TOML)
    ///
    /// Tests loading configuration from a valid TOML file.
    ///
    /// ## Test Scenario
    /// - Writes a config file under a temporary XDG_CONFIG_HOME
    /// - Loads configuration from the file
    ///
    /// ## Expected Outcome
    /// - All values are loaded from the file
    #[test]
    #[file_serial(env_tests)]
    fn test_load_from_file_valid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_dir = temp_dir.path().join("opskit");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(
            config_dir.join("config.toml"),
            r#"
organization = "file-org"
project = "file-project"
repository = "file-repo"
"#,
        )
        .unwrap();

        let original_xdg = env::var("XDG_CONFIG_HOME").ok();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", temp_dir.path());
        }

        let result = Config::load_from_file();

        match original_xdg {
            Some(val) => unsafe { env::set_var("XDG_CONFIG_HOME", val) },
            None => unsafe { env::remove_var("XDG_CONFIG_HOME") },
        }

        let config = result.unwrap();
        assert_eq!(config.organization.as_deref(), Some("file-org"));
        assert_eq!(config.project.as_deref(), Some("file-project"));
        assert_eq!(config.repository.as_deref(), Some("file-repo"));
        assert!(config.pat.is_none());
    }

    #[test]
    #[file_serial(env_tests)]
    fn test_load_from_file_missing_file_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let original_xdg = env::var("XDG_CONFIG_HOME").ok();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", temp_dir.path());
        }

        let result = Config::load_from_file();

        match original_xdg {
            Some(val) => unsafe { env::set_var("XDG_CONFIG_HOME", val) },
            None => unsafe { env::remove_var("XDG_CONFIG_HOME") },
        }

        assert_eq!(result.unwrap(), Config::default());
    }

    #[test]
    #[file_serial(env_tests)]
    fn test_load_from_file_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_dir = temp_dir.path().join("opskit");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join("config.toml"), "organization = [broken").unwrap();

        let original_xdg = env::var("XDG_CONFIG_HOME").ok();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", temp_dir.path());
        }

        let result = Config::load_from_file();

        match original_xdg {
            Some(val) => unsafe { env::set_var("XDG_CONFIG_HOME", val) },
            None => unsafe { env::remove_var("XDG_CONFIG_HOME") },
        }

        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    /// # Resolve Validation
    ///
    /// Tests that resolve() rejects incomplete configurations.
    ///
    /// ## Test Scenario
    /// - Resolves configs with and without required fields
    ///
    /// ## Expected Outcome
    /// - Missing fields produce MissingRequired naming the env var
    /// - Complete configs resolve and wrap the tokens
    #[test]
    fn test_resolve_requires_core_fields() {
        let err = Config::default().resolve().unwrap_err();
        match err {
            ConfigError::MissingRequired { field, env_var } => {
                assert_eq!(field, "organization");
                assert_eq!(env_var, "OPSKIT_ORGANIZATION");
            }
            other => panic!("unexpected error: {other}"),
        }

        let resolved = Config {
            organization: Some("org".to_string()),
            project: Some("proj".to_string()),
            repository: None,
            pat: Some("secret-pat".to_string()),
            github_token: None,
        }
        .resolve()
        .unwrap();

        assert_eq!(resolved.organization, "org");
        // SecretString's Debug hides the value
        assert!(!format!("{resolved:?}").contains("secret-pat"));
    }

    #[test]
    fn test_detect_from_git_remote_returns_default_on_error() {
        let config = Config::detect_from_git_remote("/non/existent/path");
        assert_eq!(config, Config::default());
    }
}
