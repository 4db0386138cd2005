//! Git remote inspection.
//!
//! Classifies a repository's `origin` remote URL as Azure DevOps or GitHub
//! so that higher-level operations can be dispatched to the right host.

use regex::Regex;
use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;

use crate::error::RemoteError;

/// Coordinates of an Azure DevOps repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureRemote {
    pub organization: String,
    pub project: String,
    pub repository: String,
}

/// Coordinates of a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubRemote {
    pub owner: String,
    pub repository: String,
}

/// A classified origin remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Remote {
    AzureDevOps(AzureRemote),
    GitHub(GitHubRemote),
}

// Static regex patterns compiled once using OnceLock
static AZURE_SSH_REGEX: OnceLock<Regex> = OnceLock::new();
static AZURE_SSH_LEGACY_REGEX: OnceLock<Regex> = OnceLock::new();
static AZURE_HTTPS_REGEX: OnceLock<Regex> = OnceLock::new();
static AZURE_LEGACY_REGEX: OnceLock<Regex> = OnceLock::new();
static GITHUB_SSH_REGEX: OnceLock<Regex> = OnceLock::new();
static GITHUB_HTTPS_REGEX: OnceLock<Regex> = OnceLock::new();

fn azure_ssh_regex() -> &'static Regex {
    AZURE_SSH_REGEX.get_or_init(|| {
        Regex::new(r"^[^@]+@ssh\.dev\.azure\.com:v3/([^/]+)/([^/]+)/([^/]+)/?$")
            .expect("Failed to compile Azure SSH regex")
    })
}

fn azure_ssh_legacy_regex() -> &'static Regex {
    AZURE_SSH_LEGACY_REGEX.get_or_init(|| {
        Regex::new(r"^[^@]+@vs-ssh\.visualstudio\.com:v3/([^/]+)/([^/]+)/([^/]+)/?$")
            .expect("Failed to compile Azure legacy SSH regex")
    })
}

fn azure_https_regex() -> &'static Regex {
    AZURE_HTTPS_REGEX.get_or_init(|| {
        Regex::new(r"^https://[^@]*@?dev\.azure\.com/([^/]+)/([^/]+)/_git/([^/]+)/?$")
            .expect("Failed to compile Azure HTTPS regex")
    })
}

fn azure_legacy_regex() -> &'static Regex {
    AZURE_LEGACY_REGEX.get_or_init(|| {
        Regex::new(r"^https://([^.]+)\.visualstudio\.com/([^/]+)/_git/([^/]+)/?$")
            .expect("Failed to compile Azure legacy HTTPS regex")
    })
}

fn github_ssh_regex() -> &'static Regex {
    GITHUB_SSH_REGEX.get_or_init(|| {
        Regex::new(r"^git@github\.com:([^/]+)/([^/]+?)(?:\.git)?/?$")
            .expect("Failed to compile GitHub SSH regex")
    })
}

fn github_https_regex() -> &'static Regex {
    GITHUB_HTTPS_REGEX.get_or_init(|| {
        Regex::new(r"^https://(?:[^@/]+@)?github\.com/([^/]+)/([^/]+?)(?:\.git)?/?$")
            .expect("Failed to compile GitHub HTTPS regex")
    })
}

/// Classify a remote URL as Azure DevOps or GitHub.
pub fn parse_remote_url(url: &str) -> Result<Remote, RemoteError> {
    for regex in [
        azure_ssh_regex(),
        azure_ssh_legacy_regex(),
        azure_https_regex(),
        azure_legacy_regex(),
    ] {
        if let Some(captures) = regex.captures(url) {
            return Ok(Remote::AzureDevOps(AzureRemote {
                organization: captures[1].to_string(),
                project: captures[2].to_string(),
                repository: captures[3].to_string(),
            }));
        }
    }

    for regex in [github_ssh_regex(), github_https_regex()] {
        if let Some(captures) = regex.captures(url) {
            return Ok(Remote::GitHub(GitHubRemote {
                owner: captures[1].to_string(),
                repository: captures[2].to_string(),
            }));
        }
    }

    Err(RemoteError::UnsupportedHost {
        url: url.to_string(),
    })
}

/// Read the `origin` remote URL from a local repository.
pub fn origin_url<P: AsRef<Path>>(repo_path: P) -> Result<String, RemoteError> {
    let repo_path = repo_path.as_ref();
    if !repo_path.is_dir() {
        return Err(RemoteError::NotARepository {
            path: repo_path.to_path_buf(),
        });
    }

    let output = Command::new("git")
        .current_dir(repo_path)
        .args(["remote", "get-url", "origin"])
        .output()
        .map_err(|e| RemoteError::NoOriginRemote {
            message: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(RemoteError::NoOriginRemote {
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Classify the `origin` remote of a local repository.
pub fn detect<P: AsRef<Path>>(repo_path: P) -> Result<Remote, RemoteError> {
    let url = origin_url(repo_path)?;
    parse_remote_url(&url)
}
