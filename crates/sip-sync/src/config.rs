//! Sync configuration.
//!
//! Loaded from an optional YAML file, then overridden from the command line
//! and environment. The GitHub token is never read from the file; it is
//! handed to the collaborators explicitly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_GIT_HOST: &str = "https://github.com";
pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_COMMIT_MESSAGE: &str = "Update SIP states";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid repository '{0}', expected 'owner/repo' or 'owner/repo@branch'")]
    InvalidRepo(String),

    #[error("GitHub token is not set (use --github-token or GITHUB_TOKEN)")]
    MissingToken,

    #[error("{field} must be a relative path inside the repository, got '{}'", .path.display())]
    InvalidPath { field: &'static str, path: PathBuf },

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// A GitHub repository and the branch to work against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
    #[serde(default = "default_branch")]
    pub branch: String,
}

impl RepoRef {
    #[must_use]
    pub fn new(owner: impl Into<String>, name: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            branch: branch.into(),
        }
    }

    /// Parse `owner/repo` or `owner/repo@branch`.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let (slug, branch) = match s.split_once('@') {
            Some((slug, branch)) => (slug, branch),
            None => (s, DEFAULT_BRANCH),
        };

        let parts: Vec<&str> = slug.split('/').collect();
        match parts.as_slice() {
            [owner, name] if !owner.is_empty() && !name.is_empty() && !branch.is_empty() => {
                Ok(Self::new(*owner, *name, branch))
            }
            _ => Err(ConfigError::InvalidRepo(s.to_string())),
        }
    }

    /// `owner/repo`, as used in API paths.
    #[must_use]
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.owner, self.name, self.branch)
    }
}

impl FromStr for RepoRef {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// GitHub access token. Debug output never shows the value.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct GitHubToken(String);

impl GitHubToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for GitHubToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GitHubToken([REDACTED])")
    }
}

/// Everything a sync run needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    /// Repository holding merged proposals and the proposal pull requests.
    #[serde(default = "default_proposals_repo")]
    pub proposals_repo: RepoRef,

    /// Documentation website repository that receives the mirrored files.
    #[serde(default = "default_website_repo")]
    pub website_repo: RepoRef,

    /// Directory of merged proposals inside the proposals repository.
    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,

    /// Directory inside the website repository that is regenerated.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// GitHub REST API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Git host used to build clone URLs.
    #[serde(default = "default_git_host")]
    pub git_host: String,

    #[serde(default = "default_commit_message")]
    pub commit_message: String,

    #[serde(default = "default_author_name")]
    pub author_name: String,

    #[serde(default = "default_author_email")]
    pub author_email: String,

    /// Commit locally but never push.
    #[serde(default)]
    pub dry_run: bool,

    #[serde(skip)]
    pub github_token: GitHubToken,
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

fn default_proposals_repo() -> RepoRef {
    RepoRef::new("scala", "improvement-proposals", DEFAULT_BRANCH)
}

fn default_website_repo() -> RepoRef {
    RepoRef::new("scala", "docs.scala-lang", DEFAULT_BRANCH)
}

fn default_content_dir() -> PathBuf {
    PathBuf::from("content")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("_sips/sips")
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_git_host() -> String {
    DEFAULT_GIT_HOST.to_string()
}

fn default_commit_message() -> String {
    DEFAULT_COMMIT_MESSAGE.to_string()
}

fn default_author_name() -> String {
    "SIP Sync Bot".to_string()
}

fn default_author_email() -> String {
    "sip-sync@users.noreply.github.com".to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            proposals_repo: default_proposals_repo(),
            website_repo: default_website_repo(),
            content_dir: default_content_dir(),
            output_dir: default_output_dir(),
            api_url: default_api_url(),
            git_host: default_git_host(),
            commit_message: default_commit_message(),
            author_name: default_author_name(),
            author_email: default_author_email(),
            dry_run: false,
            github_token: GitHubToken::default(),
        }
    }
}

impl SyncConfig {
    /// Load configuration from a YAML file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Check the configuration before any clone, request or write happens.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.github_token.is_empty() {
            return Err(ConfigError::MissingToken);
        }

        for repo in [&self.proposals_repo, &self.website_repo] {
            if repo.owner.is_empty() || repo.name.is_empty() || repo.branch.is_empty() {
                return Err(ConfigError::InvalidRepo(repo.to_string()));
            }
        }

        validate_repo_path("contentDir", &self.content_dir)?;
        validate_repo_path("outputDir", &self.output_dir)?;

        if self.api_url.trim().is_empty() {
            return Err(ConfigError::Empty("apiUrl"));
        }
        if self.git_host.trim().is_empty() {
            return Err(ConfigError::Empty("gitHost"));
        }
        if self.commit_message.trim().is_empty() {
            return Err(ConfigError::Empty("commitMessage"));
        }

        Ok(())
    }
}

/// A path must name something strictly inside the repository and never pass
/// through a `.git` directory, since the output directory is deleted and
/// recreated on every run.
fn validate_repo_path(field: &'static str, path: &Path) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidPath {
        field,
        path: path.to_path_buf(),
    };

    let mut normal = 0;
    for component in path.components() {
        match component {
            Component::Normal(part) => {
                if part == ".git" {
                    return Err(invalid());
                }
                normal += 1;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(invalid());
            }
        }
    }

    if normal == 0 {
        return Err(invalid());
    }
    Ok(())
}
