//! Mirrors SIP proposal state into the documentation website repository.
//!
//! This crate provides:
//! - Sync configuration (YAML file, CLI and environment overrides)
//! - A paginated GitHub REST client for proposal pull requests and labels
//! - Git clone/commit/push via the `git` binary
//! - The sync driver tying them to the `proposals` classifier and renderer

pub mod config;
pub mod git;
pub mod github;
pub mod sync;
pub mod workspace;

pub use config::{ConfigError, GitHubToken, RepoRef, SyncConfig};
pub use git::{GitCli, GitError, SourceControl};
pub use github::{GitHubClient, GitHubError, ProposalSource, PullRequest};
pub use sync::{RenderedProposal, SkippedProposal, SyncDriver, SyncError, SyncReport};
