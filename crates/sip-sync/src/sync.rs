//! Sync driver - mirrors proposal state into the website repository.
//!
//! One run: clone both repositories into a scoped temporary directory,
//! regenerate the output directory (merged proposals copied verbatim, open
//! and rejected/withdrawn pull requests rendered from their labels), then
//! commit and push if anything changed.

use proposals::{
    classify_detailed, proposal_file_name, render_document, Classification, Frontmatter,
    RenderError,
};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::git::{GitError, SourceControl};
use crate::github::{GitHubError, ProposalSource, PullRequest};
use crate::workspace::{self, FsError};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("Failed to render pull request #{number}: {source}")]
    Render {
        number: u64,
        #[source]
        source: RenderError,
    },

    #[error("Failed to create working directory: {0}")]
    WorkDir(#[source] std::io::Error),
}

/// A pull request written to the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedProposal {
    pub number: u64,
    pub file_name: String,
    pub state: String,
}

/// A pull request left out because its labels encode no valid state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedProposal {
    pub number: u64,
    pub title: String,
    pub labels: Vec<String>,
}

/// Outcome of a sync run.
#[derive(Debug, Default, Serialize)]
pub struct SyncReport {
    /// Merged proposal files copied from the proposals repository.
    pub copied: Vec<String>,
    pub rendered: Vec<RenderedProposal>,
    pub skipped: Vec<SkippedProposal>,
    /// Whether the website working tree changed and was committed.
    pub committed: bool,
    pub pushed: bool,
}

/// Sync pipeline orchestrator.
pub struct SyncDriver {
    config: SyncConfig,
    source: Arc<dyn ProposalSource>,
    scm: Arc<dyn SourceControl>,
}

impl SyncDriver {
    #[must_use]
    pub fn new(
        config: SyncConfig,
        source: Arc<dyn ProposalSource>,
        scm: Arc<dyn SourceControl>,
    ) -> Self {
        Self {
            config,
            source,
            scm,
        }
    }

    /// Run a full sync.
    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        let work_dir = tempfile::Builder::new()
            .prefix("sip-sync-")
            .tempdir()
            .map_err(SyncError::WorkDir)?;
        let proposals_root = work_dir.path().join("proposals");
        let website_root = work_dir.path().join("website");

        info!(
            proposals = %self.config.proposals_repo,
            website = %self.config.website_repo,
            dry_run = self.config.dry_run,
            "Starting sync"
        );

        self.scm
            .clone_repo(&self.config.proposals_repo, &proposals_root)
            .await?;
        self.scm
            .clone_repo(&self.config.website_repo, &website_root)
            .await?;

        let mut report = self.populate(&proposals_root, &website_root).await?;

        report.committed = self
            .scm
            .commit_all(&website_root, &self.config.commit_message)
            .await?;

        if !report.committed {
            info!("Website already up to date");
        } else if self.config.dry_run {
            info!("Dry run, not pushing");
        } else {
            self.scm
                .push(&website_root, &self.config.website_repo.branch)
                .await?;
            report.pushed = true;
        }

        info!(
            copied = report.copied.len(),
            rendered = report.rendered.len(),
            skipped = report.skipped.len(),
            pushed = report.pushed,
            "Sync complete"
        );
        Ok(report)
    }

    /// Regenerate the output directory under `website_root` from the
    /// proposals checkout at `proposals_root` and the open pull requests.
    pub async fn populate(
        &self,
        proposals_root: &Path,
        website_root: &Path,
    ) -> Result<SyncReport, SyncError> {
        let content_dir = proposals_root.join(&self.config.content_dir);
        let output_dir = website_root.join(&self.config.output_dir);

        let mut pull_requests = self
            .source
            .list_unmerged_pull_requests(&self.config.proposals_repo)
            .await?;
        pull_requests.sort_by_key(|pr| pr.number);

        workspace::reset_dir(&output_dir)?;

        let mut report = SyncReport {
            copied: workspace::copy_markdown(&content_dir, &output_dir)?,
            ..SyncReport::default()
        };
        let mut taken: HashSet<String> = report.copied.iter().cloned().collect();

        for pr in pull_requests {
            let labels = self
                .source
                .issue_labels(&self.config.proposals_repo, pr.number)
                .await?;

            let state = match classify_detailed(&labels) {
                Classification::Matched(state) => state,
                Classification::Ambiguous { chosen, candidates } => {
                    let candidates: Vec<String> =
                        candidates.iter().map(ToString::to_string).collect();
                    warn!(
                        pr = pr.number,
                        labels = ?labels,
                        candidates = ?candidates,
                        chosen = %chosen,
                        "Labels match several states, using the first"
                    );
                    chosen
                }
                Classification::Unclassified => {
                    warn!(
                        pr = pr.number,
                        labels = ?labels,
                        "Skipping pull request with unclassifiable labels"
                    );
                    report.skipped.push(SkippedProposal {
                        number: pr.number,
                        title: pr.title,
                        labels,
                    });
                    continue;
                }
            };

            let file_name = unique_file_name(&pr, &mut taken);
            let frontmatter = Frontmatter::new(pr.title.as_str(), pr.number, &state);
            let document = render_document(&frontmatter).map_err(|source| SyncError::Render {
                number: pr.number,
                source,
            })?;
            workspace::write_document(&output_dir, &file_name, &document)?;

            debug!(pr = pr.number, file = %file_name, state = %state, "Rendered proposal");
            report.rendered.push(RenderedProposal {
                number: pr.number,
                file_name,
                state: state.to_string(),
            });
        }

        Ok(report)
    }
}

/// File name for `pr`, suffixed with its number if another proposal already
/// claimed the plain name, then with a counter until the name is free.
fn unique_file_name(pr: &PullRequest, taken: &mut HashSet<String>) -> String {
    let file_name = proposal_file_name(&pr.title, pr.number);
    if taken.insert(file_name.clone()) {
        return file_name;
    }

    let stem = file_name.strip_suffix(".md").unwrap_or(&file_name);
    let base = format!("{stem}-pr-{}", pr.number);
    let mut suffixed = format!("{base}.md");
    let mut attempt = 2_u32;
    while !taken.insert(suffixed.clone()) {
        suffixed = format!("{base}-{attempt}.md");
        attempt += 1;
    }

    warn!(
        pr = pr.number,
        file = %file_name,
        renamed = %suffixed,
        "File name already taken, adding pull request number"
    );
    suffixed
}
