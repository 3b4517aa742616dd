//! Markdown documents with YAML frontmatter for classified proposals.
//!
//! A rendered proposal is a header only:
//!
//! ```text
//! ---
//! title: SIP-46 - Proposal for reusing extends with keyword in enums
//! status: under-review
//! pull-request-number: 46
//! stage: design
//! ---
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error;

use crate::state::{ProposalState, Recommendation, Stage, Status};

/// Header delimiter line.
const DELIMITER: &str = "---";

/// `SIP-<number> - ` title prefix, stripped when deriving file names.
static SIP_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^SIP-\d+ - ").unwrap());

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("document does not start with a '---' header")]
    MissingHeader,

    #[error("document header is not terminated by '---'")]
    UnterminatedHeader,
}

/// Frontmatter fields of a rendered proposal.
///
/// Field order is the serialized order and must stay stable so that
/// re-running a sync over unchanged proposals produces no diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Frontmatter {
    pub title: String,
    pub status: Status,
    pub pull_request_number: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
}

impl Frontmatter {
    #[must_use]
    pub fn new(title: impl Into<String>, pull_request_number: u64, state: &ProposalState) -> Self {
        Self {
            title: title.into(),
            status: state.status(),
            pull_request_number,
            stage: state.stage(),
            recommendation: state.recommendation(),
        }
    }
}

/// Render the full document: delimited header, empty body.
pub fn render_document(frontmatter: &Frontmatter) -> Result<String, RenderError> {
    let yaml = serde_yaml::to_string(frontmatter)?;
    Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}\n"))
}

/// Read the header back out of a rendered document.
pub fn parse_document(document: &str) -> Result<Frontmatter, RenderError> {
    let mut lines = document.split_inclusive('\n');

    match lines.next() {
        Some(first) if first.trim_end() == DELIMITER => {}
        _ => return Err(RenderError::MissingHeader),
    }

    let mut header = String::new();
    for line in lines {
        if line.trim_end() == DELIMITER {
            return Ok(serde_yaml::from_str(&header)?);
        }
        header.push_str(line);
    }

    Err(RenderError::UnterminatedHeader)
}

/// Derive the output file name for a proposal from its title.
///
/// The `SIP-<number> - ` prefix is removed only when it is fully present,
/// spaces become hyphens, anything other than letters, digits and hyphens
/// is dropped, and the result is lower-cased. Titles with nothing usable
/// left fall back to `pr-<number>.md`.
pub fn proposal_file_name(title: &str, pull_request_number: u64) -> String {
    let stripped = SIP_PREFIX.replace(title, "");

    let stem: String = stripped
        .replace(' ', "-")
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-')
        .collect();

    if stem.chars().all(|c| c == '-') {
        format!("pr-{pull_request_number}.md")
    } else {
        format!("{stem}.md")
    }
}
