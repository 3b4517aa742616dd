//! SIP proposal state model.
//!
//! This crate provides:
//! - The fixed catalog of valid (stage, status, recommendation) states
//! - Classification of GitHub label sets onto that catalog
//! - Rendering of classified proposals as Markdown documents with YAML frontmatter
//!
//! Everything here is pure; fetching labels and writing files is done by
//! the `sip-sync` crate.

pub mod classify;
pub mod frontmatter;
pub mod state;

pub use classify::{classify, classify_detailed, matching_states, Classification};
pub use frontmatter::{
    parse_document, proposal_file_name, render_document, Frontmatter, RenderError,
};
pub use state::{catalog, LabelKind, ProposalState, Recommendation, Stage, Status, CATALOG};
