//! Proposal stages, statuses and recommendations, and the catalog of valid
//! combinations.
//!
//! Labels on the proposals repository encode a state as `"<kind>:<value>"`,
//! e.g. `stage:design` or `status:vote-requested`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind half of a `"<kind>:<value>"` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    Stage,
    Status,
    Recommendation,
}

impl LabelKind {
    /// Label prefix, without the separating colon.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            LabelKind::Stage => "stage",
            LabelKind::Status => "status",
            LabelKind::Recommendation => "recommendation",
        }
    }

    /// Encode a label value of this kind, e.g. `status:under-review`.
    #[must_use]
    pub fn encode(self, value: &str) -> String {
        format!("{}:{value}", self.prefix())
    }
}

/// Process stage a proposal has reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    PreSip,
    Design,
    Implementation,
    Completed,
}

impl Stage {
    /// Get all stages.
    #[must_use]
    pub fn all() -> &'static [Stage] {
        &[
            Stage::PreSip,
            Stage::Design,
            Stage::Implementation,
            Stage::Completed,
        ]
    }

    /// Label value, as used after `stage:`.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Stage::PreSip => "pre-sip",
            Stage::Design => "design",
            Stage::Implementation => "implementation",
            Stage::Completed => "completed",
        }
    }

    /// Parse a stage from its label value.
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|stage| stage.label() == s)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Review status of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Submitted,
    UnderReview,
    VoteRequested,
    WaitingForImplementation,
    Accepted,
    Shipped,
    Rejected,
    Withdrawn,
}

impl Status {
    /// Get all statuses.
    #[must_use]
    pub fn all() -> &'static [Status] {
        &[
            Status::Submitted,
            Status::UnderReview,
            Status::VoteRequested,
            Status::WaitingForImplementation,
            Status::Accepted,
            Status::Shipped,
            Status::Rejected,
            Status::Withdrawn,
        ]
    }

    /// Label value, as used after `status:`.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Status::Submitted => "submitted",
            Status::UnderReview => "under-review",
            Status::VoteRequested => "vote-requested",
            Status::WaitingForImplementation => "waiting-for-implementation",
            Status::Accepted => "accepted",
            Status::Shipped => "shipped",
            Status::Rejected => "rejected",
            Status::Withdrawn => "withdrawn",
        }
    }

    /// Parse a status from its label value.
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|status| status.label() == s)
    }

    /// Whether a proposal may carry this status without being in any stage.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Rejected | Status::Withdrawn)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Committee recommendation attached to a vote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Recommendation {
    Accept,
    Reject,
}

impl Recommendation {
    /// Get all recommendations.
    #[must_use]
    pub fn all() -> &'static [Recommendation] {
        &[Recommendation::Accept, Recommendation::Reject]
    }

    /// Label value, as used after `recommendation:`.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Recommendation::Accept => "accept",
            Recommendation::Reject => "reject",
        }
    }

    /// Parse a recommendation from its label value.
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|rec| rec.label() == s)
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A valid proposal state.
///
/// Values are only ever taken from [`CATALOG`], so every instance satisfies
/// the state invariants:
/// - no stage implies a `rejected` or `withdrawn` status
/// - `vote-requested` implies a recommendation, and only it carries one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProposalState {
    stage: Option<Stage>,
    status: Status,
    recommendation: Option<Recommendation>,
}

impl ProposalState {
    const fn new(
        stage: Option<Stage>,
        status: Status,
        recommendation: Option<Recommendation>,
    ) -> Self {
        Self {
            stage,
            status,
            recommendation,
        }
    }

    #[must_use]
    pub fn stage(&self) -> Option<Stage> {
        self.stage
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    #[must_use]
    pub fn recommendation(&self) -> Option<Recommendation> {
        self.recommendation
    }

    /// The labels a proposal must carry to be classified as this state,
    /// in stage, status, recommendation order.
    #[must_use]
    pub fn encoded_labels(&self) -> Vec<String> {
        let mut labels = Vec::with_capacity(3);
        if let Some(stage) = self.stage {
            labels.push(LabelKind::Stage.encode(stage.label()));
        }
        labels.push(LabelKind::Status.encode(self.status.label()));
        if let Some(rec) = self.recommendation {
            labels.push(LabelKind::Recommendation.encode(rec.label()));
        }
        labels
    }

    /// Check the stage/status/recommendation invariants.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let stage_ok = self.stage.is_some() || self.status.is_terminal();
        let rec_ok = (self.status == Status::VoteRequested) == self.recommendation.is_some();
        stage_ok && rec_ok
    }
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage {
            Some(stage) => write!(f, "{stage}/{}", self.status)?,
            None => write!(f, "-/{}", self.status)?,
        }
        if let Some(rec) = self.recommendation {
            write!(f, "/{rec}")?;
        }
        Ok(())
    }
}

/// Every valid proposal state. Order is the classification tie-break priority.
pub const CATALOG: [ProposalState; 12] = [
    ProposalState::new(Some(Stage::PreSip), Status::Submitted, None),
    ProposalState::new(Some(Stage::Design), Status::UnderReview, None),
    ProposalState::new(
        Some(Stage::Design),
        Status::VoteRequested,
        Some(Recommendation::Accept),
    ),
    ProposalState::new(
        Some(Stage::Design),
        Status::VoteRequested,
        Some(Recommendation::Reject),
    ),
    ProposalState::new(
        Some(Stage::Implementation),
        Status::WaitingForImplementation,
        None,
    ),
    ProposalState::new(Some(Stage::Implementation), Status::UnderReview, None),
    ProposalState::new(
        Some(Stage::Implementation),
        Status::VoteRequested,
        Some(Recommendation::Accept),
    ),
    ProposalState::new(
        Some(Stage::Implementation),
        Status::VoteRequested,
        Some(Recommendation::Reject),
    ),
    ProposalState::new(Some(Stage::Completed), Status::Accepted, None),
    ProposalState::new(Some(Stage::Completed), Status::Shipped, None),
    ProposalState::new(None, Status::Rejected, None),
    ProposalState::new(None, Status::Withdrawn, None),
];

/// The catalog as a slice.
#[must_use]
pub fn catalog() -> &'static [ProposalState] {
    &CATALOG
}
