//! Classification of issue label sets onto the state catalog.
//!
//! A catalog entry matches when every one of its encoded labels is present
//! on the proposal. Unrelated labels are ignored. When several entries match
//! (only possible for malformed label sets, e.g. two `stage:` labels) the
//! first one in catalog order wins.

use std::collections::HashSet;

use crate::state::{catalog, ProposalState};

/// Outcome of classifying a label set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// No catalog entry is encoded by the labels.
    Unclassified,
    /// Exactly one catalog entry matched.
    Matched(ProposalState),
    /// More than one entry matched; `chosen` is the first in catalog order.
    Ambiguous {
        chosen: ProposalState,
        candidates: Vec<ProposalState>,
    },
}

impl Classification {
    /// The state to use for rendering, if any.
    #[must_use]
    pub fn state(&self) -> Option<ProposalState> {
        match self {
            Classification::Unclassified => None,
            Classification::Matched(state) | Classification::Ambiguous { chosen: state, .. } => {
                Some(*state)
            }
        }
    }
}

/// Every catalog entry encoded by `labels`, in catalog order.
pub fn matching_states<I, S>(labels: I) -> Vec<ProposalState>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let owned: Vec<S> = labels.into_iter().collect();
    let present: HashSet<&str> = owned.iter().map(|label| label.as_ref()).collect();

    catalog()
        .iter()
        .filter(|state| {
            state
                .encoded_labels()
                .iter()
                .all(|label| present.contains(label.as_str()))
        })
        .copied()
        .collect()
}

/// Classify `labels`, keeping every candidate when the match is ambiguous.
pub fn classify_detailed<I, S>(labels: I) -> Classification
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut candidates = matching_states(labels);
    match candidates.len() {
        0 => Classification::Unclassified,
        1 => Classification::Matched(candidates.remove(0)),
        _ => Classification::Ambiguous {
            chosen: candidates[0],
            candidates,
        },
    }
}

/// Classify `labels` as the first matching catalog entry.
pub fn classify<I, S>(labels: I) -> Option<ProposalState>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    classify_detailed(labels).state()
}
