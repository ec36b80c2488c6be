//! The title/version lifecycle and its evidence-gated transition table.
//!
//! This module only knows the shape of the graph (which states exist, which
//! predicates each edge demands). Actually checking those predicates against
//! an evidence log is `mtb_engine::policy`'s job.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::policy::PredicateKind;

#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum State {
    Draft,
    Candidate,
    Release,
    Archived,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            State::Draft => "DRAFT",
            State::Candidate => "CANDIDATE",
            State::Release => "RELEASE",
            State::Archived => "ARCHIVED",
        };
        f.write_str(s)
    }
}

/// What an edge in the lifecycle graph demands before it may be taken.
///
/// `RELEASE -> ARCHIVED` is handled as a special case: the spec's six
/// `PredicateKind`s don't include an "archive" predicate, so that edge is
/// represented by `requires_archive_declaration` instead of an entry in
/// `required_predicates`.
#[derive(Clone, Debug)]
pub struct TransitionRequirement {
    pub required_predicates: Vec<PredicateKind>,
    pub requires_archive_declaration: bool,
}

/// Look up what a transition demands, or reject it outright if the edge
/// doesn't exist in the lifecycle graph.
pub fn requirements_for(from: State, to: State) -> Result<TransitionRequirement, CoreError> {
    use State::*;
    match (from, to) {
        (Draft, Candidate) => Ok(TransitionRequirement {
            required_predicates: vec![PredicateKind::EvidenceRequired, PredicateKind::ValidationRequired],
            requires_archive_declaration: false,
        }),
        (Candidate, Release) => Ok(TransitionRequirement {
            required_predicates: PredicateKind::ALL.to_vec(),
            requires_archive_declaration: false,
        }),
        (Release, Archived) => Ok(TransitionRequirement {
            required_predicates: Vec::new(),
            requires_archive_declaration: true,
        }),
        _ => Err(CoreError::InvalidStateTransition { from: from.to_string(), to: to.to_string() }),
    }
}
