//! Policy rule and predicate shapes.
//!
//! The set of predicate kinds is closed: the rule-file loader in `mtb_io`
//! rejects anything outside this enum with `UnknownRule`, and the policy
//! engine in `mtb_engine` has no API to add new ones at runtime.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The fixed, closed set of things a policy rule can require.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PredicateKind {
    DeterminismRequired,
    EvidenceRequired,
    LineageRequired,
    ValidationRequired,
    ImmutabilityRequired,
    PlayabilityRequired,
}

impl PredicateKind {
    /// All six kinds, in a fixed order, for iteration and exhaustiveness checks.
    pub const ALL: [PredicateKind; 6] = [
        PredicateKind::DeterminismRequired,
        PredicateKind::EvidenceRequired,
        PredicateKind::LineageRequired,
        PredicateKind::ValidationRequired,
        PredicateKind::ImmutabilityRequired,
        PredicateKind::PlayabilityRequired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PredicateKind::DeterminismRequired => "determinism_required",
            PredicateKind::EvidenceRequired => "evidence_required",
            PredicateKind::LineageRequired => "lineage_required",
            PredicateKind::ValidationRequired => "validation_required",
            PredicateKind::ImmutabilityRequired => "immutability_required",
            PredicateKind::PlayabilityRequired => "playability_required",
        }
    }

    /// Parse the declarative rule-file token, rejecting anything unrecognized.
    pub fn parse(token: &str) -> Option<Self> {
        Some(match token {
            "determinism_required" => PredicateKind::DeterminismRequired,
            "evidence_required" => PredicateKind::EvidenceRequired,
            "lineage_required" => PredicateKind::LineageRequired,
            "validation_required" => PredicateKind::ValidationRequired,
            "immutability_required" => PredicateKind::ImmutabilityRequired,
            "playability_required" => PredicateKind::PlayabilityRequired,
            _ => return None,
        })
    }
}

/// One entry from the declarative rule file, already validated.
#[derive(Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PolicyRule {
    pub id: String,
    pub predicate_kind: PredicateKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub parameters: BTreeMap<String, serde_json::Value>,
}

/// The outcome of evaluating a single rule against the evidence log, emitted
/// as evidence itself.
#[derive(Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PolicyCheck {
    pub rule_id: String,
    pub passed: bool,
    pub details: BTreeMap<String, serde_json::Value>,
}

impl PolicyCheck {
    pub fn pass(rule_id: impl Into<String>) -> Self {
        Self { rule_id: rule_id.into(), passed: true, details: BTreeMap::new() }
    }

    pub fn fail(rule_id: impl Into<String>, reason: impl Into<String>) -> Self {
        let mut details = BTreeMap::new();
        details.insert("reason".to_string(), serde_json::Value::String(reason.into()));
        Self { rule_id: rule_id.into(), passed: false, details }
    }
}
