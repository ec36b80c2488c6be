//! Evaluates the six fixed predicate kinds, and the RELEASE -> ARCHIVED
//! special case, against a frozen evidence log.
//!
//! The rule set is loaded once (via `mtb_io::rules`) and never mutated here;
//! there is no API to relax or override a check at runtime.

use mtb_core::policy::{PolicyCheck, PolicyRule, PredicateKind};
use mtb_core::state::{requirements_for, State};

use crate::recorder::{EvidenceLog, EventKind};
use crate::EngineError;

pub struct PolicyOutcome {
    pub allowed: bool,
    pub checks: Vec<PolicyCheck>,
}

pub struct PolicyEngine {
    rules: Vec<PolicyRule>,
}

impl PolicyEngine {
    pub fn new(rules: Vec<PolicyRule>) -> Self {
        Self { rules }
    }

    /// Always strict: there is no configuration knob that relaxes a check.
    pub fn is_strict(&self) -> bool {
        true
    }

    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    pub fn check_transition(&self, from: State, to: State, log: &EvidenceLog) -> Result<PolicyOutcome, EngineError> {
        let req = requirements_for(from, to)?;
        let mut checks = Vec::new();
        let mut allowed = true;

        for kind in &req.required_predicates {
            let check = match self.rules.iter().find(|r| r.predicate_kind == *kind) {
                Some(rule) => self.evaluate(*kind, rule, log),
                None => PolicyCheck::fail(kind.as_str(), "no rule configured for a required predicate"),
            };
            if !check.passed {
                allowed = false;
            }
            checks.push(check);
        }

        if req.requires_archive_declaration {
            let check = evaluate_archive_declaration(log);
            if !check.passed {
                allowed = false;
            }
            checks.push(check);
        }

        Ok(PolicyOutcome { allowed, checks })
    }

    /// Apply a single rule to a log directly, outside any state transition.
    /// Used by the hostile verifier, which has no state-transition context,
    /// only a public rule set and the evidence embedded in a bundle.
    pub fn evaluate_rule(&self, rule: &PolicyRule, log: &EvidenceLog) -> PolicyCheck {
        self.evaluate(rule.predicate_kind, rule, log)
    }

    fn evaluate(&self, kind: PredicateKind, rule: &PolicyRule, log: &EvidenceLog) -> PolicyCheck {
        match kind {
            PredicateKind::DeterminismRequired => determinism_check(rule, log),
            PredicateKind::EvidenceRequired => evidence_check(rule, log),
            PredicateKind::LineageRequired => lineage_check(rule, log),
            PredicateKind::ValidationRequired => validation_check(rule, log, None),
            PredicateKind::ImmutabilityRequired => immutability_check(rule, log),
            PredicateKind::PlayabilityRequired => {
                let format = rule.parameters.get("format").and_then(|v| v.as_str()).or(Some("structural"));
                validation_check(rule, log, format)
            }
        }
    }
}

fn determinism_check(rule: &PolicyRule, log: &EvidenceLog) -> PolicyCheck {
    let ran_any_node = log.events.iter().any(|e| e.kind == EventKind::NodeExecution);
    let saw_nondeterminism = log
        .events
        .iter()
        .any(|e| e.kind == EventKind::ExecutionFailure && e.payload.get("error").and_then(|v| v.as_str()).map(|s| s.contains("nondeterministic")).unwrap_or(false));
    if ran_any_node && !saw_nondeterminism {
        PolicyCheck::pass(&rule.id)
    } else {
        PolicyCheck::fail(&rule.id, "no audited execution evidence, or a determinism audit failed")
    }
}

fn evidence_check(rule: &PolicyRule, log: &EvidenceLog) -> PolicyCheck {
    if !log.events.is_empty() {
        PolicyCheck::pass(&rule.id)
    } else {
        PolicyCheck::fail(&rule.id, "evidence log is empty")
    }
}

fn lineage_check(rule: &PolicyRule, log: &EvidenceLog) -> PolicyCheck {
    let has_ingest = log.events.iter().any(|e| e.kind == EventKind::IngestRecorded);
    let has_node = log.events.iter().any(|e| e.kind == EventKind::NodeExecution);
    if has_ingest && has_node {
        PolicyCheck::pass(&rule.id)
    } else {
        PolicyCheck::fail(&rule.id, "no lineage chain from ingest to node output in evidence")
    }
}

fn validation_check(rule: &PolicyRule, log: &EvidenceLog, format: Option<&str>) -> PolicyCheck {
    let passed = log.events.iter().any(|e| {
        if e.kind != EventKind::Validation {
            return false;
        }
        let passed = e.payload.get("passed").and_then(|v| v.as_bool()).unwrap_or(false);
        let format_matches = match format {
            Some(f) => e.payload.get("format").and_then(|v| v.as_str()) == Some(f),
            None => true,
        };
        passed && format_matches
    });
    if passed {
        PolicyCheck::pass(&rule.id)
    } else {
        PolicyCheck::fail(&rule.id, "no passing validation evidence found")
    }
}

fn immutability_check(rule: &PolicyRule, log: &EvidenceLog) -> PolicyCheck {
    if log.frozen && log.verify_self_consistent() {
        PolicyCheck::pass(&rule.id)
    } else {
        PolicyCheck::fail(&rule.id, "evidence log is not frozen or fails self-consistency")
    }
}

fn evaluate_archive_declaration(log: &EvidenceLog) -> PolicyCheck {
    let declared = log.events.iter().any(|e| {
        e.kind == EventKind::StateTransition
            && e.payload.get("archive_declaration").is_some()
            && e.payload.get("integrity_proof").is_some()
    });
    if declared {
        PolicyCheck::pass("archive_declaration")
    } else {
        PolicyCheck::fail("archive_declaration", "no archive declaration with an integrity proof in evidence")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::EvidenceRecorder;
    use mtb_core::time::TimeBase;
    use std::collections::BTreeMap;

    fn rule(id: &str, kind: PredicateKind) -> PolicyRule {
        PolicyRule { id: id.to_string(), predicate_kind: kind, parameters: BTreeMap::new() }
    }

    #[test]
    fn candidate_to_release_fails_without_validation_evidence() {
        let mut rec = EvidenceRecorder::new(TimeBase::from_millis(0));
        rec.record(EventKind::IngestRecorded, serde_json::json!({})).unwrap();
        rec.record(EventKind::NodeExecution, serde_json::json!({})).unwrap();
        let log = rec.freeze();

        let rules: Vec<PolicyRule> = PredicateKind::ALL.iter().map(|k| rule(k.as_str(), *k)).collect();
        let engine = PolicyEngine::new(rules);
        let outcome = engine.check_transition(State::Candidate, State::Release, &log).unwrap();
        assert!(!outcome.allowed);
    }

    #[test]
    fn candidate_to_release_passes_with_full_evidence() {
        let mut rec = EvidenceRecorder::new(TimeBase::from_millis(0));
        rec.record(EventKind::IngestRecorded, serde_json::json!({})).unwrap();
        rec.record(EventKind::NodeExecution, serde_json::json!({})).unwrap();
        rec.record(EventKind::Validation, serde_json::json!({"passed": true, "format": "structural"})).unwrap();
        let log = rec.freeze();

        let rules: Vec<PolicyRule> = PredicateKind::ALL.iter().map(|k| rule(k.as_str(), *k)).collect();
        let engine = PolicyEngine::new(rules);
        let outcome = engine.check_transition(State::Candidate, State::Release, &log).unwrap();
        assert!(outcome.allowed);
    }

    #[test]
    fn release_to_archived_requires_archive_declaration() {
        let rec = EvidenceRecorder::new(TimeBase::from_millis(0));
        let log = rec.freeze();
        let engine = PolicyEngine::new(Vec::new());
        let outcome = engine.check_transition(State::Release, State::Archived, &log).unwrap();
        assert!(!outcome.allowed);
    }
}
