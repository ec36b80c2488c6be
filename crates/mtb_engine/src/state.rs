//! Advances a title/version through its lifecycle, gated entirely on
//! evidence already in the log — never on caller assertion.

use mtb_core::state::State;

use crate::policy::{PolicyEngine, PolicyOutcome};
use crate::recorder::EvidenceLog;
use crate::EngineError;

pub struct StateMachine<'a> {
    policy: &'a PolicyEngine,
}

impl<'a> StateMachine<'a> {
    pub fn new(policy: &'a PolicyEngine) -> Self {
        Self { policy }
    }

    /// Attempt `current -> desired`. Returns the new state and the policy
    /// outcome that justified it, or `InvalidStateTransition` when the
    /// evidence doesn't satisfy every required predicate.
    pub fn attempt_transition(
        &self,
        current: State,
        desired: State,
        log: &EvidenceLog,
    ) -> Result<(State, PolicyOutcome), EngineError> {
        let outcome = self.policy.check_transition(current, desired, log)?;
        if outcome.allowed {
            Ok((desired, outcome))
        } else {
            Err(EngineError::InvalidStateTransition(format!(
                "{current} -> {desired} rejected: {} of {} checks failed",
                outcome.checks.iter().filter(|c| !c.passed).count(),
                outcome.checks.len(),
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::{EventKind, EvidenceRecorder};
    use mtb_core::policy::PredicateKind;
    use mtb_core::time::TimeBase;

    fn full_rules() -> Vec<mtb_core::policy::PolicyRule> {
        PredicateKind::ALL
            .iter()
            .map(|k| mtb_core::policy::PolicyRule { id: k.as_str().to_string(), predicate_kind: *k, parameters: Default::default() })
            .collect()
    }

    #[test]
    fn draft_to_candidate_succeeds_with_evidence_and_validation() {
        let mut rec = EvidenceRecorder::new(TimeBase::from_millis(0));
        rec.record(EventKind::IngestRecorded, serde_json::json!({})).unwrap();
        rec.record(EventKind::Validation, serde_json::json!({"passed": true})).unwrap();
        let log = rec.freeze();

        let policy = PolicyEngine::new(full_rules());
        let sm = StateMachine::new(&policy);
        let (state, outcome) = sm.attempt_transition(State::Draft, State::Candidate, &log).unwrap();
        assert_eq!(state, State::Candidate);
        assert!(outcome.allowed);
    }

    #[test]
    fn candidate_to_release_without_evidence_is_rejected() {
        let rec = EvidenceRecorder::new(TimeBase::from_millis(0));
        let log = rec.freeze();
        let policy = PolicyEngine::new(full_rules());
        let sm = StateMachine::new(&policy);
        let err = sm.attempt_transition(State::Candidate, State::Release, &log).unwrap_err();
        assert!(matches!(err, EngineError::InvalidStateTransition(_)));
    }

    #[test]
    fn skipping_a_stage_is_rejected_before_policy_is_even_consulted() {
        let rec = EvidenceRecorder::new(TimeBase::from_millis(0));
        let log = rec.freeze();
        let policy = PolicyEngine::new(full_rules());
        let sm = StateMachine::new(&policy);
        let err = sm.attempt_transition(State::Draft, State::Release, &log).unwrap_err();
        assert!(matches!(err, EngineError::Core(_)));
    }
}
