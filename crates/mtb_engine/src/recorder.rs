//! The append-only, ordered, per-event-sealed evidence log.
//!
//! The recorder never reads the wall clock: every timestamp is
//! `base_time + seq * delta`, computed once per record from the
//! `ExecutionContext`'s `TimeBase`.

use serde::{Deserialize, Serialize};

use mtb_core::time::TimeBase;
use mtb_io::canonical::canonical_bytes;
use mtb_io::hasher::sha256_hex;

use crate::EngineError;

#[derive(Clone, Copy, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ExecutionStart,
    ExecutionComplete,
    ExecutionFailure,
    NodeExecution,
    PolicyCheck,
    Validation,
    StateTransition,
    IngestRecorded,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct IntegrityProof {
    pub alg: String,
    pub hash: String,
}

impl IntegrityProof {
    fn sha256(hash: String) -> Self {
        Self { alg: "sha256".to_string(), hash }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct EvidenceEvent {
    pub seq: u64,
    pub kind: EventKind,
    pub timestamp: u64,
    pub payload: serde_json::Value,
    pub integrity_proof: IntegrityProof,
}

/// The shape hashed to produce an event's `integrity_proof`: every field
/// except the proof itself.
#[derive(Serialize)]
struct EventWithoutProof<'a> {
    seq: u64,
    kind: EventKind,
    timestamp: u64,
    payload: &'a serde_json::Value,
}

/// An evidence log, frozen at the end of a run. `seq` values form the
/// gapless range `[0, n)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvidenceLog {
    pub events: Vec<EvidenceEvent>,
    pub frozen: bool,
}

impl EvidenceLog {
    /// Recompute and compare each event's own integrity proof; `false` on
    /// the first mismatch or `seq` gap.
    pub fn verify_self_consistent(&self) -> bool {
        for (i, event) in self.events.iter().enumerate() {
            if event.seq != i as u64 {
                return false;
            }
            let expected = hash_event_without_proof(event);
            if expected != event.integrity_proof.hash {
                return false;
            }
        }
        true
    }
}

fn hash_event_without_proof(event: &EvidenceEvent) -> String {
    let basis = EventWithoutProof { seq: event.seq, kind: event.kind, timestamp: event.timestamp, payload: &event.payload };
    match canonical_bytes(&basis) {
        Ok(bytes) => sha256_hex(&bytes),
        Err(_) => String::new(),
    }
}

/// Owns the append-only event list for one run.
pub struct EvidenceRecorder {
    base_time: TimeBase,
    events: Vec<EvidenceEvent>,
    frozen: bool,
}

impl EvidenceRecorder {
    pub fn new(base_time: TimeBase) -> Self {
        Self { base_time, events: Vec::new(), frozen: false }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[EvidenceEvent] {
        &self.events
    }

    /// Assign the next `seq`, derive the timestamp from `base_time`,
    /// canonicalize and seal the payload, and append.
    pub fn record(&mut self, kind: EventKind, payload: serde_json::Value) -> Result<EvidenceEvent, EngineError> {
        if self.frozen {
            return Err(EngineError::LogFrozen);
        }
        let seq = self.events.len() as u64;
        let timestamp = self.base_time.timestamp_for_seq(seq);
        let basis = EventWithoutProof { seq, kind, timestamp, payload: &payload };
        let bytes = canonical_bytes(&basis)?;
        let hash = sha256_hex(&bytes);
        let event = EvidenceEvent { seq, kind, timestamp, payload, integrity_proof: IntegrityProof::sha256(hash) };
        self.events.push(event.clone());
        Ok(event)
    }

    /// Freeze the log: no further `record` calls will succeed.
    pub fn freeze(mut self) -> EvidenceLog {
        self.frozen = true;
        EvidenceLog { events: self.events, frozen: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_gapless_from_zero() {
        let mut rec = EvidenceRecorder::new(TimeBase::from_millis(0));
        rec.record(EventKind::ExecutionStart, serde_json::json!({})).unwrap();
        rec.record(EventKind::ExecutionComplete, serde_json::json!({})).unwrap();
        let log = rec.freeze();
        assert_eq!(log.events[0].seq, 0);
        assert_eq!(log.events[1].seq, 1);
        assert!(log.verify_self_consistent());
    }

    #[test]
    fn timestamps_advance_by_delta_not_wall_clock() {
        let mut rec = EvidenceRecorder::new(TimeBase::from_millis(1000));
        let e0 = rec.record(EventKind::ExecutionStart, serde_json::json!({})).unwrap();
        let e1 = rec.record(EventKind::IngestRecorded, serde_json::json!({})).unwrap();
        assert_eq!(e0.timestamp, 1000);
        assert_eq!(e1.timestamp, 1001);
    }

    #[test]
    fn record_after_freeze_fails() {
        let mut rec = EvidenceRecorder::new(TimeBase::from_millis(0));
        rec.record(EventKind::ExecutionStart, serde_json::json!({})).unwrap();
        let log = rec.freeze();
        assert!(log.frozen);
        // A recorder consumed by freeze() cannot be used again — the type
        // system enforces this (freeze takes `self` by value).
    }

    #[test]
    fn tampered_event_fails_self_consistency() {
        let mut rec = EvidenceRecorder::new(TimeBase::from_millis(0));
        rec.record(EventKind::ExecutionStart, serde_json::json!({})).unwrap();
        let mut log = rec.freeze();
        log.events[0].payload = serde_json::json!({"tampered": true});
        assert!(!log.verify_self_consistent());
    }
}
