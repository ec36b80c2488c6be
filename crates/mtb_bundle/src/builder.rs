//! Assembles a recorded run's evidence and ingest manifest into an unsealed
//! `Mtb`. Section order is fixed by `Mtb`'s field order; this module only
//! decides which events land in which section.

use mtb_core::time::TimeBase;
use mtb_dag::graph::Dag;
use mtb_engine::recorder::{EventKind, EvidenceEvent, EvidenceLog};
use mtb_io::manifest::Manifest;

use crate::model::{ArchiveDeclaration, Mtb};

pub struct MtbBuilder {
    ingest_manifest: Manifest,
    lineage_dag: Dag,
    build_evidence: Vec<EvidenceEvent>,
    policy_evidence: Vec<EvidenceEvent>,
    validation_evidence: Vec<EvidenceEvent>,
    approval_events: Vec<EvidenceEvent>,
    archive_declaration: Option<ArchiveDeclaration>,
}

impl MtbBuilder {
    pub fn new(ingest_manifest: Manifest, lineage_dag: Dag) -> Self {
        Self {
            ingest_manifest,
            lineage_dag,
            build_evidence: Vec::new(),
            policy_evidence: Vec::new(),
            validation_evidence: Vec::new(),
            approval_events: Vec::new(),
            archive_declaration: None,
        }
    }

    /// Split a frozen evidence log into the four evidence sections, by kind.
    pub fn with_evidence_log(mut self, log: &EvidenceLog) -> Self {
        for event in &log.events {
            match event.kind {
                EventKind::ExecutionStart
                | EventKind::ExecutionComplete
                | EventKind::ExecutionFailure
                | EventKind::IngestRecorded
                | EventKind::NodeExecution => self.build_evidence.push(event.clone()),
                EventKind::PolicyCheck => self.policy_evidence.push(event.clone()),
                EventKind::Validation => self.validation_evidence.push(event.clone()),
                EventKind::StateTransition => self.approval_events.push(event.clone()),
            }
        }
        self
    }

    /// `base_time`/`last_seq` are used only when `declared_at` isn't
    /// caller-supplied: `base_time + last_seq * delta`. Never consults the
    /// wall clock.
    pub fn with_archive_declaration(
        mut self,
        statement: impl Into<String>,
        signature: Option<String>,
        declared_at: Option<u64>,
        base_time: TimeBase,
        last_seq: u64,
    ) -> Self {
        let declared_at = declared_at.unwrap_or_else(|| base_time.timestamp_for_seq(last_seq));
        self.archive_declaration = Some(ArchiveDeclaration { declared_at, statement: statement.into(), signature });
        self
    }

    pub fn build(self) -> Mtb {
        Mtb {
            ingest_manifest: self.ingest_manifest,
            lineage_dag: self.lineage_dag,
            build_evidence: self.build_evidence,
            policy_evidence: self.policy_evidence,
            validation_evidence: self.validation_evidence,
            approval_events: self.approval_events,
            archive_declaration: self.archive_declaration,
            integrity_proof: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtb_core::time::TimeBase;
    use mtb_dag::graph::Dag;
    use mtb_engine::recorder::EvidenceRecorder;

    #[test]
    fn events_are_sorted_into_their_declared_sections() {
        let mut rec = EvidenceRecorder::new(TimeBase::from_millis(0));
        rec.record(EventKind::ExecutionStart, serde_json::json!({})).unwrap();
        rec.record(EventKind::PolicyCheck, serde_json::json!({})).unwrap();
        rec.record(EventKind::Validation, serde_json::json!({})).unwrap();
        rec.record(EventKind::StateTransition, serde_json::json!({})).unwrap();
        let log = rec.freeze();

        let manifest = Manifest { assets: vec![] };
        let mtb = MtbBuilder::new(manifest, Dag::new("d")).with_evidence_log(&log).build();

        assert_eq!(mtb.build_evidence.len(), 1);
        assert_eq!(mtb.policy_evidence.len(), 1);
        assert_eq!(mtb.validation_evidence.len(), 1);
        assert_eq!(mtb.approval_events.len(), 1);
        assert!(mtb.archive_declaration.is_none());
        assert!(!mtb.is_sealed());
    }
}
