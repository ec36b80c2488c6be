//! The Master Truth Bundle: a fixed set of sections, immutable once sealed.

use serde::{Deserialize, Serialize};

use mtb_dag::graph::Dag;
use mtb_engine::recorder::{EvidenceEvent, IntegrityProof};
use mtb_io::manifest::Manifest;

/// A caller-declared (or evidence-derived) statement that a sealed release
/// is being retired to ARCHIVED. Not an evidence event itself — it's the
/// thing `policy::evaluate_archive_declaration` looks for embedded in a
/// `state_transition` event's payload before this section is populated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArchiveDeclaration {
    pub declared_at: u64,
    pub statement: String,
    /// Base64 RSA-PSS signature over `canonical(statement)`, if the caller
    /// chose to sign the declaration. Absence is not an error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// Fixed top-level sections, in the order they're written to canonical bytes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Mtb {
    pub ingest_manifest: Manifest,
    pub lineage_dag: Dag,
    pub build_evidence: Vec<EvidenceEvent>,
    pub policy_evidence: Vec<EvidenceEvent>,
    pub validation_evidence: Vec<EvidenceEvent>,
    pub approval_events: Vec<EvidenceEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_declaration: Option<ArchiveDeclaration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integrity_proof: Option<IntegrityProof>,
}

impl Mtb {
    /// All evidence across the four evidence sections, concatenated in
    /// declaration order. Used by the sealer and verifier, which care about
    /// the evidence as a whole rather than which section it landed in.
    pub fn all_evidence(&self) -> Vec<&EvidenceEvent> {
        self.build_evidence
            .iter()
            .chain(self.policy_evidence.iter())
            .chain(self.validation_evidence.iter())
            .chain(self.approval_events.iter())
            .collect()
    }

    pub fn is_sealed(&self) -> bool {
        self.integrity_proof.is_some()
    }
}
