//! Shared fixtures for this crate's own tests.

use mtb_dag::graph::Dag;
use mtb_io::manifest::Manifest;

use crate::model::Mtb;

pub fn minimal_mtb() -> Mtb {
    Mtb {
        ingest_manifest: Manifest { assets: vec![] },
        lineage_dag: Dag::new("d"),
        build_evidence: vec![],
        policy_evidence: vec![],
        validation_evidence: vec![],
        approval_events: vec![],
        archive_declaration: None,
        integrity_proof: None,
    }
}
