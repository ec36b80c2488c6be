//! The immutable record of "when" and "what inputs" for one run.

use std::collections::BTreeMap;

use mtb_core::time::TimeBase;
use mtb_io::hasher::{hex_decode, sha256_hex};

use crate::graph::Dag;
use crate::DagError;

/// Constructed once per run and never mutated afterward. The single source
/// of truth about timing and inputs for everything the engine records as
/// evidence during that run.
pub struct ExecutionContext {
    dag: Dag,
    workspace_id: String,
    base_time: TimeBase,
    /// Ingest assets keyed by content address, in insertion (manifest) order.
    ingest_assets: BTreeMap<String, Vec<u8>>,
}

impl ExecutionContext {
    /// `base_time`, if `None`, is derived once from the DAG fingerprint:
    /// `epoch + (fingerprint mod 2^31) seconds`.
    pub fn new(
        dag: Dag,
        workspace_id: impl Into<String>,
        base_time: Option<TimeBase>,
        ingest_assets: BTreeMap<String, Vec<u8>>,
    ) -> Result<Self, DagError> {
        let base_time = match base_time {
            Some(bt) => bt,
            None => {
                let fp_hex = dag.fingerprint()?;
                let fp_bytes = hex_decode(&fp_hex).map_err(DagError::Io)?;
                TimeBase::derive_from_fingerprint(&fp_bytes)
            }
        };
        Ok(Self { dag, workspace_id: workspace_id.into(), base_time, ingest_assets })
    }

    pub fn dag(&self) -> &Dag {
        &self.dag
    }

    pub fn workspace_id(&self) -> &str {
        &self.workspace_id
    }

    pub fn base_time(&self) -> TimeBase {
        self.base_time
    }

    pub fn ingest_assets(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.ingest_assets
    }

    /// `SHA-256(canonical(DAG) || workspace_id)`.
    pub fn execution_id(&self) -> Result<String, DagError> {
        self.dag.execution_id(&self.workspace_id)
    }

    /// DAG-level fingerprint, independent of workspace id.
    pub fn fingerprint(&self) -> Result<String, DagError> {
        self.dag.fingerprint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Dag, Node};

    #[test]
    fn base_time_derivation_is_deterministic_per_dag() {
        let mut dag = Dag::new("d");
        dag.add_node(Node {
            id: "a".into(),
            node_type: "passthrough".into(),
            config: serde_json::json!({}),
            inputs: vec![],
            outputs: vec!["out".into()],
        })
        .unwrap();

        let ctx1 = ExecutionContext::new(dag.clone(), "ws", None, BTreeMap::new()).unwrap();
        let ctx2 = ExecutionContext::new(dag, "ws", None, BTreeMap::new()).unwrap();
        assert_eq!(ctx1.base_time(), ctx2.base_time());
    }

    #[test]
    fn caller_supplied_base_time_is_respected() {
        let dag = Dag::new("d");
        let bt = TimeBase::from_millis(42);
        let ctx = ExecutionContext::new(dag, "ws", Some(bt), BTreeMap::new()).unwrap();
        assert_eq!(ctx.base_time(), bt);
    }

    #[test]
    fn sha256_hex_is_available_for_callers_that_need_it() {
        assert_eq!(sha256_hex(b"abc").len(), 64);
    }
}
