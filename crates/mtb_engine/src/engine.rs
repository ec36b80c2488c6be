//! Drives one DAG execution against an `ExecutionContext`: resolves node
//! inputs, executes nodes in topological order, re-executes each node once
//! more for the determinism audit, and records every step as evidence.

use std::collections::BTreeMap;
use std::sync::Arc;

use mtb_dag::{ExecutionContext, NodeImpl, NodeRegistry};
use mtb_io::hasher::sha256_hex;

use crate::recorder::{EventKind, EvidenceLog, EvidenceRecorder};
use crate::EngineError;

/// The write-once, content-addressed store backing one run: address -> bytes.
#[derive(Default)]
struct ContentStore {
    entries: BTreeMap<String, Vec<u8>>,
}

impl ContentStore {
    fn put(&mut self, bytes: Vec<u8>) -> String {
        let address = sha256_hex(&bytes);
        // Same address implies same bytes by construction (barring a hash
        // collision); insert is idempotent.
        self.entries.entry(address.clone()).or_insert(bytes);
        address
    }

    fn get(&self, address: &str) -> Option<&Vec<u8>> {
        self.entries.get(address)
    }
}

/// The final, addressed outputs of a completed run.
pub struct RunOutcome {
    pub execution_id: String,
    /// `node_id -> (port -> content address)`.
    pub outputs: BTreeMap<String, BTreeMap<String, String>>,
    pub evidence_log: EvidenceLog,
}

pub struct Engine<'a> {
    registry: &'a NodeRegistry,
}

impl<'a> Engine<'a> {
    pub fn new(registry: &'a NodeRegistry) -> Self {
        Self { registry }
    }

    pub fn run(&self, ctx: &ExecutionContext) -> Result<RunOutcome, EngineError> {
        let mut recorder = EvidenceRecorder::new(ctx.base_time());
        let execution_id = ctx.execution_id()?;
        let fingerprint = ctx.fingerprint()?;

        recorder.record(
            EventKind::ExecutionStart,
            serde_json::json!({
                "execution_id": execution_id,
                "dag_id": ctx.dag().id,
                "fingerprint": fingerprint,
            }),
        )?;

        let mut store = ContentStore::default();
        for (address, bytes) in ctx.ingest_assets() {
            store.entries.insert(address.clone(), bytes.clone());
            recorder.record(EventKind::IngestRecorded, serde_json::json!({ "content_address": address }))?;
        }

        let order = match ctx.dag().topo_order() {
            Ok(order) => order,
            Err(err) => {
                recorder.record(EventKind::ExecutionFailure, serde_json::json!({ "error": err.to_string() }))?;
                return Err(EngineError::Dag(err));
            }
        };

        let mut node_outputs: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();

        for node_id in &order {
            let node = ctx
                .dag()
                .node(node_id)
                .expect("topo_order only yields ids present in the dag");

            let (input_addresses, inputs) = match self.resolve_inputs(ctx, node_id, node, &node_outputs, &store) {
                Ok(resolved) => resolved,
                Err(err) => {
                    recorder.record(
                        EventKind::ExecutionFailure,
                        serde_json::json!({ "node_id": node_id, "error": err.to_string() }),
                    )?;
                    return Err(err);
                }
            };

            let implementation = match self.registry.get(&node.node_type) {
                Ok(imp) => imp,
                Err(err) => {
                    recorder.record(
                        EventKind::ExecutionFailure,
                        serde_json::json!({ "node_id": node_id, "error": err.to_string() }),
                    )?;
                    return Err(EngineError::Dag(err));
                }
            };

            let outputs = match self.execute_with_audit(implementation, node_id, &node.config, &inputs) {
                Ok(outputs) => outputs,
                Err(err) => {
                    recorder.record(
                        EventKind::ExecutionFailure,
                        serde_json::json!({ "node_id": node_id, "error": err.to_string() }),
                    )?;
                    return Err(err);
                }
            };

            let mut output_addresses = BTreeMap::new();
            for (port, bytes) in outputs {
                let address = store.put(bytes);
                output_addresses.insert(port, address);
            }

            recorder.record(
                EventKind::NodeExecution,
                serde_json::json!({
                    "node_id": node_id,
                    "node_type": node.node_type,
                    "inputs": input_addresses,
                    "outputs": output_addresses,
                    "evidence": implementation.evidence(&node.config),
                }),
            )?;

            node_outputs.insert(node_id.clone(), output_addresses);
        }

        recorder.record(EventKind::ExecutionComplete, serde_json::json!({ "outputs": node_outputs }))?;

        Ok(RunOutcome { execution_id, outputs: node_outputs, evidence_log: recorder.freeze() })
    }

    /// Execute once, then re-execute with identical inputs; the two output
    /// address sets must match exactly or the node is nondeterministic.
    fn execute_with_audit(
        &self,
        implementation: &Arc<dyn NodeImpl>,
        node_id: &str,
        config: &serde_json::Value,
        inputs: &BTreeMap<String, Vec<u8>>,
    ) -> Result<BTreeMap<String, Vec<u8>>, EngineError> {
        let first = implementation.execute(config, inputs).map_err(EngineError::Dag)?;
        let second = implementation.execute(config, inputs).map_err(EngineError::Dag)?;

        let addresses = |out: &BTreeMap<String, Vec<u8>>| -> BTreeMap<String, String> {
            out.iter().map(|(port, bytes)| (port.clone(), sha256_hex(bytes))).collect()
        };
        if addresses(&first) != addresses(&second) {
            return Err(EngineError::NondeterministicNode(node_id.to_string()));
        }
        Ok(first)
    }

    fn resolve_inputs(
        &self,
        ctx: &ExecutionContext,
        node_id: &str,
        node: &mtb_dag::graph::Node,
        node_outputs: &BTreeMap<String, BTreeMap<String, String>>,
        store: &ContentStore,
    ) -> Result<(BTreeMap<String, String>, BTreeMap<String, Vec<u8>>), EngineError> {
        let mut addresses = BTreeMap::new();
        let mut resolved = BTreeMap::new();
        for port in &node.inputs {
            let wired = ctx
                .dag()
                .edges()
                .find(|e| e.dst_node == node_id && e.dst_port == *port);

            let address = if let Some(edge) = wired {
                node_outputs
                    .get(&edge.src_node)
                    .and_then(|outs| outs.get(&edge.src_port))
                    .cloned()
                    .ok_or_else(|| {
                        EngineError::Dag(mtb_dag::DagError::PortMismatch(format!(
                            "{}.{} has no resolved upstream output",
                            edge.src_node, edge.src_port
                        )))
                    })?
            } else {
                node.config
                    .get(port)
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
                    .ok_or_else(|| {
                        EngineError::Dag(mtb_dag::DagError::PortMismatch(format!(
                            "{node_id}.{port} is unwired and has no ingest address in config"
                        )))
                    })?
            };

            let bytes = ctx
                .ingest_assets()
                .get(&address)
                .or_else(|| store.get(&address))
                .cloned()
                .ok_or_else(|| {
                    EngineError::Dag(mtb_dag::DagError::PortMismatch(format!(
                        "content address {address} not found for {node_id}.{port}"
                    )))
                })?;
            addresses.insert(port.clone(), address);
            resolved.insert(port.clone(), bytes);
        }
        Ok((addresses, resolved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtb_dag::graph::{Dag, Edge, Node};
    use mtb_dag::node::Passthrough;
    use std::collections::BTreeMap as Map;
    use std::sync::Arc as Rc;

    fn ctx_single_passthrough() -> ExecutionContext {
        let mut dag = Dag::new("d");
        dag.add_node(Node {
            id: "a".into(),
            node_type: "passthrough".into(),
            config: serde_json::json!({ "in": "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad" }),
            inputs: vec!["in".into()],
            outputs: vec!["out".into()],
        })
        .unwrap();

        let mut ingest = Map::new();
        ingest.insert(
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad".to_string(),
            b"abc".to_vec(),
        );
        ExecutionContext::new(dag, "ws", Some(mtb_core::time::TimeBase::from_millis(0)), ingest).unwrap()
    }

    #[test]
    fn identity_pipeline_produces_matching_output_address() {
        let ctx = ctx_single_passthrough();
        let registry = NodeRegistry::new();
        let engine = Engine::new(&registry);
        let outcome = engine.run(&ctx).unwrap();
        let addr = &outcome.outputs["a"]["out"];
        assert_eq!(addr, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
        assert!(outcome.evidence_log.verify_self_consistent());
    }

    struct Nondeterministic(std::sync::atomic::AtomicU8);

    impl NodeImpl for Nondeterministic {
        fn execute(
            &self,
            _config: &serde_json::Value,
            _inputs: &Map<String, Vec<u8>>,
        ) -> Result<Map<String, Vec<u8>>, mtb_dag::DagError> {
            let n = self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let mut out = Map::new();
            out.insert("out".to_string(), vec![n]);
            Ok(out)
        }
    }

    #[test]
    fn nondeterministic_node_is_caught_by_the_audit() {
        let mut dag = Dag::new("d");
        dag.add_node(Node {
            id: "a".into(),
            node_type: "flaky".into(),
            config: serde_json::json!({}),
            inputs: vec![],
            outputs: vec!["out".into()],
        })
        .unwrap();
        let ctx = ExecutionContext::new(dag, "ws", Some(mtb_core::time::TimeBase::from_millis(0)), Map::new()).unwrap();

        let mut registry = NodeRegistry::new();
        registry.register("flaky", Rc::new(Nondeterministic(std::sync::atomic::AtomicU8::new(0))));
        let engine = Engine::new(&registry);

        let err = engine.run(&ctx).unwrap_err();
        assert!(matches!(err, EngineError::NondeterministicNode(ref id) if id == "a"));
    }

    #[test]
    fn edge_wired_input_resolves_from_upstream_output() {
        let mut dag = Dag::new("d");
        dag.add_node(Node { id: "a".into(), node_type: "passthrough".into(), config: serde_json::json!({"in": "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"}), inputs: vec!["in".into()], outputs: vec!["out".into()] }).unwrap();
        dag.add_node(Node { id: "b".into(), node_type: "passthrough".into(), config: serde_json::json!({}), inputs: vec!["in".into()], outputs: vec!["out".into()] }).unwrap();
        dag.add_edge(Edge { src_node: "a".into(), src_port: "out".into(), dst_node: "b".into(), dst_port: "in".into() }).unwrap();

        let mut ingest = Map::new();
        ingest.insert("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad".to_string(), b"abc".to_vec());
        let ctx = ExecutionContext::new(dag, "ws", Some(mtb_core::time::TimeBase::from_millis(0)), ingest).unwrap();

        let registry = NodeRegistry::new();
        let engine = Engine::new(&registry);
        let outcome = engine.run(&ctx).unwrap();
        assert_eq!(outcome.outputs["b"]["out"], "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
        let _ = Passthrough;
    }
}
