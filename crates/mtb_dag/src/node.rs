//! The node execution contract.
//!
//! `execute` must be pure: no wall clock, no randomness, no environment, no
//! network. Inputs and outputs are mappings from port name to raw bytes —
//! the engine (not the node) owns hashing those bytes into content addresses
//! and the write-once content store; nodes only ever see and produce bytes.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::DagError;

/// A pure transformation, registered under its `type` tag.
pub trait NodeImpl: Send + Sync {
    /// Run the transformation. Must not read the clock, environment, network,
    /// or any randomness source; the same `config` and `inputs` must always
    /// produce the same `outputs` (the engine re-checks this at run time).
    fn execute(
        &self,
        config: &serde_json::Value,
        inputs: &BTreeMap<String, Vec<u8>>,
    ) -> Result<BTreeMap<String, Vec<u8>>, DagError>;

    /// Opaque, node-type-specific evidence to attach to the `node_execution`
    /// event, beyond input/output addresses (e.g. parameters actually used).
    /// Most node types have nothing to add.
    fn evidence(&self, _config: &serde_json::Value) -> serde_json::Value {
        serde_json::Value::Null
    }
}

/// The one canonical node type this framework ships: `outputs == inputs`.
pub struct Passthrough;

impl NodeImpl for Passthrough {
    fn execute(
        &self,
        _config: &serde_json::Value,
        inputs: &BTreeMap<String, Vec<u8>>,
    ) -> Result<BTreeMap<String, Vec<u8>>, DagError> {
        Ok(inputs.clone())
    }
}

/// Node types registered by string tag. The registry is immutable once built
/// into an `ExecutionContext`'s engine — no node type may be added mid-run.
pub struct NodeRegistry {
    types: BTreeMap<String, Arc<dyn NodeImpl>>,
}

impl NodeRegistry {
    /// A registry with only `passthrough` registered.
    pub fn new() -> Self {
        let mut types: BTreeMap<String, Arc<dyn NodeImpl>> = BTreeMap::new();
        types.insert("passthrough".to_string(), Arc::new(Passthrough));
        Self { types }
    }

    pub fn register(&mut self, type_tag: impl Into<String>, implementation: Arc<dyn NodeImpl>) {
        self.types.insert(type_tag.into(), implementation);
    }

    pub fn get(&self, type_tag: &str) -> Result<&Arc<dyn NodeImpl>, DagError> {
        self.types.get(type_tag).ok_or_else(|| DagError::UnknownNodeType(type_tag.to_string()))
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_outputs_equal_inputs() {
        let mut inputs = BTreeMap::new();
        inputs.insert("in".to_string(), b"abc".to_vec());
        let outputs = Passthrough.execute(&serde_json::json!({}), &inputs).unwrap();
        assert_eq!(outputs, inputs);
    }

    #[test]
    fn registry_resolves_passthrough_and_rejects_unknown() {
        let registry = NodeRegistry::new();
        assert!(registry.get("passthrough").is_ok());
        assert!(matches!(registry.get("nope"), Err(DagError::UnknownNodeType(_))));
    }
}
