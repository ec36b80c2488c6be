//! DAG source format loader (YAML/JSON, equivalent on disk; JSON in-memory).
//!
//! `{id: str, nodes: [{id, type, config: {...}}], edges: [{from: "node.port", to: "node.port"}]}`
//!
//! This module only parses the wire shape. Turning it into a validated,
//! cycle-checked `Dag` (and rejecting malformed port references) is
//! `mtb_dag::graph`'s job — keeping that dependency direction avoids a cycle
//! between the two crates.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{IoError, IoResult};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub config: serde_json::Value,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawEdge {
    pub from: String,
    pub to: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DagSource {
    pub id: String,
    pub nodes: Vec<RawNode>,
    pub edges: Vec<RawEdge>,
}

impl RawEdge {
    /// Split `"node.port"` into `(node_id, port)`.
    pub fn parse_endpoint(s: &str) -> IoResult<(&str, &str)> {
        s.split_once('.')
            .ok_or_else(|| IoError::Invalid(format!("edge endpoint missing '.': {s}")))
    }
}

/// Parse a DAG source document from JSON bytes.
pub fn parse_dag_source(bytes: &[u8]) -> IoResult<DagSource> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Load a DAG source document from disk.
pub fn load_dag_source(path: &Path) -> IoResult<DagSource> {
    if crate::looks_like_url_strict(&path.to_string_lossy()) {
        return Err(IoError::Path(format!("dag source path looks like a URL: {}", path.display())));
    }
    let bytes = std::fs::read(path)?;
    parse_dag_source(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_dag() {
        let json = br#"{
            "id": "demo",
            "nodes": [{"id": "n1", "type": "passthrough", "config": {}}],
            "edges": []
        }"#;
        let source = parse_dag_source(json).unwrap();
        assert_eq!(source.id, "demo");
        assert_eq!(source.nodes.len(), 1);
    }

    #[test]
    fn parses_edge_endpoints() {
        let (node, port) = RawEdge::parse_endpoint("n1.out").unwrap();
        assert_eq!(node, "n1");
        assert_eq!(port, "out");
        assert!(RawEdge::parse_endpoint("no-dot").is_err());
    }
}
