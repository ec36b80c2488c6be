//! The node/edge graph: the DAG's planning-time representation.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use mtb_core::ordering::cmp_ids;
use mtb_io::hasher::sha256_canonical;

use crate::DagError;

/// A pure transformation: an id unique within its DAG, a type tag, a
/// configuration mapping, and declared input/output port names.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub config: serde_json::Value,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

/// A directed dependency `(src_node, src_port) -> (dst_node, dst_port)`.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct Edge {
    pub src_node: String,
    pub src_port: String,
    pub dst_node: String,
    pub dst_port: String,
}

/// An ordered sequence of nodes plus a set of edges. Node ids are unique;
/// edges are deduplicated on insert; cycle-freedom and port coverage are
/// checked explicitly rather than maintained incrementally.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Dag {
    pub id: String,
    nodes: Vec<Node>,
    edges: BTreeSet<Edge>,
}

impl Dag {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), nodes: Vec::new(), edges: BTreeSet::new() }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn add_node(&mut self, node: Node) -> Result<(), DagError> {
        if self.nodes.iter().any(|n| n.id == node.id) {
            return Err(DagError::DuplicateNodeId(node.id));
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Duplicate edges collapse silently — the set insert is the dedup.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), DagError> {
        let src = self
            .node(&edge.src_node)
            .ok_or_else(|| DagError::PortMismatch(format!("unknown src node {}", edge.src_node)))?;
        if !src.outputs.iter().any(|p| p == &edge.src_port) {
            return Err(DagError::PortMismatch(format!("{}.{} is not a declared output", edge.src_node, edge.src_port)));
        }
        let dst = self
            .node(&edge.dst_node)
            .ok_or_else(|| DagError::PortMismatch(format!("unknown dst node {}", edge.dst_node)))?;
        if !dst.inputs.iter().any(|p| p == &edge.dst_port) {
            return Err(DagError::PortMismatch(format!("{}.{} is not a declared input", edge.dst_node, edge.dst_port)));
        }
        self.edges.insert(edge);
        Ok(())
    }

    /// Every non-source input port (one with at least one incoming edge
    /// expectation) must have exactly one incoming edge. Source ports (no
    /// edge at all) are resolved from the ingest table or node config instead.
    pub fn check_port_coverage(&self) -> Result<(), DagError> {
        let mut incoming: HashMap<(&str, &str), u32> = HashMap::new();
        for e in &self.edges {
            *incoming.entry((e.dst_node.as_str(), e.dst_port.as_str())).or_insert(0) += 1;
        }
        for ((node, port), count) in &incoming {
            if *count > 1 {
                return Err(DagError::PortMismatch(format!("{node}.{port} has {count} incoming edges")));
            }
        }
        Ok(())
    }

    /// Kahn's algorithm; ties among ready nodes are broken lexicographically
    /// by node id, guaranteeing a single deterministic order for any DAG.
    pub fn topo_order(&self) -> Result<Vec<String>, DagError> {
        self.detect_cycles()?;

        let mut indegree: HashMap<&str, u32> = self.nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        for e in &self.edges {
            *indegree.entry(e.dst_node.as_str()).or_insert(0) += 1;
            adjacency.entry(e.src_node.as_str()).or_default().push(e.dst_node.as_str());
        }

        let mut ready: BTreeSet<&str> = indegree
            .iter()
            .filter(|(_, &d)| d == 0)
            .map(|(&id, _)| id)
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(&next) = ready.iter().next() {
            ready.remove(next);
            order.push(next.to_string());
            if let Some(successors) = adjacency.get(next) {
                let mut successors = successors.clone();
                successors.sort_by(|a, b| cmp_ids(a, b));
                for succ in successors {
                    let d = indegree.get_mut(succ).expect("edge dst must be a known node");
                    *d -= 1;
                    if *d == 0 {
                        ready.insert(succ);
                    }
                }
            }
        }

        if order.len() != self.nodes.len() {
            // Should be unreachable since detect_cycles already ran, but guards
            // against a node with edges referencing ids outside self.nodes.
            return Err(DagError::CycleDetected(
                self.nodes.iter().map(|n| n.id.clone()).filter(|id| !order.contains(id)).collect(),
            ));
        }
        Ok(order)
    }

    /// DFS with three-color marking (white/gray/black).
    pub fn detect_cycles(&self) -> Result<(), DagError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        for e in &self.edges {
            adjacency.entry(e.src_node.as_str()).or_default().push(e.dst_node.as_str());
        }
        for succs in adjacency.values_mut() {
            succs.sort_by(|a, b| cmp_ids(a, b));
        }

        let mut color: HashMap<&str, Color> = self.nodes.iter().map(|n| (n.id.as_str(), Color::White)).collect();
        let mut ids: Vec<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        ids.sort_by(|a, b| cmp_ids(a, b));

        for &start in &ids {
            if color[start] != Color::White {
                continue;
            }
            let mut stack: Vec<(&str, usize)> = vec![(start, 0)];
            color.insert(start, Color::Gray);
            let mut path: Vec<&str> = vec![start];

            while let Some(&mut (node, ref mut idx)) = stack.last_mut() {
                let succs = adjacency.get(node).map(|v| v.as_slice()).unwrap_or(&[]);
                if *idx < succs.len() {
                    let succ = succs[*idx];
                    *idx += 1;
                    match color.get(succ).copied().unwrap_or(Color::White) {
                        Color::White => {
                            color.insert(succ, Color::Gray);
                            stack.push((succ, 0));
                            path.push(succ);
                        }
                        Color::Gray => {
                            let start_idx = path.iter().position(|&n| n == succ).unwrap_or(0);
                            let mut cycle: Vec<String> = path[start_idx..].iter().map(|s| s.to_string()).collect();
                            cycle.push(succ.to_string());
                            return Err(DagError::CycleDetected(cycle));
                        }
                        Color::Black => {}
                    }
                } else {
                    stack.pop();
                    path.pop();
                    color.insert(node, Color::Black);
                }
            }
        }
        Ok(())
    }

    /// `SHA-256(canonical({nodes: [...sorted by id...], edges: [...sorted lex...]}))`.
    pub fn fingerprint(&self) -> Result<String, DagError> {
        let mut nodes = self.nodes.clone();
        nodes.sort_by(|a, b| cmp_ids(&a.id, &b.id));
        let edges: Vec<&Edge> = self.edges.iter().collect();

        #[derive(Serialize)]
        struct FingerprintBasis<'a> {
            nodes: Vec<Node>,
            edges: Vec<&'a Edge>,
        }

        let basis = FingerprintBasis { nodes, edges };
        Ok(sha256_canonical(&basis)?)
    }

    /// The execution id for this DAG within a given workspace:
    /// `SHA-256(canonical(DAG) || workspace_id)`.
    pub fn execution_id(&self, workspace_id: &str) -> Result<String, DagError> {
        let fp = self.fingerprint()?;
        let mut combined = fp.into_bytes();
        combined.extend_from_slice(workspace_id.as_bytes());
        Ok(mtb_io::hasher::sha256_hex(&combined))
    }

    /// Node ids with no incoming edge on any declared input port — these are
    /// source nodes, resolved from the ingest table or node config instead of
    /// an upstream output.
    pub fn source_nodes(&self) -> Vec<&str> {
        let wired: HashSet<(&str, &str)> =
            self.edges.iter().map(|e| (e.dst_node.as_str(), e.dst_port.as_str())).collect();
        self.nodes
            .iter()
            .filter(|n| n.inputs.iter().any(|p| !wired.contains(&(n.id.as_str(), p.as_str()))))
            .map(|n| n.id.as_str())
            .collect()
    }

    /// Input ports on `node_id` with no incoming edge, in declaration order.
    pub fn unwired_inputs(&self, node_id: &str) -> Vec<String> {
        let Some(node) = self.node(node_id) else { return Vec::new() };
        let wired: BTreeSet<&str> = self
            .edges
            .iter()
            .filter(|e| e.dst_node == node_id)
            .map(|e| e.dst_port.as_str())
            .collect();
        node.inputs.iter().filter(|p| !wired.contains(p.as_str())).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, inputs: &[&str], outputs: &[&str]) -> Node {
        Node {
            id: id.to_string(),
            node_type: "passthrough".to_string(),
            config: serde_json::json!({}),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn edge(sn: &str, sp: &str, dn: &str, dp: &str) -> Edge {
        Edge { src_node: sn.to_string(), src_port: sp.to_string(), dst_node: dn.to_string(), dst_port: dp.to_string() }
    }

    #[test]
    fn duplicate_edges_collapse() {
        let mut dag = Dag::new("d");
        dag.add_node(node("a", &[], &["out"])).unwrap();
        dag.add_node(node("b", &["in"], &[])).unwrap();
        dag.add_edge(edge("a", "out", "b", "in")).unwrap();
        dag.add_edge(edge("a", "out", "b", "in")).unwrap();
        assert_eq!(dag.edges().count(), 1);
    }

    #[test]
    fn topo_order_breaks_ties_lexicographically() {
        let mut dag = Dag::new("d");
        dag.add_node(node("c", &[], &["out"])).unwrap();
        dag.add_node(node("b", &[], &["out"])).unwrap();
        dag.add_node(node("a", &[], &["out"])).unwrap();
        let order = dag.topo_order().unwrap();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn cycle_is_detected() {
        let mut dag = Dag::new("d");
        dag.add_node(node("a", &["in"], &["out"])).unwrap();
        dag.add_node(node("b", &["in"], &["out"])).unwrap();
        dag.add_edge(edge("a", "out", "b", "in")).unwrap();
        dag.add_edge(edge("b", "out", "a", "in")).unwrap();
        assert!(matches!(dag.detect_cycles(), Err(DagError::CycleDetected(_))));
        assert!(matches!(dag.topo_order(), Err(DagError::CycleDetected(_))));
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let mut dag1 = Dag::new("d");
        dag1.add_node(node("a", &[], &["out"])).unwrap();
        let mut dag2 = Dag::new("d");
        dag2.add_node(node("a", &[], &["out"])).unwrap();
        assert_eq!(dag1.fingerprint().unwrap(), dag2.fingerprint().unwrap());
    }

    #[test]
    fn source_nodes_have_no_incoming_edge() {
        let mut dag = Dag::new("d");
        dag.add_node(node("a", &[], &["out"])).unwrap();
        dag.add_node(node("b", &["in"], &["out"])).unwrap();
        dag.add_edge(edge("a", "out", "b", "in")).unwrap();
        assert_eq!(dag.source_nodes(), vec!["a"]);
    }
}
