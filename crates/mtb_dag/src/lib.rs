//! mtb_dag — the typed node/edge graph, the node execution contract, and the
//! per-run execution context for MK10-PRO.
//!
//! Operations: `add_node`, `add_edge`, `topo_order`, `detect_cycles`,
//! `fingerprint`. Topological order uses Kahn's algorithm with ties broken
//! by the lexicographic order of node ids. Cycle detection runs DFS with
//! three-color marking.

use thiserror::Error;

pub mod graph;
pub mod node;
pub mod context;

pub use graph::{Dag, Edge, Node};
pub use node::{NodeImpl, NodeRegistry, Passthrough};
pub use context::ExecutionContext;

#[derive(Error, Debug)]
pub enum DagError {
    #[error("cycle detected: {0:?}")]
    CycleDetected(Vec<String>),

    #[error("unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("port mismatch: {0}")]
    PortMismatch(String),

    #[error("duplicate node id: {0}")]
    DuplicateNodeId(String),

    #[error(transparent)]
    Io(#[from] mtb_io::IoError),
}
