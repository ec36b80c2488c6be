//! mtb_engine — evidence recorder, execution engine, policy engine, state
//! machine, and format-validator registry for MK10-PRO.

use thiserror::Error;

pub mod recorder;
pub mod engine;
pub mod policy;
pub mod state;
pub mod validators;

pub use recorder::{EvidenceEvent, EvidenceLog, EvidenceRecorder, EventKind, IntegrityProof};
pub use engine::Engine;
pub use policy::PolicyEngine;
pub use state::StateMachine;
pub use validators::{FormatValidator, ValidationResult, ValidatorRegistry};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("log is frozen")]
    LogFrozen,

    #[error("nondeterministic node: {0}")]
    NondeterministicNode(String),

    #[error("rule violation: {0}")]
    RuleViolation(String),

    #[error("invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("execution cancelled")]
    Cancelled,

    #[error(transparent)]
    Dag(#[from] mtb_dag::DagError),

    #[error(transparent)]
    Io(#[from] mtb_io::IoError),

    #[error(transparent)]
    Core(#[from] mtb_core::CoreError),
}
