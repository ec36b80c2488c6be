//! mtb_core — I/O-free primitives for MK10-PRO.
//!
//! This crate defines the data shapes and pure logic shared by every other
//! crate in the workspace: content addresses, the fixed `State` lifecycle,
//! policy rule/predicate shapes, deterministic time derivation, and stable
//! ordering helpers. Nothing here touches a file, a clock, or a socket —
//! that is `mtb_io`'s job.
//!
//! Serialization derives are gated behind the `serde` feature (on by default).

pub mod errors;
pub mod address;
pub mod ordering;
pub mod time;
pub mod policy;
pub mod state;

pub use errors::CoreError;
pub use address::ContentAddress;
pub use policy::{PolicyCheck, PolicyRule, PredicateKind};
pub use state::State;
pub use time::TimeBase;
