//! Shared error vocabulary for the core-domain types in this crate.
//!
//! This is deliberately small: `mtb_core` only validates shapes (hex digest
//! length, known predicate kinds, valid state transitions). I/O, canonicalization
//! and engine-level failures have their own error enums further up the stack.

use thiserror::Error;

#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum CoreError {
    #[error("invalid content address: {0}")]
    InvalidAddress(String),

    #[error("unknown predicate kind: {0}")]
    UnknownRule(String),

    #[error("invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("domain value out of range: {0}")]
    DomainOutOfRange(&'static str),
}
