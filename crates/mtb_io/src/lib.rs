//! crates/mtb_io/src/lib.rs
//! Canonicalizer, hasher, signer/verifier, and the declarative loaders
//! (rule file, DAG source, ingest manifest) for MK10-PRO.
//!
//! - No inline implementations: we re-export the file modules to avoid drift.
//! - Shared error type (`IoError`) with `From` conversions used across modules.
//! - Public surface kept stable; details live in submodules.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Unified error for mtb_io (used by canonical/hasher/signer/rules/dagfile/manifest).
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem / path errors (create_dir_all, rename, fsync, etc.)
    #[error("io/path error: {0}")]
    Path(String),

    /// JSON serialization/deserialization errors.
    #[error("json error: {0}")]
    Json(String),

    /// Hashing-related errors (e.g., feature disabled, read failures).
    #[error("hash error: {0}")]
    Hash(String),

    /// A value cannot be put into canonical form (floats, unsupported types).
    #[error("cannot canonicalize: {0}")]
    NonCanonicalizable(String),

    /// Signing/verification failures.
    #[error("signing error: {0}")]
    Sign(String),

    /// A rule file named a predicate kind outside the fixed enumerated set.
    #[error("unknown rule: {0}")]
    UnknownRule(String),

    /// Generic validation / invariants.
    #[error("invalid: {0}")]
    Invalid(String),
}

pub type IoResult<T> = Result<T, IoError>;

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        IoError::Json(e.to_string())
    }
}

/* ---------------- Public modules (single source of truth) ---------------- */

pub mod canonical;
pub mod hasher;
#[cfg(feature = "sign")]
pub mod signer;
pub mod rules;
pub mod dagfile;
pub mod manifest;

/// Returns true if `s` looks like a URL (any `<scheme>://`, including `file://`).
/// Ingest manifests and DAG sources are local-only; this rejects remote schemes early.
#[inline]
pub fn looks_like_url_strict(s: &str) -> bool {
    s.trim().contains("://")
}

pub mod prelude {
    pub use crate::{IoError, IoResult, looks_like_url_strict};

    pub use crate::canonical;
    pub use crate::hasher;
    pub use crate::manifest;
    pub use crate::rules;
    pub use crate::dagfile;

    pub use crate::canonical::{canonical_bytes, canonical_decode};
    pub use crate::hasher::sha256_hex;
}
