//! Pluggable, format-tagged artifact validators.
//!
//! Most mastering formats (DCP, IMF, MXF wrappers and the like) need an
//! external, format-specific conformance tool; this crate ships only the
//! one structural check every artifact set can be held to regardless of
//! format, and a registry external validators plug into by tag.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// The outcome of running one validator against one artifact set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidationResult {
    pub format: String,
    pub passed: bool,
    pub details: serde_json::Value,
}

impl ValidationResult {
    pub fn pass(format: impl Into<String>) -> Self {
        Self { format: format.into(), passed: true, details: serde_json::Value::Null }
    }

    pub fn fail(format: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { format: format.into(), passed: false, details: serde_json::json!({ "reason": reason.into() }) }
    }
}

/// An artifact set presented for validation: content address -> bytes.
pub type ArtifactSet = BTreeMap<String, Vec<u8>>;

pub trait FormatValidator: Send + Sync {
    fn validate(&self, artifacts: &ArtifactSet) -> ValidationResult;
}

/// Confirms every declared content address in the set actually hashes to
/// itself. Does not understand any mastering-specific container format;
/// format-specific validators are registered separately under their own tag.
pub struct StructuralConformanceValidator;

impl FormatValidator for StructuralConformanceValidator {
    fn validate(&self, artifacts: &ArtifactSet) -> ValidationResult {
        for (address, bytes) in artifacts {
            let digest = mtb_io::hasher::sha256_hex(bytes);
            let expected = address.split('.').next().unwrap_or(address.as_str());
            if digest != expected {
                return ValidationResult::fail(
                    "structural",
                    format!("content address {address} does not match sha256 of its bytes ({digest})"),
                );
            }
        }
        ValidationResult::pass("structural")
    }
}

/// Validators registered by format tag. Lookup is by exact tag match;
/// there is no fallback or wildcard validator.
pub struct ValidatorRegistry {
    validators: BTreeMap<String, Arc<dyn FormatValidator>>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        let mut validators: BTreeMap<String, Arc<dyn FormatValidator>> = BTreeMap::new();
        validators.insert("structural".to_string(), Arc::new(StructuralConformanceValidator));
        Self { validators }
    }

    pub fn register(&mut self, format: impl Into<String>, validator: Arc<dyn FormatValidator>) {
        self.validators.insert(format.into(), validator);
    }

    pub fn get(&self, format: &str) -> Option<&Arc<dyn FormatValidator>> {
        self.validators.get(format)
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_validator_passes_matching_addresses() {
        let mut artifacts = ArtifactSet::new();
        artifacts.insert(
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad".to_string(),
            b"abc".to_vec(),
        );
        let result = StructuralConformanceValidator.validate(&artifacts);
        assert!(result.passed);
    }

    #[test]
    fn structural_validator_fails_mismatched_address() {
        let mut artifacts = ArtifactSet::new();
        artifacts.insert("deadbeef".to_string(), b"abc".to_vec());
        let result = StructuralConformanceValidator.validate(&artifacts);
        assert!(!result.passed);
    }

    #[test]
    fn registry_resolves_structural_and_rejects_unknown_tag() {
        let registry = ValidatorRegistry::new();
        assert!(registry.get("structural").is_some());
        assert!(registry.get("dcp").is_none());
    }
}
