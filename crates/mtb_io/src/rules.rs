//! Declarative policy rule-file loader.
//!
//! Configuration may point to a rule file; it can never inline rules with
//! different semantics, and the loader rejects any predicate kind outside
//! the fixed enumerated set with `UnknownRule`.

use std::path::Path;

use mtb_core::policy::{PolicyRule, PredicateKind};
use serde::Deserialize;

use crate::{IoError, IoResult};

#[derive(Deserialize)]
struct RawRule {
    id: String,
    predicate_kind: String,
    #[serde(default)]
    parameters: std::collections::BTreeMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct RawRuleFile {
    rules: Vec<RawRule>,
}

/// Parse a rule file's JSON bytes into validated `PolicyRule`s.
pub fn parse_rules(bytes: &[u8]) -> IoResult<Vec<PolicyRule>> {
    let raw: RawRuleFile = serde_json::from_slice(bytes)?;
    raw.rules
        .into_iter()
        .map(|r| {
            let predicate_kind = PredicateKind::parse(&r.predicate_kind)
                .ok_or_else(|| IoError::UnknownRule(r.predicate_kind.clone()))?;
            Ok(PolicyRule { id: r.id, predicate_kind, parameters: r.parameters })
        })
        .collect()
}

/// Load and parse a rule file from disk.
pub fn load_rules(path: &Path) -> IoResult<Vec<PolicyRule>> {
    if crate::looks_like_url_strict(&path.to_string_lossy()) {
        return Err(IoError::Path(format!("rule file path looks like a URL: {}", path.display())));
    }
    let bytes = std::fs::read(path)?;
    parse_rules(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_predicate() {
        let json = br#"{"rules":[{"id":"r1","predicate_kind":"made_up_required"}]}"#;
        assert!(matches!(parse_rules(json), Err(IoError::UnknownRule(_))));
    }

    #[test]
    fn parses_known_predicates() {
        let json = br#"{"rules":[
            {"id":"r1","predicate_kind":"evidence_required"},
            {"id":"r2","predicate_kind":"validation_required","parameters":{"format":"DCP"}}
        ]}"#;
        let rules = parse_rules(json).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].id, "r1");
        assert_eq!(rules[1].parameters.get("format").unwrap(), "DCP");
    }
}
