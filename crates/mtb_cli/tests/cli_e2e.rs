//! From-the-outside conformance checks against the built `mtb` binary: only
//! files on disk and exit codes, no internal crate access. Grounded on the
//! teacher's `tests/vm_tst_gates.rs` — loading a rendered artifact and
//! independently checking it rather than calling into the pipeline that
//! produced it.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

const ABC_HASH: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

fn mtb_cmd() -> Command {
    Command::cargo_bin("mtb").unwrap()
}

fn write_manifest(dir: &std::path::Path) {
    fs::write(dir.join("a.bin"), b"abc").unwrap();
    let manifest = serde_json::json!({
        "assets": [{
            "content_address": ABC_HASH,
            "path": "a.bin",
            "hash": ABC_HASH,
            "size": 3,
        }]
    });
    fs::write(dir.join("manifest.json"), serde_json::to_vec(&manifest).unwrap()).unwrap();
}

fn write_identity_dag(dir: &std::path::Path) {
    let dag = serde_json::json!({
        "id": "demo",
        "nodes": [{
            "id": "a",
            "type": "passthrough",
            "config": { "in": ABC_HASH },
        }],
        "edges": [],
    });
    fs::write(dir.join("dag.json"), serde_json::to_vec(&dag).unwrap()).unwrap();
}

#[test]
fn ingest_verifies_a_well_formed_manifest() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path());

    mtb_cmd()
        .args(["ingest", "--manifest"])
        .arg(dir.path().join("manifest.json"))
        .args(["--base-dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"assets_verified\":1"));
}

#[test]
fn ingest_rejects_a_digest_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.bin"), b"not abc").unwrap();
    let manifest = serde_json::json!({
        "assets": [{ "content_address": ABC_HASH, "path": "a.bin", "hash": ABC_HASH, "size": 3 }]
    });
    fs::write(dir.path().join("manifest.json"), serde_json::to_vec(&manifest).unwrap()).unwrap();

    mtb_cmd()
        .args(["ingest", "--manifest"])
        .arg(dir.path().join("manifest.json"))
        .args(["--base-dir"])
        .arg(dir.path())
        .assert()
        .code(1);
}

#[test]
fn execute_then_verify_round_trips_a_sealed_bundle() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path());
    write_identity_dag(dir.path());
    let out = dir.path().join("out.mtb.json");

    mtb_cmd()
        .args(["execute", "--dag"])
        .arg(dir.path().join("dag.json"))
        .args(["--manifest"])
        .arg(dir.path().join("manifest.json"))
        .args(["--base-dir"])
        .arg(dir.path())
        .args(["--workspace-id", "ws1", "--out"])
        .arg(&out)
        .assert()
        .success();

    assert!(out.exists());

    let rules = serde_json::json!({ "rules": [] });
    let rules_path = dir.path().join("rules.json");
    fs::write(&rules_path, serde_json::to_vec(&rules).unwrap()).unwrap();

    mtb_cmd()
        .args(["verify", "--mtb"])
        .arg(&out)
        .args(["--rules"])
        .arg(&rules_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"valid\":true"));
}

#[test]
fn verify_rejects_a_tampered_bundle() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path());
    write_identity_dag(dir.path());
    let out = dir.path().join("out.mtb.json");

    mtb_cmd()
        .args(["execute", "--dag"])
        .arg(dir.path().join("dag.json"))
        .args(["--manifest"])
        .arg(dir.path().join("manifest.json"))
        .args(["--base-dir"])
        .arg(dir.path())
        .args(["--workspace-id", "ws1", "--out"])
        .arg(&out)
        .assert()
        .success();

    let mut value: serde_json::Value = serde_json::from_slice(&fs::read(&out).unwrap()).unwrap();
    value["approval_events"] = serde_json::json!([{"tampered": true}]);
    fs::write(&out, serde_json::to_vec(&value).unwrap()).unwrap();

    let rules_path = dir.path().join("rules.json");
    fs::write(&rules_path, serde_json::to_vec(&serde_json::json!({ "rules": [] })).unwrap()).unwrap();

    mtb_cmd()
        .args(["verify", "--mtb"])
        .arg(&out)
        .args(["--rules"])
        .arg(&rules_path)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("\"valid\":false"));
}

#[test]
fn promote_candidate_to_release_is_rejected_without_validation_evidence() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path());
    write_identity_dag(dir.path());
    let out = dir.path().join("out.mtb.json");

    mtb_cmd()
        .args(["execute", "--dag"])
        .arg(dir.path().join("dag.json"))
        .args(["--manifest"])
        .arg(dir.path().join("manifest.json"))
        .args(["--base-dir"])
        .arg(dir.path())
        .args(["--workspace-id", "ws1", "--out"])
        .arg(&out)
        .assert()
        .success();

    let rules = serde_json::json!({
        "rules": [{ "id": "r1", "predicate_kind": "validation_required", "parameters": {} }]
    });
    let rules_path = dir.path().join("rules.json");
    fs::write(&rules_path, serde_json::to_vec(&rules).unwrap()).unwrap();

    mtb_cmd()
        .args(["promote", "--mtb"])
        .arg(&out)
        .args(["--rules"])
        .arg(&rules_path)
        .args(["--from", "candidate", "--to", "release"])
        .assert()
        .code(2);
}
