//! mtb — the external collaborator around the MK10-PRO core: `ingest`,
//! `execute`, `promote`, `verify`. No business logic lives here beyond
//! invoking the core entry points and reporting their result; the CLI never
//! passes a wall-clock or random value into an `ExecutionContext`.

mod args;

use std::collections::BTreeMap;
use std::path::Path;
use std::process::ExitCode;

use args::{CliError, Command};

use mtb_bundle::{seal, Mtb, MtbBuilder, MtbVerifier};
use mtb_core::state::State;
use mtb_dag::graph::{Dag, Edge, Node};
use mtb_dag::{ExecutionContext, NodeRegistry};
use mtb_engine::recorder::EvidenceLog;
use mtb_engine::{Engine, PolicyEngine, StateMachine};
use mtb_io::dagfile::{load_dag_source, DagSource, RawEdge};
use mtb_io::manifest::load_verify_manifest;
use mtb_io::rules::load_rules;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = args::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::from(0),
        Err(CliError::User(msg)) => {
            tracing::error!(%msg, "user error");
            ExitCode::from(1)
        }
        Err(CliError::VerificationFailure(msg)) => {
            tracing::error!(%msg, "verification failure");
            ExitCode::from(2)
        }
        Err(CliError::Internal(msg)) => {
            tracing::error!(%msg, "internal error");
            ExitCode::from(3)
        }
    }
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Ingest { manifest, base_dir } => cmd_ingest(&manifest, &base_dir),
        Command::Execute { dag, manifest, base_dir, workspace_id, out } => {
            cmd_execute(&dag, &manifest, &base_dir, &workspace_id, &out)
        }
        Command::Promote { mtb, rules, from, to } => cmd_promote(&mtb, &rules, &from, &to),
        Command::Verify { mtb, rules } => cmd_verify(&mtb, &rules),
    }
}

#[tracing::instrument]
fn cmd_ingest(manifest: &Path, base_dir: &Path) -> Result<(), CliError> {
    let resolved = load_verify_manifest(manifest, base_dir)?;
    tracing::info!(assets = resolved.len(), "manifest verified");
    println!("{}", serde_json::json!({ "assets_verified": resolved.len() }));
    Ok(())
}

#[tracing::instrument]
fn cmd_execute(
    dag_path: &Path,
    manifest_path: &Path,
    base_dir: &Path,
    workspace_id: &str,
    out: &Path,
) -> Result<(), CliError> {
    let dag_source = load_dag_source(dag_path)?;
    let dag = build_dag(&dag_source).map_err(CliError::User)?;

    let resolved = load_verify_manifest(manifest_path, base_dir)?;
    let mut ingest_assets = BTreeMap::new();
    for r in &resolved {
        let bytes = std::fs::read(&r.absolute_path)
            .map_err(|e| CliError::User(format!("{}: {e}", r.absolute_path.display())))?;
        ingest_assets.insert(r.asset.content_address.clone(), bytes);
    }
    let manifest = mtb_io::manifest::Manifest { assets: resolved.iter().map(|r| r.asset.clone()).collect() };

    let ctx = ExecutionContext::new(dag.clone(), workspace_id, None, ingest_assets)
        .map_err(CliError::from)?;
    let registry = NodeRegistry::new();
    let engine = Engine::new(&registry);
    let outcome = engine.run(&ctx)?;

    let mtb = MtbBuilder::new(manifest, dag).with_evidence_log(&outcome.evidence_log).build();
    let mtb = seal(mtb)?;
    mtb_io::canonical::write_canonical_file(out, &mtb)?;

    tracing::info!(execution_id = %outcome.execution_id, out = %out.display(), "execution sealed");
    println!("{}", serde_json::json!({ "execution_id": outcome.execution_id, "out": out.display().to_string() }));
    Ok(())
}

#[tracing::instrument]
fn cmd_promote(mtb_path: &Path, rules_path: &Path, from: &str, to: &str) -> Result<(), CliError> {
    let bytes = std::fs::read(mtb_path).map_err(|e| CliError::User(e.to_string()))?;
    let mtb: Mtb = serde_json::from_slice(&bytes).map_err(|e| CliError::User(e.to_string()))?;
    let rules = load_rules(rules_path)?;

    let from_state = parse_state(from)?;
    let to_state = parse_state(to)?;

    let mut events: Vec<_> = mtb.all_evidence().into_iter().cloned().collect();
    events.sort_by_key(|e| e.seq);
    let log = EvidenceLog { events, frozen: true };

    let policy = PolicyEngine::new(rules);
    let sm = StateMachine::new(&policy);
    match sm.attempt_transition(from_state, to_state, &log) {
        Ok((state, outcome)) => {
            println!("{}", serde_json::json!({ "state": state.to_string(), "checks": outcome.checks }));
            Ok(())
        }
        Err(mtb_engine::EngineError::InvalidStateTransition(msg)) => Err(CliError::VerificationFailure(msg)),
        Err(err) => Err(CliError::from(err)),
    }
}

#[tracing::instrument]
fn cmd_verify(mtb_path: &Path, rules_path: &Path) -> Result<(), CliError> {
    let bytes = std::fs::read(mtb_path).map_err(|e| CliError::User(e.to_string()))?;
    let rules = load_rules(rules_path)?;
    let report = MtbVerifier::verify(&bytes, &rules);
    println!("{}", serde_json::to_string(&report).map_err(|e| CliError::Internal(e.to_string()))?);
    if report.valid {
        Ok(())
    } else {
        Err(CliError::VerificationFailure(report.errors.join("; ")))
    }
}

fn parse_state(token: &str) -> Result<State, CliError> {
    match token.to_ascii_uppercase().as_str() {
        "DRAFT" => Ok(State::Draft),
        "CANDIDATE" => Ok(State::Candidate),
        "RELEASE" => Ok(State::Release),
        "ARCHIVED" => Ok(State::Archived),
        other => Err(CliError::User(format!("unknown state: {other}"))),
    }
}

/// Build a validated `Dag` from the wire `DagSource`. The wire format (per
/// the DAG source contract) names only `id`/`type`/`config` per node, not
/// port lists, so ports are taken from `config.inputs`/`config.outputs` when
/// present and default to a single `in`/`out` pair otherwise.
fn build_dag(source: &DagSource) -> Result<Dag, String> {
    let mut dag = Dag::new(source.id.clone());
    for raw in &source.nodes {
        let inputs = string_array(&raw.config, "inputs").unwrap_or_else(|| vec!["in".to_string()]);
        let outputs = string_array(&raw.config, "outputs").unwrap_or_else(|| vec!["out".to_string()]);
        dag.add_node(Node { id: raw.id.clone(), node_type: raw.node_type.clone(), config: raw.config.clone(), inputs, outputs })
            .map_err(|e| e.to_string())?;
    }
    for raw in &source.edges {
        let (src_node, src_port) = RawEdge::parse_endpoint(&raw.from).map_err(|e| e.to_string())?;
        let (dst_node, dst_port) = RawEdge::parse_endpoint(&raw.to).map_err(|e| e.to_string())?;
        dag.add_edge(Edge {
            src_node: src_node.to_string(),
            src_port: src_port.to_string(),
            dst_node: dst_node.to_string(),
            dst_port: dst_port.to_string(),
        })
        .map_err(|e| e.to_string())?;
    }
    dag.check_port_coverage().map_err(|e| e.to_string())?;
    Ok(dag)
}

fn string_array(config: &serde_json::Value, key: &str) -> Option<Vec<String>> {
    config.get(key)?.as_array().map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
}
