//! Deterministic, offline CLI argument parsing.
//!
//! No path is ever allowed to look like a URL — ingest is local-files-only,
//! matching the core's "no network" invariant. Nothing here consults the
//! wall clock or an RNG; timestamps are always derived inside the core.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(name = "mtb", about = "Offline, deterministic provenance engine for MK10-PRO")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load and digest-verify an ingest manifest against a base directory.
    Ingest {
        #[arg(long)]
        manifest: PathBuf,
        #[arg(long)]
        base_dir: PathBuf,
    },
    /// Run a DAG against an ingest manifest and write a sealed MTB.
    Execute {
        #[arg(long)]
        dag: PathBuf,
        #[arg(long)]
        manifest: PathBuf,
        #[arg(long)]
        base_dir: PathBuf,
        #[arg(long)]
        workspace_id: String,
        #[arg(long)]
        out: PathBuf,
    },
    /// Attempt a lifecycle transition against an MTB's embedded evidence.
    Promote {
        #[arg(long)]
        mtb: PathBuf,
        #[arg(long)]
        rules: PathBuf,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
    /// Hostile-verify a sealed MTB against a public rule set.
    Verify {
        #[arg(long)]
        mtb: PathBuf,
        #[arg(long)]
        rules: PathBuf,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("user error: {0}")]
    User(String),

    #[error("verification failure: {0}")]
    VerificationFailure(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<mtb_io::IoError> for CliError {
    fn from(e: mtb_io::IoError) -> Self {
        CliError::User(e.to_string())
    }
}

impl From<mtb_dag::DagError> for CliError {
    fn from(e: mtb_dag::DagError) -> Self {
        CliError::User(e.to_string())
    }
}

impl From<mtb_engine::EngineError> for CliError {
    fn from(e: mtb_engine::EngineError) -> Self {
        CliError::Internal(e.to_string())
    }
}

impl From<mtb_bundle::BundleError> for CliError {
    fn from(e: mtb_bundle::BundleError) -> Self {
        CliError::Internal(e.to_string())
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
