//! # Setup Subcommand
//!
//! Runs the one-time Groth16 setup into the artifacts directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use izk_zkp::{SetupManager, UniversalParams};

use crate::CliContext;

/// Arguments for `izk setup`.
#[derive(Args, Debug)]
pub struct SetupArgs {
    /// Universal parameter file.
    #[arg(long, default_value = "params.json")]
    pub params: PathBuf,
}

/// Execute `izk setup`.
pub fn run_setup(args: &SetupArgs, ctx: &CliContext) -> Result<u8> {
    let params = UniversalParams::load(&args.params)
        .with_context(|| format!("failed to load {}", args.params.display()))?;
    let manager = SetupManager::new(ctx.artifacts_dir.clone());
    let artifacts = manager.generate(&params).context("setup failed")?;
    let manifest = artifacts.manifest();

    println!("OK: artifacts ready in {}", ctx.artifacts_dir.display());
    println!("  circuit: {} v{}", manifest.circuit_id, manifest.circuit_version);
    println!("  fingerprint: {}", manifest.fingerprint);
    println!("  constraints: {}", manifest.constraint_count);
    println!("  public inputs: {}", manifest.public_input_count);
    Ok(0)
}
