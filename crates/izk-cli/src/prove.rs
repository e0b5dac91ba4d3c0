//! # Witness, Prove, and Classify Subcommands
//!
//! `witness` turns an issuer record into a circuit input file; `prove`
//! turns an input file into a proof envelope; `classify` does both and
//! prints the bracket label.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use izk_adapter::{IncomeClassifier, IssuerRecordJson, VerificationPolicy};
use izk_core::Timestamp;
use izk_zkp::{CircuitInputFile, Groth16Engine, PublicParams, SetupManager, WitnessBuilder};

use crate::{read_json, resolve_now, write_json, CliContext};

/// Arguments for `izk witness`.
#[derive(Args, Debug)]
pub struct WitnessArgs {
    /// Issuer record JSON.
    #[arg(value_name = "RECORD")]
    pub record: PathBuf,
    /// Output file (stdout if omitted).
    #[arg(long, short)]
    pub out: Option<PathBuf>,
    /// Evaluate freshness at this time instead of now (ISO 8601).
    #[arg(long)]
    pub now: Option<String>,
}

/// Arguments for `izk prove`.
#[derive(Args, Debug)]
pub struct ProveArgs {
    /// Circuit input file produced by `izk witness`.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
    /// Output envelope file (stdout if omitted).
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

/// Arguments for `izk classify`.
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Issuer record JSON.
    #[arg(value_name = "RECORD")]
    pub record: PathBuf,
    /// Also write the proof envelope here.
    #[arg(long)]
    pub envelope_out: Option<PathBuf>,
    /// Evaluate freshness at this time instead of now (ISO 8601).
    #[arg(long)]
    pub now: Option<String>,
}

/// Execute `izk witness`.
pub fn run_witness(args: &WitnessArgs) -> Result<u8> {
    let now = resolve_now(args.now.as_deref())?;
    let file = build_input_file(&args.record, now)?;
    write_json(args.out.as_deref(), &file)?;
    Ok(0)
}

fn build_input_file(record_path: &Path, now: Timestamp) -> Result<CircuitInputFile> {
    let text = std::fs::read_to_string(record_path)
        .with_context(|| format!("failed to read {}", record_path.display()))?;
    let record = IssuerRecordJson::parse(&text)?.to_record()?;
    let params = PublicParams::from_env().context("invalid public parameters in environment")?;
    let inputs = WitnessBuilder::new(params)
        .build(&record, now)
        .context("issuer record rejected")?;
    Ok(CircuitInputFile::from_inputs(&inputs))
}

/// Execute `izk prove`.
pub fn run_prove(args: &ProveArgs, ctx: &CliContext) -> Result<u8> {
    let file: CircuitInputFile = read_json(&args.input)?;
    let inputs = file.to_inputs().context("invalid circuit input file")?;
    let artifacts = SetupManager::new(ctx.artifacts_dir.clone())
        .load()
        .context("failed to load proving artifacts (run `izk setup` first)")?;
    let envelope = Groth16Engine::new()
        .prove_envelope(&artifacts, &inputs)
        .context("proof generation failed")?;
    write_json(args.out.as_deref(), &envelope)?;
    Ok(0)
}

/// Execute `izk classify`.
pub fn run_classify(args: &ClassifyArgs, ctx: &CliContext) -> Result<u8> {
    let now = resolve_now(args.now.as_deref())?;
    let text = std::fs::read_to_string(&args.record)
        .with_context(|| format!("failed to read {}", args.record.display()))?;
    let params = PublicParams::from_env().context("invalid public parameters in environment")?;
    let artifacts = SetupManager::new(ctx.artifacts_dir.clone())
        .load()
        .context("failed to load proving artifacts (run `izk setup` first)")?;
    let classifier = IncomeClassifier::new(
        Arc::new(artifacts),
        params,
        VerificationPolicy::from_params(&params),
    );
    let out = classifier.classify_json(&text, now)?;
    if let Some(path) = &args.envelope_out {
        write_json(Some(path.as_path()), &out.envelope)?;
    }
    write_json(None, &out.response)?;
    Ok(0)
}
