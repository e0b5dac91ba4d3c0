//! # izk CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use izk_cli::issuer::{run_issuer, IssuerArgs};
use izk_cli::params::{run_params, ParamsArgs};
use izk_cli::prove::{run_classify, run_prove, run_witness, ClassifyArgs, ProveArgs, WitnessArgs};
use izk_cli::setup::{run_setup, SetupArgs};
use izk_cli::verify::{run_inspect, run_verify, InspectArgs, VerifyArgs};
use izk_cli::CliContext;

/// Zero-knowledge income bracket classification.
///
/// Generates universal parameters and Groth16 artifacts, turns signed
/// issuer records into proofs of a bracket label, and verifies those proofs
/// without ever seeing the income.
#[derive(Parser, Debug)]
#[command(name = "izk", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Artifacts directory (overrides IZK_ARTIFACTS_DIR).
    #[arg(long, global = true)]
    artifacts_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Universal parameter files.
    Params(ParamsArgs),

    /// One-time circuit setup into the artifacts directory.
    Setup(SetupArgs),

    /// Issuer key generation and record signing.
    Issuer(IssuerArgs),

    /// Build a circuit input file from a signed issuer record.
    Witness(WitnessArgs),

    /// Prove a circuit input file.
    Prove(ProveArgs),

    /// Verify a proof envelope.
    Verify(VerifyArgs),

    /// Witness, prove, and self-verify in one step.
    Classify(ClassifyArgs),

    /// Show the circuit shape and artifact manifest.
    Inspect(InspectArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let ctx = CliContext::resolve(cli.artifacts_dir);
    tracing::debug!(artifacts_dir = %ctx.artifacts_dir.display(), "resolved artifacts directory");

    let result = match cli.command {
        Commands::Params(args) => run_params(&args),
        Commands::Setup(args) => run_setup(&args, &ctx),
        Commands::Issuer(args) => run_issuer(&args),
        Commands::Witness(args) => run_witness(&args),
        Commands::Prove(args) => run_prove(&args, &ctx),
        Commands::Verify(args) => run_verify(&args, &ctx),
        Commands::Classify(args) => run_classify(&args, &ctx),
        Commands::Inspect(args) => run_inspect(&args, &ctx),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
