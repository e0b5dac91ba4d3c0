//! # Params Subcommand
//!
//! Creates universal parameter files.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use izk_zkp::setup::MAX_POWER;
use izk_zkp::{CircuitShape, UniversalParams};
use rand_core::OsRng;

/// Arguments for `izk params`.
#[derive(Args, Debug)]
pub struct ParamsArgs {
    #[command(subcommand)]
    pub command: ParamsCommand,
}

/// Params subcommands.
#[derive(Subcommand, Debug)]
pub enum ParamsCommand {
    /// Create a parameter file with a random beacon.
    New {
        /// Capacity exponent: supports circuits up to 2^power terms.
        #[arg(long, default_value_t = 16)]
        power: u32,
        /// Output file.
        #[arg(long, short, default_value = "params.json")]
        out: PathBuf,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Execute `izk params`.
pub fn run_params(args: &ParamsArgs) -> Result<u8> {
    match &args.command {
        ParamsCommand::New { power, out, force } => cmd_new(*power, out, *force),
    }
}

fn cmd_new(power: u32, out: &Path, force: bool) -> Result<u8> {
    if power == 0 || power > MAX_POWER {
        bail!("--power must be between 1 and {MAX_POWER}");
    }
    if out.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", out.display());
    }
    let params = UniversalParams::generate(power, &mut OsRng).context("failed to create parameters")?;
    params.save(out).context("failed to write parameter file")?;

    let shape = CircuitShape::current().context("failed to compile circuit")?;
    let fits = params.capacity() >= shape.required_capacity();

    println!("OK: wrote {}", out.display());
    println!("  capacity: 2^{power} = {}", params.capacity());
    println!(
        "  circuit needs: {} ({})",
        shape.required_capacity(),
        if fits { "fits" } else { "TOO SMALL" }
    );
    println!("  digest: {}", params.digest()?);
    Ok(0)
}
