//! # Issuer Subcommand
//!
//! The signer side of the income authority, for fixtures and demos: key
//! generation and record signing.
//!
//! ## Security Invariant
//!
//! The secret key file is written once and never echoed; only the public
//! key is printed.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use izk_adapter::IssuerRecordJson;
use izk_core::Timestamp;
use izk_crypto::IssuerKeyPair;
use rand_core::OsRng;
use zeroize::Zeroizing;

use crate::{resolve_now, write_json};

/// Arguments for `izk issuer`.
#[derive(Args, Debug)]
pub struct IssuerArgs {
    #[command(subcommand)]
    pub command: IssuerCommand,
}

/// Issuer subcommands.
#[derive(Subcommand, Debug)]
pub enum IssuerCommand {
    /// Generate a Baby Jubjub issuer key pair.
    Keygen {
        /// Output directory for the key files.
        #[arg(long, short, default_value = ".")]
        output: PathBuf,
        /// Prefix for the key file names.
        #[arg(long, default_value = "issuer")]
        prefix: String,
    },

    /// Produce a signed issuer record.
    Sign {
        /// Secret key file (hex).
        #[arg(long)]
        key: PathBuf,
        /// Identity card number.
        #[arg(long)]
        ic: String,
        /// Monthly income, whole currency units.
        #[arg(long)]
        income: u32,
        /// Citizen name.
        #[arg(long)]
        name: String,
        /// Issuing authority.
        #[arg(long, default_value = "LHDN")]
        issuer: String,
        /// Issue time, ISO 8601 (defaults to now).
        #[arg(long)]
        issued_at: Option<String>,
        /// Output file (stdout if omitted).
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
}

/// Execute `izk issuer`.
pub fn run_issuer(args: &IssuerArgs) -> Result<u8> {
    match &args.command {
        IssuerCommand::Keygen { output, prefix } => cmd_keygen(output, prefix),
        IssuerCommand::Sign {
            key,
            ic,
            income,
            name,
            issuer,
            issued_at,
            out,
        } => {
            let issued_at = resolve_now(issued_at.as_deref())?;
            cmd_sign(key, ic, *income, name, issuer, issued_at, out.as_deref())
        }
    }
}

fn cmd_keygen(output_dir: &Path, prefix: &str) -> Result<u8> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output directory: {}", output_dir.display()))?;

    let key = IssuerKeyPair::generate(&mut OsRng);
    let public_hex = key.public_key().to_hex();
    let sk_path = output_dir.join(format!("{prefix}.key"));
    let pk_path = output_dir.join(format!("{prefix}.pub"));

    std::fs::write(&sk_path, key.secret_hex().as_bytes())
        .with_context(|| format!("failed to write secret key: {}", sk_path.display()))?;
    std::fs::write(&pk_path, &public_hex)
        .with_context(|| format!("failed to write public key: {}", pk_path.display()))?;

    println!("OK: generated issuer key pair");
    println!("  Secret key: {}", sk_path.display());
    println!("  Public key: {}", pk_path.display());
    println!("  Public key (hex): {public_hex}");
    Ok(0)
}

/// Load an issuer secret key file.
pub fn load_key(path: &Path) -> Result<IssuerKeyPair> {
    if !path.exists() {
        bail!("secret key file not found: {}", path.display());
    }
    let hex = Zeroizing::new(
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read secret key: {}", path.display()))?,
    );
    IssuerKeyPair::from_secret_hex(hex.trim()).context("invalid issuer secret key")
}

fn cmd_sign(
    key_path: &Path,
    ic: &str,
    income: u32,
    name: &str,
    issuer: &str,
    issued_at: Timestamp,
    out: Option<&Path>,
) -> Result<u8> {
    let key = load_key(key_path)?;
    let record = IssuerRecordJson::signed(&key, ic, income, name, issued_at, issuer)
        .context("failed to sign record")?;
    write_json(out, &record)?;
    if let Some(out) = out {
        println!("OK: signed record written to {}", out.display());
    }
    Ok(0)
}
