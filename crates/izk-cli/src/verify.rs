//! # Verify and Inspect Subcommands
//!
//! `verify` needs only the verification key and manifest. `inspect`
//! prints the artifact manifest and, optionally, the decoded signals of an
//! envelope without verifying it.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use izk_adapter::{AdapterError, EnvelopeVerifier, VerificationPolicy};
use izk_core::IdentityNumber;
use izk_crypto::IssuerPublicKey;
use izk_zkp::{CircuitShape, ProofEnvelope, PublicParams, SetupManager};
use serde_json::json;

use crate::{read_json, resolve_now, write_json, CliContext};

/// Arguments for `izk verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Proof envelope JSON.
    #[arg(value_name = "ENVELOPE")]
    pub envelope: PathBuf,
    /// Only accept proofs against this issuer key (hex).
    #[arg(long)]
    pub trusted_issuer: Option<String>,
    /// Only accept proofs for this identity number.
    #[arg(long)]
    pub identity: Option<String>,
    /// Verify as of this time (ISO 8601).
    #[arg(long)]
    pub now: Option<String>,
}

/// Arguments for `izk inspect`.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Also decode this envelope's public signals.
    #[arg(long)]
    pub envelope: Option<PathBuf>,
}

/// Execute `izk verify`. Exit `0` when the proof is valid and acceptable.
pub fn run_verify(args: &VerifyArgs, ctx: &CliContext) -> Result<u8> {
    let now = resolve_now(args.now.as_deref())?;
    let envelope: ProofEnvelope = read_json(&args.envelope)?;
    let params = PublicParams::from_env().context("invalid public parameters in environment")?;

    let mut policy = VerificationPolicy::from_params(&params);
    if let Some(hex) = &args.trusted_issuer {
        let key = IssuerPublicKey::from_hex(hex.trim()).context("invalid --trusted-issuer key")?;
        policy = policy.with_trusted_issuer(key);
    }
    let identity = args
        .identity
        .as_deref()
        .map(IdentityNumber::new)
        .transpose()
        .context("invalid --identity")?;

    let artifacts = SetupManager::new(ctx.artifacts_dir.clone())
        .load_verification()
        .context("failed to load verification artifacts")?;
    let verifier = EnvelopeVerifier::new(Arc::new(artifacts), policy);

    match verifier.verify(&envelope, now, identity.as_ref()) {
        Ok(response) => {
            write_json(None, &response)?;
            Ok(0)
        }
        Err(e @ (AdapterError::InvalidProof | AdapterError::PolicyViolation(_))) => {
            println!("FAIL: {e}");
            Ok(1)
        }
        Err(e) => Err(e).context("verification could not complete"),
    }
}

/// Execute `izk inspect`.
pub fn run_inspect(args: &InspectArgs, ctx: &CliContext) -> Result<u8> {
    let shape = CircuitShape::current().context("failed to compile circuit")?;
    let manager = SetupManager::new(ctx.artifacts_dir.clone());
    let manifest = if manager.is_initialized() {
        Some(manager.read_manifest()?)
    } else {
        None
    };

    let mut report = json!({
        "circuit": {
            "id": izk_zkp::circuit::CIRCUIT_ID,
            "version": izk_zkp::circuit::CIRCUIT_VERSION,
            "fingerprint": shape.fingerprint,
            "constraints": shape.constraint_count,
            "public_inputs": shape.public_input_count,
            "witness_variables": shape.witness_count,
        },
        "artifacts": manifest,
        "artifacts_current": manifest.as_ref().map(|m| m.fingerprint == shape.fingerprint),
    });

    if let Some(path) = &args.envelope {
        let envelope: ProofEnvelope = read_json(path)?;
        let decoded = envelope
            .public_signals
            .decode()
            .context("envelope signals do not decode")?;
        report["envelope"] = json!({
            "circuit_id": envelope.circuit_id,
            "fingerprint": envelope.fingerprint,
            "classification": decoded.classification,
            "is_signature_valid": decoded.is_signature_valid,
            "is_data_authentic": decoded.is_data_authentic,
            "max_signature_age_seconds": decoded.max_signature_age_seconds,
            "reference_time": decoded.reference_time,
        });
    }

    write_json(None, &report)?;
    Ok(0)
}
