//! # Classification Pipeline
//!
//! [`IncomeClassifier`] runs the full prover-side flow:
//!
//! ```text
//! issuer JSON → SignedIncomeRecord → CircuitInputs → proof + signals
//!             → self-verification → policy → AdapterResponse
//! ```
//!
//! [`EnvelopeVerifier`] is the verifier-side half. It needs only the
//! verification artifacts, so relying parties never load a proving key.

use std::sync::Arc;
use std::time::Instant;

use izk_core::{IdentityNumber, Timestamp};
use izk_zkp::{
    Groth16Engine, ProofEnvelope, ProvingArtifacts, PublicParams,
    VerificationArtifacts, WitnessBuilder,
};
use tracing::{error, info, warn};

use crate::error::AdapterError;
use crate::issuer::IssuerRecordJson;
use crate::policy::VerificationPolicy;
use crate::response::AdapterResponse;

/// Outcome of classifying one record.
#[derive(Debug, Clone)]
pub struct Classified {
    /// What the platform consumes.
    pub response: AdapterResponse,
    /// The proof, for handing to a relying party.
    pub envelope: ProofEnvelope,
}

/// Checks transported proofs and maps them to responses.
#[derive(Debug, Clone)]
pub struct EnvelopeVerifier {
    engine: Groth16Engine,
    artifacts: Arc<VerificationArtifacts>,
    policy: VerificationPolicy,
}

impl EnvelopeVerifier {
    /// A verifier over `artifacts` enforcing `policy`.
    pub fn new(artifacts: Arc<VerificationArtifacts>, policy: VerificationPolicy) -> Self {
        Self {
            engine: Groth16Engine::new(),
            artifacts,
            policy,
        }
    }

    /// The verification artifacts in use.
    pub fn artifacts(&self) -> &VerificationArtifacts {
        &self.artifacts
    }

    /// The policy in force.
    pub fn policy(&self) -> &VerificationPolicy {
        &self.policy
    }

    /// Verify `envelope` and apply the policy at time `now`.
    ///
    /// # Errors
    ///
    /// [`AdapterError::InvalidProof`] when the pairing check fails,
    /// [`AdapterError::Verify`] when no decision could be made, and
    /// [`AdapterError::PolicyViolation`] for a valid but unacceptable proof.
    pub fn verify(
        &self,
        envelope: &ProofEnvelope,
        now: Timestamp,
        expected_identity: Option<&IdentityNumber>,
    ) -> Result<AdapterResponse, AdapterError> {
        if !self.engine.verify_envelope(&self.artifacts, envelope)? {
            warn!(circuit_id = %envelope.circuit_id, "proof failed verification");
            return Err(AdapterError::InvalidProof);
        }
        let signals = envelope.public_signals.decode()?;
        self.policy.check(&signals, now, expected_identity)?;
        Ok(AdapterResponse::from(&signals))
    }
}

/// Issuer record in, bracket label and proof out.
#[derive(Debug, Clone)]
pub struct IncomeClassifier {
    engine: Groth16Engine,
    artifacts: Arc<ProvingArtifacts>,
    builder: WitnessBuilder,
    verifier: EnvelopeVerifier,
}

impl IncomeClassifier {
    /// A classifier proving with `artifacts` under `params`, checking its own
    /// output against `policy`.
    pub fn new(artifacts: Arc<ProvingArtifacts>, params: PublicParams, policy: VerificationPolicy) -> Self {
        let verification = Arc::new(artifacts.verification().clone());
        Self {
            engine: Groth16Engine::new(),
            artifacts,
            builder: WitnessBuilder::new(params),
            verifier: EnvelopeVerifier::new(verification, policy),
        }
    }

    /// The verifier half, sharing this classifier's artifacts and policy.
    pub fn verifier(&self) -> &EnvelopeVerifier {
        &self.verifier
    }

    /// The proving artifacts.
    pub fn artifacts(&self) -> &ProvingArtifacts {
        &self.artifacts
    }

    /// Parse issuer JSON and classify it.
    pub fn classify_json(&self, json: &str, now: Timestamp) -> Result<Classified, AdapterError> {
        self.classify(&IssuerRecordJson::parse(json)?, now)
    }

    /// Classify a parsed issuer record at time `now`.
    ///
    /// Input problems fail before any cryptographic work. An unauthentic
    /// record is a normal outcome with classification `"unauthentic"`.
    pub fn classify(&self, record: &IssuerRecordJson, now: Timestamp) -> Result<Classified, AdapterError> {
        let start = Instant::now();
        let signed = record.to_record()?;
        let witness = self.builder.build(&signed, now).map_err(|e| {
            warn!(error = %e, "issuer record rejected");
            e
        })?;

        let envelope = self.engine.prove_envelope(&self.artifacts, &witness)?;
        drop(witness);

        let response = match self.verifier.verify(&envelope, now, None) {
            Ok(response) => response,
            Err(AdapterError::InvalidProof) => {
                error!("generated proof failed self-verification");
                return Err(AdapterError::SelfVerificationFailed);
            }
            Err(e) => return Err(e),
        };

        info!(
            classification = %response.classification,
            is_signature_valid = response.is_signature_valid,
            is_data_authentic = response.is_data_authentic,
            issuer = record.issuer.as_deref().unwrap_or("unknown"),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "income classified"
        );
        Ok(Classified { response, envelope })
    }
}
