//! # Groth16 Proof Engine
//!
//! [`Groth16Engine`] is the one [`ProofSystem`] implementation: Groth16 over
//! BN254 via `ark-groth16`, proving the classification circuit.
//!
//! `prove` synthesizes and checks the witness before running the prover,
//! so an inconsistent assignment surfaces as
//! [`ProveError::UnsatisfiableWitness`] naming the constraint rather than
//! as a proof that fails to verify. `verify` checks the circuit binding and
//! signal count, then runs the pairing check against the prepared key.

use std::time::Instant;

use ark_bn254::Bn254;
use ark_groth16::Groth16;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem, OptimizationGoal};
use ark_snark::SNARK;
use rand_core::OsRng;
use tracing::{debug, error, info};

use crate::circuit::{evaluate, CircuitInputs, CircuitOutputs, ClassificationCircuit};
use crate::error::{ProveError, VerifyError};
use crate::formats::{IncomeProof, ProofEnvelope, ProofJson, PublicSignals};
use crate::setup::{ProvingArtifacts, VerificationArtifacts};
use crate::traits::ProofSystem;
use crate::Fr;

/// Groth16 over BN254. Stateless; share freely.
#[derive(Debug, Clone, Copy, Default)]
pub struct Groth16Engine;

impl Groth16Engine {
    /// A new engine.
    pub fn new() -> Self {
        Self
    }

    /// Synthesize `witness` and confirm it satisfies every constraint.
    ///
    /// Returns the circuit's outputs for that witness.
    pub fn check_witness(&self, witness: &CircuitInputs) -> Result<CircuitOutputs, ProveError> {
        let cs = ConstraintSystem::<Fr>::new_ref();
        cs.set_optimization_goal(OptimizationGoal::Constraints);
        ClassificationCircuit::new(witness.clone())
            .generate_constraints(cs.clone())
            .map_err(|e| ProveError::Synthesis(e.to_string()))?;
        let satisfied = cs
            .is_satisfied()
            .map_err(|e| ProveError::Synthesis(e.to_string()))?;
        if !satisfied {
            let constraint = cs
                .which_is_unsatisfied()
                .map_err(|e| ProveError::Synthesis(e.to_string()))?
                .unwrap_or_else(|| "<unknown>".into());
            error!(%constraint, "witness does not satisfy the circuit");
            return Err(ProveError::UnsatisfiableWitness { constraint });
        }
        Ok(evaluate(witness))
    }

    /// Prove and bundle the result for transport.
    pub fn prove_envelope(
        &self,
        artifacts: &ProvingArtifacts,
        witness: &CircuitInputs,
    ) -> Result<ProofEnvelope, ProveError> {
        let (proof, signals) = self.prove(artifacts, witness)?;
        Ok(ProofEnvelope::new(proof, signals))
    }

    /// Verify a transported envelope.
    pub fn verify_envelope(
        &self,
        artifacts: &VerificationArtifacts,
        envelope: &ProofEnvelope,
    ) -> Result<bool, VerifyError> {
        self.verify(artifacts, &envelope.income_proof(), &envelope.public_signals)
    }
}

impl ProofSystem for Groth16Engine {
    type Proof = IncomeProof;
    type ProvingArtifacts = ProvingArtifacts;
    type VerificationArtifacts = VerificationArtifacts;
    type Witness = CircuitInputs;
    type PublicInputs = PublicSignals;

    fn prove(
        &self,
        artifacts: &ProvingArtifacts,
        witness: &CircuitInputs,
    ) -> Result<(IncomeProof, PublicSignals), ProveError> {
        let start = Instant::now();
        let outputs = self.check_witness(witness)?;
        let signals = outputs.public_signals(witness);
        let expected = artifacts.manifest().public_input_count;
        if signals.len() != expected {
            return Err(ProveError::ArtifactMismatch(format!(
                "circuit publishes {} signals, artifacts expect {expected}",
                signals.len()
            )));
        }

        let proof = Groth16::<Bn254>::prove(
            artifacts.proving_key(),
            ClassificationCircuit::new(witness.clone()),
            &mut OsRng,
        )
        .map_err(|e| {
            error!(error = %e, "groth16 prover failed");
            ProveError::Backend(e.to_string())
        })?;

        info!(
            circuit_id = artifacts.circuit_id(),
            constraints = artifacts.constraint_count(),
            is_signature_valid = outputs.is_signature_valid,
            is_data_authentic = outputs.is_data_authentic,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "proof generated"
        );
        Ok((
            IncomeProof {
                circuit_id: artifacts.circuit_id().to_string(),
                fingerprint: artifacts.fingerprint(),
                proof: ProofJson::from_proof(&proof),
            },
            PublicSignals::new(signals),
        ))
    }

    fn verify(
        &self,
        artifacts: &VerificationArtifacts,
        proof: &IncomeProof,
        public_inputs: &PublicSignals,
    ) -> Result<bool, VerifyError> {
        if proof.circuit_id != artifacts.circuit_id() || proof.fingerprint != artifacts.fingerprint() {
            return Err(VerifyError::FingerprintMismatch {
                expected: format!("{}@{}", artifacts.circuit_id(), artifacts.fingerprint()),
                actual: format!("{}@{}", proof.circuit_id, proof.fingerprint),
            });
        }
        if public_inputs.len() != artifacts.public_input_count() {
            return Err(VerifyError::PublicInputCount {
                expected: artifacts.public_input_count(),
                actual: public_inputs.len(),
            });
        }
        let start = Instant::now();
        let groth_proof = proof.proof.to_proof()?;
        let valid = Groth16::<Bn254>::verify_with_processed_vk(
            artifacts.prepared(),
            public_inputs.as_slice(),
            &groth_proof,
        )
        .map_err(|e| VerifyError::Backend(e.to_string()))?;
        debug!(
            valid,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "proof verified"
        );
        Ok(valid)
    }
}
