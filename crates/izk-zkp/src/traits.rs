//! # Proof System Trait (Sealed)
//!
//! The contract the adapter, CLI, and API program against. The only
//! implementation is [`Groth16Engine`](crate::groth16::Groth16Engine).
//!
//! ## Sealed Trait
//!
//! `ProofSystem` is sealed: only types inside `izk-zkp` can implement it.
//! A verifier that accepts `impl ProofSystem` therefore always runs the
//! pairing check and never a substitute backend.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{ProveError, VerifyError};

/// Private module that seals the [`ProofSystem`] trait.
mod private {
    /// Sealing marker trait. Not accessible outside `izk-zkp`.
    pub trait Sealed {}
}

/// Sealed trait for a zero-knowledge proof system.
///
/// Requires `Send + Sync` so one engine can serve concurrent requests.
///
/// ## Associated Types
///
/// - **`Proof`**: the proof plus the circuit binding it claims.
/// - **`ProvingArtifacts`**: proving key and everything needed to verify.
/// - **`VerificationArtifacts`**: the verifier-only view.
/// - **`Witness`**: a full circuit assignment.
/// - **`PublicInputs`**: the ordered public signals.
pub trait ProofSystem: private::Sealed + Send + Sync {
    /// Proof produced by [`prove`](Self::prove).
    type Proof: Serialize + DeserializeOwned + Clone + std::fmt::Debug;
    /// Setup output held by provers.
    type ProvingArtifacts;
    /// Setup output held by verifiers.
    type VerificationArtifacts;
    /// Circuit assignment.
    type Witness;
    /// Public signals.
    type PublicInputs;

    /// Produce a proof and the public signals it commits to.
    ///
    /// # Errors
    ///
    /// [`ProveError::UnsatisfiableWitness`] if the witness fails a
    /// constraint; the error names the constraint.
    fn prove(
        &self,
        artifacts: &Self::ProvingArtifacts,
        witness: &Self::Witness,
    ) -> Result<(Self::Proof, Self::PublicInputs), ProveError>;

    /// Check a proof against public signals.
    ///
    /// `Ok(false)` for a well-formed proof that does not verify.
    ///
    /// # Errors
    ///
    /// [`VerifyError::FingerprintMismatch`] when the proof was made for a
    /// different circuit; [`VerifyError::PublicInputCount`] for the wrong
    /// number of signals; [`VerifyError::Malformed`] for undecodable points.
    fn verify(
        &self,
        artifacts: &Self::VerificationArtifacts,
        proof: &Self::Proof,
        public_inputs: &Self::PublicInputs,
    ) -> Result<bool, VerifyError>;
}

impl private::Sealed for crate::groth16::Groth16Engine {}
