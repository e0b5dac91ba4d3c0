#![deny(missing_docs)]

//! # izk-zkp: Zero-Knowledge Income Bracket Classification
//!
//! Proves which of ten income brackets an issuer-signed income figure falls
//! in, without revealing the figure.
//!
//! ## Lifecycle
//!
//! 1. **Setup** ([`setup::SetupManager`]): once per circuit version, derive
//!    Groth16 keys from a universal parameter file, fingerprint the
//!    constraint system, and persist keys plus a manifest.
//! 2. **Witness** ([`witness::WitnessBuilder`]): validate a
//!    [`witness::SignedIncomeRecord`] and encode it with [`codec`].
//! 3. **Prove** ([`groth16::Groth16Engine`]): check the witness against
//!    [`circuit::ClassificationCircuit`] and produce a proof plus the
//!    17 public signals.
//! 4. **Verify**: check the circuit binding, then the pairing equation.
//!
//! ## What the Circuit Publishes
//!
//! Two authenticity bits (issuer signature valid; signature valid, fresh,
//! and income plausible) and a one-hot bracket vector that is all zeros
//! unless the record is authentic. The income itself stays private.
//!
//! ## Crate Policy
//!
//! - `ProofSystem` is sealed; [`groth16::Groth16Engine`] is the only
//!   implementation.
//! - Circuit inputs redact private values in `Debug` and zeroize them on drop.
//! - An unauthentic record is a normal outcome, never an error.

pub mod circuit;
pub mod codec;
pub mod error;
pub mod formats;
pub mod groth16;
pub mod setup;
pub mod traits;
pub mod witness;

#[cfg(test)]
pub(crate) mod test_support;

/// The BN254 scalar field all circuit values live in.
pub type Fr = ark_bn254::Fr;

pub use circuit::{evaluate, CircuitInputs, CircuitOutputs, ClassificationCircuit};
pub use error::{CodecError, ProveError, SetupError, VerifyError, WitnessError};
pub use formats::{DecodedSignals, IncomeProof, ProofEnvelope, ProofJson, PublicSignals, VerificationKeyJson};
pub use groth16::Groth16Engine;
pub use setup::{
    ArtifactManifest, CircuitFingerprint, CircuitShape, ProvingArtifacts, SetupManager,
    UniversalParams, VerificationArtifacts,
};
pub use traits::ProofSystem;
pub use witness::{CircuitInputFile, PublicParams, SignedIncomeRecord, WitnessBuilder};
