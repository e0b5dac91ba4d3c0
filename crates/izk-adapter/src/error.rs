//! Adapter error type.

use izk_zkp::{CodecError, ProveError, VerifyError, WitnessError};
use thiserror::Error;

/// Errors from the classification pipeline.
///
/// An unauthentic record is not an error: it produces a normal
/// [`AdapterResponse`](crate::AdapterResponse) with classification
/// `"unauthentic"`.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// The issuer JSON did not parse: unknown field, wrong type, bad syntax.
    #[error("invalid issuer record: {0}")]
    InvalidRecord(String),

    /// The record parsed but failed witness validation.
    #[error(transparent)]
    Witness(#[from] WitnessError),

    /// Proof generation failed.
    #[error(transparent)]
    Prove(#[from] ProveError),

    /// Verification could not reach a decision.
    #[error(transparent)]
    Verify(#[from] VerifyError),

    /// Public signals did not decode.
    #[error("invalid public signals: {0}")]
    Signals(#[from] CodecError),

    /// A freshly generated proof failed its own verification.
    #[error("generated proof failed self-verification")]
    SelfVerificationFailed,

    /// A submitted proof did not pass the pairing check.
    #[error("proof is invalid")]
    InvalidProof,

    /// The proof verified but was made under terms this deployment rejects.
    #[error("verification policy violated: {0}")]
    PolicyViolation(String),

    /// Signing a fixture record failed.
    #[error("issuer signing failed: {0}")]
    Signing(String),
}

impl AdapterError {
    /// Whether the caller supplied bad input, as opposed to a server fault.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::InvalidRecord(_)
            | Self::Witness(_)
            | Self::Signals(_)
            | Self::InvalidProof
            | Self::PolicyViolation(_)
            | Self::Signing(_) => true,
            Self::Verify(e) => !matches!(e, VerifyError::Backend(_)),
            Self::Prove(_) | Self::SelfVerificationFailed => false,
        }
    }
}
