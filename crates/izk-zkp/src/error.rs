//! Error types for the proof subsystem.
//!
//! One enum per lifecycle stage. Input problems surface as [`WitnessError`]
//! before any cryptographic work; setup failures as [`SetupError`];
//! proving and verification failures as [`ProveError`] and [`VerifyError`].
//! An authenticity-negative outcome is not an error anywhere in this crate.

use thiserror::Error;

/// Failures converting between domain values and field elements.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A bracket vector with more than one set flag or a non-binary entry.
    #[error("invalid one-hot bracket vector: {0}")]
    InvalidOneHot(String),

    /// A decimal field string containing non-digits or empty.
    #[error("invalid decimal field element \"{0}\"")]
    InvalidDecimal(String),

    /// A decimal value at or above the field modulus.
    #[error("value {0} is not below the field modulus")]
    OutOfField(String),

    /// A field element that must be 0 or 1 was neither.
    #[error("expected a boolean field element at {0}")]
    NotBoolean(String),

    /// A curve point that is not on the curve or not in the subgroup.
    #[error("invalid curve point: {0}")]
    InvalidPoint(String),

    /// A vector of the wrong length.
    #[error("{what}: expected {expected} elements, got {actual}")]
    WrongLength {
        /// What was being decoded.
        what: &'static str,
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },

    /// A field element that should hold a machine integer does not fit.
    #[error("{0} does not fit in 64 bits")]
    IntegerOverflow(String),
}

/// Rejections from the witness builder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WitnessError {
    /// A required field is absent or empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A numeric field lies outside what the circuit accepts.
    #[error("{field} out of range: {reason}")]
    OutOfRange {
        /// Offending field name.
        field: &'static str,
        /// Bound that was violated. Never contains the private value.
        reason: String,
    },

    /// The record was issued further in the future than the skew tolerance.
    #[error("issued_at is {skew_seconds}s in the future (tolerance {tolerance_seconds}s)")]
    ClockSkew {
        /// How far ahead of `now` the record claims to be.
        skew_seconds: u64,
        /// Configured tolerance.
        tolerance_seconds: u64,
    },

    /// A field is present but syntactically wrong.
    #[error("malformed {field}: {reason}")]
    Malformed {
        /// Offending field name.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// Failures during trusted setup or artifact loading. Never retried.
#[derive(Error, Debug)]
pub enum SetupError {
    /// The universal parameter file cannot hold this circuit.
    #[error("parameter file supports 2^{power} = {available} terms, circuit needs {required}")]
    ParameterFileTooSmall {
        /// Power recorded in the parameter file.
        power: u32,
        /// `2^power`.
        available: usize,
        /// Constraints plus instance variables.
        required: usize,
    },

    /// Filesystem failure reading or writing artifacts.
    #[error("I/O failure on {path}: {source}")]
    IOFailure {
        /// File or directory involved.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Constraint synthesis failed or produced no matrices.
    #[error("malformed constraint system: {0}")]
    MalformedConstraintSystem(String),

    /// The universal parameter file failed to parse or validate.
    #[error("malformed parameter file: {0}")]
    MalformedParameterFile(String),

    /// Existing artifacts were produced for a different circuit or parameters.
    #[error("artifact conflict: {0}")]
    ArtifactConflict(String),

    /// Another setup run holds the lock. A lock left by a crashed run must
    /// be removed by hand.
    #[error(
        "setup already in progress (lock file {path}, holder pid {holder}); \
         if no setup is running, delete the lock file and retry"
    )]
    SetupInProgress {
        /// Lock file path.
        path: String,
        /// PID recorded in the lock file, or `unknown`.
        holder: String,
    },

    /// Key or manifest (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A persisted file does not match its manifest digest.
    #[error("integrity check failed for {file}: expected {expected}, found {actual}")]
    Integrity {
        /// File that failed.
        file: String,
        /// Digest recorded in the manifest.
        expected: String,
        /// Digest of the file on disk.
        actual: String,
    },
}

impl SetupError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::IOFailure {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Failures producing a proof.
#[derive(Error, Debug)]
pub enum ProveError {
    /// The witness does not satisfy the circuit. Indicates a builder bug.
    #[error("witness does not satisfy constraint {constraint}")]
    UnsatisfiableWitness {
        /// Name or index of the first failing constraint.
        constraint: String,
    },

    /// Constraint synthesis failed.
    #[error("constraint synthesis failed: {0}")]
    Synthesis(String),

    /// The proving artifacts do not describe this circuit.
    #[error("proving artifacts do not match circuit: {0}")]
    ArtifactMismatch(String),

    /// The Groth16 prover returned an error.
    #[error("proof generation failed: {0}")]
    Backend(String),
}

/// Failures that prevent a verification decision.
///
/// A well-formed proof that does not verify is `Ok(false)`, not an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The proof claims a different circuit than the verification key.
    #[error("circuit fingerprint mismatch: artifacts {expected}, proof {actual}")]
    FingerprintMismatch {
        /// Fingerprint of the loaded artifacts.
        expected: String,
        /// Fingerprint carried by the proof.
        actual: String,
    },

    /// Wrong number of public signals.
    #[error("expected {expected} public signals, got {actual}")]
    PublicInputCount {
        /// Count the circuit publishes.
        expected: usize,
        /// Count supplied.
        actual: usize,
    },

    /// Proof points or signals could not be decoded.
    #[error("malformed proof: {0}")]
    Malformed(String),

    /// The pairing check itself failed to run.
    #[error("verification backend error: {0}")]
    Backend(String),
}

impl From<CodecError> for VerifyError {
    fn from(err: CodecError) -> Self {
        Self::Malformed(err.to_string())
    }
}
