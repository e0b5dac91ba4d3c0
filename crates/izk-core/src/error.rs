//! # Error Hierarchy
//!
//! Structured error types shared across income-zk, built with `thiserror`.
//! No `Box<dyn Error>`, no `.unwrap()` outside tests.
//!
//! Subsystem crates (`izk-zkp`, `izk-adapter`) define their own error enums
//! and wrap these where a core primitive failed.

use thiserror::Error;

/// Errors during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations; use string or integer: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed during canonicalization.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Validation errors for domain primitive newtypes.
///
/// Each variant carries the offending input (never a private value such as
/// an income figure) and the expected format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Identity number does not conform to the MyKad format.
    #[error("invalid identity number: \"{0}\" (expected 12 digits, optionally as YYMMDD-PB-###G)")]
    InvalidIdentityNumber(String),

    /// Timestamp string is not valid ISO 8601.
    #[error("invalid timestamp: \"{value}\" ({reason})")]
    InvalidTimestamp {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Bracket index outside `0..10`.
    #[error("invalid bracket index {0} (expected 0..10)")]
    InvalidBracketIndex(usize),

    /// Bracket label string is not one of B1..T2.
    #[error("unknown bracket label \"{0}\"")]
    UnknownBracketLabel(String),
}
