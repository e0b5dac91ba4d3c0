//! # Cryptographic Error Types
//!
//! Structured errors for key and signature handling in `izk-crypto`.

use thiserror::Error;

/// Errors from issuer key and signature operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Hex decoding failed or had the wrong length.
    #[error("hex decode error: {0}")]
    HexDecode(String),

    /// Bytes do not encode a point in the prime-order subgroup.
    #[error("invalid issuer public key: {0}")]
    InvalidPublicKey(String),

    /// Bytes do not encode a signature (`R` not a subgroup point, or `s` non-canonical).
    #[error("invalid issuer signature: {0}")]
    InvalidSignature(String),

    /// Secret scalar is non-canonical or zero.
    #[error("invalid issuer secret key: {0}")]
    InvalidSecretKey(String),
}
