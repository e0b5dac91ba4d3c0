//! # izk-crypto: Cryptographic Primitives for income-zk
//!
//! - **Poseidon** over the BN254 scalar field (rate 2, α = 5, 8 full and 57
//!   partial rounds). Cheap to evaluate inside an R1CS circuit, so it is the
//!   challenge hash of the issuer signature scheme.
//! - **Issuer signatures**: Schnorr over Baby Jubjub (the twisted Edwards
//!   curve whose base field is the BN254 scalar field). The classification
//!   circuit re-verifies these signatures in-circuit, binding the proven
//!   bracket to an income figure the issuer actually attested.
//!
//! Everything here is native (out-of-circuit). The matching constraint
//! gadgets live in `izk-zkp`.

pub mod error;
pub mod poseidon;
pub mod schnorr;

// Re-export primary types.
pub use error::CryptoError;
pub use poseidon::{poseidon_config, poseidon_hash};
pub use schnorr::{AttestationMessage, IssuerKeyPair, IssuerPublicKey, IssuerSignature};

/// Circuit field: the BN254 scalar field, which is also Baby Jubjub's base field.
pub type Fq = ark_ed_on_bn254::Fq;
