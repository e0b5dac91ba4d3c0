#![deny(missing_docs)]

//! # izk-core: Foundational Types for income-zk
//!
//! This crate defines the types every other crate in the workspace depends
//! on. It has no internal crate dependencies: only `serde`, `serde_json`,
//! `serde_jcs`, `thiserror`, `chrono`, and `sha2` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** An [`IdentityNumber`] is
//!    validated at construction; a raw `String` never reaches the hashing
//!    path that produces a circuit's public identity input.
//!
//! 2. **[`CanonicalBytes`] is the sole path to JSON digest computation.**
//!    Manifest and parameter-file digests flow through `CanonicalBytes::new()`.
//!
//! 3. **Single [`BracketLabel`] enum.** The ten household income groups and
//!    their thresholds are defined once, here, and shared by the circuit,
//!    the codec, and the adapter.
//!
//! 4. **[`ValidationError`] at the boundary.** Structured errors with
//!    `thiserror`: no `Box<dyn Error>`, no `.unwrap()` outside tests.

pub mod bracket;
pub mod canonical;
pub mod digest;
pub mod error;
pub mod hex;
pub mod identity;
pub mod temporal;

// Re-export primary types at crate root for ergonomic imports.
pub use bracket::{
    BracketLabel, Classification, EligibilityClass, BRACKET_COUNT, BRACKET_THRESHOLDS,
    INCOME_UPPER_BOUND,
};
pub use canonical::CanonicalBytes;
pub use digest::{sha256_bytes, sha256_digest, ContentDigest, DigestAlgorithm, Sha256Accumulator};
pub use error::{CanonicalizationError, ValidationError};
pub use identity::IdentityNumber;
pub use temporal::Timestamp;
