#![deny(missing_docs)]

//! # izk-adapter: Issuer Records In, Bracket Labels Out
//!
//! The only crate that knows the income authority's JSON shape. It parses
//! issuer records, drives the witness builder and proof engine from
//! `izk-zkp`, self-verifies every proof it produces, and maps the public
//! signals to the label the platform consumes:
//!
//! ```json
//! { "classification": "B1", "is_signature_valid": true,
//!   "is_data_authentic": true, "eligibility_class": "B40" }
//! ```
//!
//! Relying parties use [`EnvelopeVerifier`] with only the verification key
//! and a [`VerificationPolicy`].

pub mod classifier;
pub mod error;
pub mod issuer;
pub mod policy;
pub mod response;

#[cfg(test)]
pub(crate) mod test_support;

pub use classifier::{Classified, EnvelopeVerifier, IncomeClassifier};
pub use error::AdapterError;
pub use issuer::IssuerRecordJson;
pub use policy::VerificationPolicy;
pub use response::AdapterResponse;
