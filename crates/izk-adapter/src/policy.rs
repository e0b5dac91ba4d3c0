//! Deployment checks applied to public signals after the pairing check.
//!
//! A proof can verify and still be unacceptable: made against an issuer key
//! this deployment does not trust, against a looser anti-replay bound, or
//! at a reference time far from now.

use izk_core::{IdentityNumber, Timestamp};
use izk_crypto::IssuerPublicKey;
use izk_zkp::codec::{encode_identity, encode_public_key};
use izk_zkp::{DecodedSignals, PublicParams};
use tracing::warn;

use crate::error::AdapterError;

/// What a verifier insists on beyond proof validity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationPolicy {
    /// Only proofs against this issuer key are accepted, if set.
    pub trusted_issuer: Option<IssuerPublicKey>,
    /// The anti-replay bound proofs must have been made with.
    pub max_signature_age_seconds: u64,
    /// Maximum distance between a proof's reference time and now, if set.
    pub max_reference_skew_seconds: Option<u64>,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self::from_params(&PublicParams::default())
    }
}

impl VerificationPolicy {
    /// Policy matching the deployment's public parameters, trusting any issuer.
    pub fn from_params(params: &PublicParams) -> Self {
        Self {
            trusted_issuer: None,
            max_signature_age_seconds: params.max_signature_age_seconds,
            max_reference_skew_seconds: None,
        }
    }

    /// Pin the issuer key.
    pub fn with_trusted_issuer(mut self, key: IssuerPublicKey) -> Self {
        self.trusted_issuer = Some(key);
        self
    }

    /// Bound how old (or how far ahead) a proof's reference time may be.
    pub fn with_max_reference_skew(mut self, seconds: u64) -> Self {
        self.max_reference_skew_seconds = Some(seconds);
        self
    }

    /// Check decoded signals against this policy at time `now`.
    ///
    /// `expected_identity`, when given, must match the identity the proof
    /// was made for.
    pub fn check(
        &self,
        signals: &DecodedSignals,
        now: Timestamp,
        expected_identity: Option<&IdentityNumber>,
    ) -> Result<(), AdapterError> {
        if let Some(trusted) = &self.trusted_issuer {
            if encode_public_key(trusted) != signals.issuer_public_key {
                return Err(violation("proof was made against an untrusted issuer key"));
            }
        }
        if signals.max_signature_age_seconds != self.max_signature_age_seconds {
            return Err(violation(&format!(
                "proof uses a {}s signature age bound, policy requires {}s",
                signals.max_signature_age_seconds, self.max_signature_age_seconds
            )));
        }
        if let Some(max_skew) = self.max_reference_skew_seconds {
            let skew = (now.epoch_secs() as i128 - i128::from(signals.reference_time)).unsigned_abs();
            if skew > u128::from(max_skew) {
                return Err(violation(&format!(
                    "proof reference time is {skew}s from now (limit {max_skew}s)"
                )));
            }
        }
        if let Some(identity) = expected_identity {
            if encode_identity(identity) != signals.identity_hash {
                return Err(violation("proof is for a different identity"));
            }
        }
        Ok(())
    }
}

fn violation(reason: &str) -> AdapterError {
    warn!(reason, "verification policy rejected proof");
    AdapterError::PolicyViolation(reason.to_string())
}
