//! Shared fixtures for unit tests.

use std::sync::OnceLock;

use izk_core::IdentityNumber;
use izk_crypto::{AttestationMessage, IssuerKeyPair};
use rand_core::OsRng;

use crate::circuit::CircuitInputs;
use crate::codec::{encode_identity, encode_integer, encode_public_key, encode_signature};
use crate::setup::{ProvingArtifacts, UniversalParams, PARAMS_CURVE, PARAMS_FORMAT};

/// 2026-01-01T00:00:00Z.
pub const ISSUED_AT: u64 = 1_767_225_600;
/// One day.
pub const MAX_AGE: u64 = 86_400;

pub fn issuer() -> IssuerKeyPair {
    IssuerKeyPair::from_secret_bytes(&[4u8; 32]).unwrap()
}

pub fn identity() -> IdentityNumber {
    IdentityNumber::new("900101-14-5678").unwrap()
}

/// Honest inputs for `income`, measured `age` seconds after issue.
pub fn signed_inputs(income: u64, age: u64) -> CircuitInputs {
    let kp = issuer();
    let identity_hash = encode_identity(&identity());
    let signature = kp.sign(&AttestationMessage {
        identity_hash,
        monthly_income: income,
        issued_at: ISSUED_AT,
    });
    CircuitInputs {
        monthly_income: encode_integer(income),
        signature: encode_signature(&signature),
        issued_at: encode_integer(ISSUED_AT),
        verification_age_seconds: encode_integer(age),
        issuer_public_key: encode_public_key(&kp.public_key()),
        identity_hash,
        max_signature_age_seconds: encode_integer(MAX_AGE),
        reference_time: encode_integer(ISSUED_AT + age),
    }
}

pub fn test_params() -> UniversalParams {
    UniversalParams {
        format: PARAMS_FORMAT.into(),
        curve: PARAMS_CURVE.into(),
        power: 16,
        beacon: "5a".repeat(32),
    }
}

/// One Groth16 setup per test binary.
pub fn shared_artifacts() -> &'static ProvingArtifacts {
    static ARTIFACTS: OnceLock<ProvingArtifacts> = OnceLock::new();
    ARTIFACTS.get_or_init(|| {
        ProvingArtifacts::generate(&test_params(), &mut OsRng).unwrap()
    })
}
