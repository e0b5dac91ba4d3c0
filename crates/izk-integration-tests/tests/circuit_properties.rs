//! # Circuit Properties
//!
//! Bracket boundaries, one-hot shape, and authenticity gating, checked
//! against both the native evaluator and the constraint system. No setup
//! is needed: `check_witness` synthesizes and tests satisfiability.

use izk_core::{BracketLabel, Classification, IdentityNumber, BRACKET_COUNT, BRACKET_THRESHOLDS};
use izk_crypto::{AttestationMessage, IssuerKeyPair};
use izk_zkp::codec::{
    decode_onehot, encode_classification, encode_identity, encode_integer, encode_public_key,
    encode_signature,
};
use izk_zkp::{evaluate, CircuitInputs, Fr, Groth16Engine};
use proptest::prelude::*;

const ISSUED_AT: u64 = 1_767_225_600;
const MAX_AGE: u64 = 86_400;

fn inputs(income: u64, age: u64) -> CircuitInputs {
    let key = IssuerKeyPair::from_secret_bytes(&[3u8; 32]).unwrap();
    let identity_hash = encode_identity(&IdentityNumber::new("900101145678").unwrap());
    let signature = key.sign(&AttestationMessage {
        identity_hash,
        monthly_income: income,
        issued_at: ISSUED_AT,
    });
    CircuitInputs {
        monthly_income: encode_integer(income),
        signature: encode_signature(&signature),
        issued_at: encode_integer(ISSUED_AT),
        verification_age_seconds: encode_integer(age),
        issuer_public_key: encode_public_key(&key.public_key()),
        identity_hash,
        max_signature_age_seconds: encode_integer(MAX_AGE),
        reference_time: encode_integer(ISSUED_AT + age),
    }
}

fn bracket_of(flags: &[bool; BRACKET_COUNT]) -> Option<usize> {
    flags.iter().position(|f| *f)
}

#[test]
fn boundaries_are_exact_in_the_constraint_system() {
    let engine = Groth16Engine::new();
    for (i, threshold) in BRACKET_THRESHOLDS.iter().enumerate() {
        let last_in = engine.check_witness(&inputs(threshold - 1, 60)).expect("satisfiable");
        let first_out = engine.check_witness(&inputs(*threshold, 60)).expect("satisfiable");
        assert_eq!(bracket_of(&last_in.brackets), Some(i), "income {}", threshold - 1);
        assert_eq!(bracket_of(&first_out.brackets), Some(i + 1), "income {threshold}");
    }
}

#[test]
fn published_bounds_match_labels() {
    assert_eq!(BracketLabel::for_income(2560), BracketLabel::B1);
    assert_eq!(BracketLabel::for_income(2561), BracketLabel::B2);
    assert_eq!(BracketLabel::for_income(15_869), BracketLabel::T1);
    assert_eq!(BracketLabel::for_income(15_870), BracketLabel::T2);
}

#[test]
fn replay_bound_is_strict() {
    let engine = Groth16Engine::new();
    let at_limit = engine.check_witness(&inputs(1800, MAX_AGE)).expect("satisfiable");
    let below = engine.check_witness(&inputs(1800, MAX_AGE - 1)).expect("satisfiable");
    assert!(!at_limit.is_data_authentic);
    assert!(below.is_data_authentic);
}

#[test]
fn forged_witness_is_gated_not_rejected() {
    let mut forged = inputs(1800, 60);
    forged.monthly_income = encode_integer(1700);
    let outputs = Groth16Engine::new().check_witness(&forged).expect("satisfiable");
    assert!(!outputs.is_signature_valid);
    assert!(!outputs.is_data_authentic);
    assert_eq!(bracket_of(&outputs.brackets), None);
}

#[test]
fn onehot_codec_round_trip() {
    for label in BracketLabel::ALL {
        let c = Classification::Bracket(label);
        assert_eq!(decode_onehot(&encode_classification(c)).unwrap(), c);
    }
    let zeros = [Fr::from(0u64); BRACKET_COUNT];
    assert_eq!(decode_onehot(&zeros).unwrap(), Classification::Unauthentic);

    let mut two_hot = zeros;
    two_hot[1] = Fr::from(1u64);
    two_hot[4] = Fr::from(1u64);
    assert!(decode_onehot(&two_hot).is_err());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn authentic_incomes_are_exactly_one_hot(income in 0u64..1_000_000) {
        let outputs = evaluate(&inputs(income, 60));
        prop_assert!(outputs.is_data_authentic);
        prop_assert_eq!(outputs.brackets.iter().filter(|b| **b).count(), 1);
        prop_assert_eq!(
            bracket_of(&outputs.brackets),
            Some(BracketLabel::for_income(income).index())
        );
    }

    #[test]
    fn stale_records_are_all_zero(income in 0u64..1_000_000, extra in 0u64..1_000_000) {
        let outputs = evaluate(&inputs(income, MAX_AGE + extra));
        prop_assert!(outputs.is_signature_valid);
        prop_assert!(!outputs.is_data_authentic);
        prop_assert!(outputs.brackets.iter().all(|b| !b));
    }
}
