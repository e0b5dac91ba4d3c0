//! # End-to-End Classification
//!
//! Issuer signs → adapter builds the witness → Groth16 proves → a separate
//! verifier checks the envelope. One setup per test binary.

use std::sync::{Arc, OnceLock};

use izk_adapter::{AdapterError, IncomeClassifier, IssuerRecordJson, VerificationPolicy};
use izk_core::{BracketLabel, Classification, EligibilityClass, IdentityNumber, Timestamp};
use izk_crypto::IssuerKeyPair;
use izk_zkp::{
    Fr, Groth16Engine, ProofEnvelope, ProvingArtifacts, PublicParams, UniversalParams,
};
use rand_core::OsRng;

/// 2026-01-01T00:00:00Z.
const ISSUED_AT: i64 = 1_767_225_600;

fn artifacts() -> Arc<ProvingArtifacts> {
    static ARTIFACTS: OnceLock<Arc<ProvingArtifacts>> = OnceLock::new();
    ARTIFACTS
        .get_or_init(|| {
            let params = UniversalParams::generate(16, &mut OsRng).expect("params");
            Arc::new(ProvingArtifacts::generate(&params, &mut OsRng).expect("setup"))
        })
        .clone()
}

fn issuer() -> IssuerKeyPair {
    IssuerKeyPair::from_secret_bytes(&[1u8; 32]).unwrap()
}

fn classifier() -> IncomeClassifier {
    IncomeClassifier::new(
        artifacts(),
        PublicParams::default(),
        VerificationPolicy::default().with_trusted_issuer(issuer().public_key()),
    )
}

fn record(income: u32) -> IssuerRecordJson {
    let issued = Timestamp::from_epoch_secs(ISSUED_AT).unwrap();
    IssuerRecordJson::signed(&issuer(), "900101-14-5678", income, "Test Citizen", issued, "LHDN").unwrap()
}

fn after(secs: i64) -> Timestamp {
    Timestamp::from_epoch_secs(ISSUED_AT + secs).unwrap()
}

fn bracket_flags(envelope: &ProofEnvelope) -> Vec<bool> {
    envelope.public_signals.as_slice()[2..12]
        .iter()
        .map(|f| *f == Fr::from(1u64))
        .collect()
}

// =========================================================================
// Scenarios
// =========================================================================

#[test]
fn fresh_low_income_is_b1() {
    let out = classifier().classify(&record(1800), after(60)).expect("classify");
    assert_eq!(out.response.classification, Classification::Bracket(BracketLabel::B1));
    assert!(out.response.is_signature_valid);
    assert!(out.response.is_data_authentic);
    assert_eq!(out.response.eligibility_class, Some(EligibilityClass::B40));

    let flags = bracket_flags(&out.envelope);
    assert!(flags[0]);
    assert_eq!(flags.iter().filter(|f| **f).count(), 1);
}

#[test]
fn record_issued_90000_seconds_ago_is_unauthentic() {
    let out = classifier().classify(&record(1800), after(90_000)).expect("classify");
    assert_eq!(out.response.classification, Classification::Unauthentic);
    assert!(out.response.is_signature_valid);
    assert!(!out.response.is_data_authentic);
    assert!(out.response.eligibility_class.is_none());
    assert!(bracket_flags(&out.envelope).iter().all(|f| !f));
}

#[test]
fn income_6340_lands_in_bracket_index_5() {
    let out = classifier().classify(&record(6340), after(60)).expect("classify");
    let flags = bracket_flags(&out.envelope);
    assert_eq!(flags.iter().position(|f| *f), Some(5));
    assert_eq!(out.response.classification, Classification::Bracket(BracketLabel::M2));
    assert_eq!(out.response.eligibility_class, Some(EligibilityClass::M40M1));
}

#[test]
fn zero_signature_is_invalid_but_still_proven() {
    let mut r = record(1800);
    r.signature = Some("00".repeat(64));
    let out = classifier().classify(&r, after(60)).expect("classify");
    assert!(!out.response.is_signature_valid);
    assert!(!out.response.is_data_authentic);
    assert_eq!(out.response.classification, Classification::Unauthentic);
}

#[test]
fn inflated_income_breaks_the_signature() {
    let mut r = record(1800);
    r.monthly_income = Some(20_000);
    let out = classifier().classify(&r, after(60)).expect("classify");
    assert!(!out.response.is_signature_valid);
    assert_eq!(out.response.classification, Classification::Unauthentic);
}

#[test]
fn replay_window_edges() {
    let c = classifier();
    let fresh = c.classify(&record(5000), after(86_399)).expect("classify");
    assert!(fresh.response.is_data_authentic);
    let stale = c.classify(&record(5000), after(86_400)).expect("classify");
    assert!(!stale.response.is_data_authentic);
}

// =========================================================================
// Relying party
// =========================================================================

#[test]
fn envelope_survives_json_transport() {
    let c = classifier();
    let out = c.classify(&record(12_000), after(60)).expect("classify");
    let wire = serde_json::to_string(&out.envelope).unwrap();

    let received: ProofEnvelope = serde_json::from_str(&wire).unwrap();
    let identity = IdentityNumber::new("900101145678").unwrap();
    let response = c
        .verifier()
        .verify(&received, after(120), Some(&identity))
        .expect("verify");
    assert_eq!(response, out.response);
    assert_eq!(response.classification, Classification::Bracket(BracketLabel::T1));
    assert!(!wire.contains("monthly_income"));
}

#[test]
fn wrong_identity_is_a_policy_violation() {
    let c = classifier();
    let out = c.classify(&record(3000), after(60)).expect("classify");
    let someone_else = IdentityNumber::new("850505-10-1234").unwrap();
    assert!(matches!(
        c.verifier().verify(&out.envelope, after(60), Some(&someone_else)),
        Err(AdapterError::PolicyViolation(_))
    ));
}

#[test]
fn every_public_signal_is_bound() {
    let c = classifier();
    let out = c.classify(&record(4000), after(60)).expect("classify");
    let engine = Groth16Engine::new();
    let verification = c.artifacts().verification();
    assert!(engine.verify_envelope(verification, &out.envelope).unwrap());

    for i in 0..out.envelope.public_signals.as_slice().len() {
        let mut tampered = out.envelope.clone();
        tampered.public_signals.as_mut_slice()[i] += Fr::from(1u64);
        assert!(
            !engine.verify_envelope(verification, &tampered).unwrap(),
            "mutating signal {i} must invalidate the proof"
        );
    }
}

#[test]
fn proof_for_a_different_issuer_is_rejected_by_policy() {
    let rogue = IssuerKeyPair::from_secret_bytes(&[2u8; 32]).unwrap();
    let issued = Timestamp::from_epoch_secs(ISSUED_AT).unwrap();
    let forged =
        IssuerRecordJson::signed(&rogue, "900101-14-5678", 1800, "Test Citizen", issued, "LHDN").unwrap();
    assert!(matches!(
        classifier().classify(&forged, after(60)),
        Err(AdapterError::PolicyViolation(_))
    ));
}
