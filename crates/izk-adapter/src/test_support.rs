//! Shared fixtures for unit tests.

use std::sync::{Arc, OnceLock};

use izk_core::Timestamp;
use izk_crypto::IssuerKeyPair;
use izk_zkp::{ProvingArtifacts, PublicParams, UniversalParams};
use rand_core::OsRng;

use crate::{IncomeClassifier, IssuerRecordJson, VerificationPolicy};

/// 2026-01-01T00:00:00Z.
pub const ISSUED_AT: u64 = 1_767_225_600;

pub fn issuer_key() -> IssuerKeyPair {
    IssuerKeyPair::from_secret_bytes(&[4u8; 32]).unwrap()
}

pub fn record(income: u32) -> IssuerRecordJson {
    let issued = Timestamp::from_epoch_secs(ISSUED_AT as i64).unwrap();
    IssuerRecordJson::signed(&issuer_key(), "900101-14-5678", income, "Test Citizen", issued, "LHDN").unwrap()
}

fn artifacts() -> Arc<ProvingArtifacts> {
    static ARTIFACTS: OnceLock<Arc<ProvingArtifacts>> = OnceLock::new();
    ARTIFACTS
        .get_or_init(|| {
            let params = UniversalParams::generate(16, &mut OsRng).unwrap();
            Arc::new(ProvingArtifacts::generate(&params, &mut OsRng).unwrap())
        })
        .clone()
}

pub fn classifier() -> IncomeClassifier {
    IncomeClassifier::new(artifacts(), PublicParams::default(), VerificationPolicy::default())
}
