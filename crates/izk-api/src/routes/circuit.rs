//! # Circuit Metadata
//!
//! `GET /v1/circuit` publishes what a relying party needs to verify
//! proofs offline: the circuit fingerprint, bracket table, anti-replay
//! bound, pinned issuer, and the snarkjs-format verification key.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use izk_core::BracketLabel;
use izk_zkp::VerificationKeyJson;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::state::AppState;

/// One row of the bracket table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BracketInfo {
    #[schema(example = "B1")]
    pub label: String,
    /// Vector position in the public signals.
    pub index: usize,
    /// Inclusive lower bound.
    pub min_income: u64,
    /// Inclusive upper bound; absent for the top bracket.
    pub max_income: Option<u64>,
    pub eligibility_class: String,
}

/// Circuit and deployment parameters.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CircuitInfo {
    pub circuit_id: String,
    pub circuit_version: u32,
    /// Hex fingerprint every proof must carry.
    pub fingerprint: String,
    pub constraint_count: usize,
    pub public_input_count: usize,
    pub max_signature_age_seconds: u64,
    /// Pinned issuer public key (hex), if any.
    pub trusted_issuer: Option<String>,
    pub brackets: Vec<BracketInfo>,
    #[schema(value_type = Object)]
    pub verification_key: VerificationKeyJson,
}

/// Build the circuit router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/circuit", get(circuit_info))
}

pub(crate) fn bracket_table() -> Vec<BracketInfo> {
    BracketLabel::ALL
        .iter()
        .map(|label| {
            let (min_income, max_income) = label.range();
            BracketInfo {
                label: label.as_str().to_string(),
                index: label.index(),
                min_income,
                max_income,
                eligibility_class: label.eligibility_class().as_str().to_string(),
            }
        })
        .collect()
}

/// GET /v1/circuit: Circuit fingerprint, bracket table, and verification key.
#[utoipa::path(
    get,
    path = "/v1/circuit",
    responses(
        (status = 200, description = "Circuit metadata", body = CircuitInfo),
        (status = 503, description = "Artifacts not loaded", body = crate::error::ErrorBody),
    ),
    tag = "circuit"
)]
pub(crate) async fn circuit_info(State(state): State<AppState>) -> Result<Json<CircuitInfo>, AppError> {
    let verifier = state.verifier()?;
    let artifacts = verifier.artifacts();
    let manifest = artifacts.manifest();
    let policy = verifier.policy();

    Ok(Json(CircuitInfo {
        circuit_id: manifest.circuit_id.clone(),
        circuit_version: manifest.circuit_version,
        fingerprint: manifest.fingerprint.to_hex(),
        constraint_count: manifest.constraint_count,
        public_input_count: manifest.public_input_count,
        max_signature_age_seconds: policy.max_signature_age_seconds,
        trusted_issuer: policy.trusted_issuer.map(|k| k.to_hex()),
        brackets: bracket_table(),
        verification_key: artifacts.verification_key_json(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracket_table_covers_every_income() {
        let table = bracket_table();
        assert_eq!(table.len(), 10);
        assert_eq!(table[0].min_income, 0);
        assert_eq!(table[0].max_income, Some(2560));
        assert_eq!(table[5].label, "M2");
        assert_eq!(table[5].min_income, 6340);
        assert_eq!(table[9].max_income, None);
        for pair in table.windows(2) {
            assert_eq!(pair[0].max_income.map(|m| m + 1), Some(pair[1].min_income));
        }
    }
}
