//! # Income Classification API
//!
//! `POST /v1/income/classify` proves a bracket from an issuer record and
//! returns the label with the proof envelope. `POST /v1/income/verify`
//! checks an envelope produced elsewhere. Neither response carries income.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use izk_adapter::AdapterResponse;
use izk_core::{IdentityNumber, Timestamp};
use izk_zkp::ProofEnvelope;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

/// Issuer record as signed by the income authority.
///
/// Documents the body of `POST /v1/income/classify`; the body is parsed
/// by the adapter, which rejects unknown fields.
#[derive(Debug, ToSchema)]
pub struct IssuerRecordBody {
    /// Identity card number, 12 digits with optional dashes.
    #[schema(example = "900101-14-5678")]
    pub ic: String,
    /// Monthly income in whole currency units.
    pub monthly_income: i64,
    /// Citizen name; required, never enters the circuit.
    pub citizen_name: String,
    /// ISO 8601 issue time.
    #[schema(example = "2026-01-01T00:00:00Z")]
    pub verification_timestamp: String,
    /// Schnorr signature `R || s`, 128 hex characters.
    pub signature: String,
    /// Issuer public key, 64 hex characters.
    pub public_key: String,
    /// Issuing authority.
    #[schema(example = "LHDN")]
    pub issuer: String,
}

/// Bracket label and authenticity bits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ClassificationResult {
    /// `"B1"`..`"T2"`, or `"unauthentic"`.
    #[schema(example = "B1")]
    pub classification: String,
    pub is_signature_valid: bool,
    pub is_data_authentic: bool,
    /// `B40`, `M40-M1`, `M40-M2`, `T20`; absent when unauthentic.
    pub eligibility_class: Option<String>,
}

impl From<AdapterResponse> for ClassificationResult {
    fn from(r: AdapterResponse) -> Self {
        Self {
            classification: r.classification.as_str().to_string(),
            is_signature_valid: r.is_signature_valid,
            is_data_authentic: r.is_data_authentic,
            eligibility_class: r.eligibility_class.map(|e| e.as_str().to_string()),
        }
    }
}

/// Classification plus the proof a relying party can check.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClassifyResponse {
    pub result: ClassificationResult,
    #[schema(value_type = Object)]
    pub envelope: ProofEnvelope,
}

/// Envelope verification request.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct VerifyRequest {
    /// Proof envelope as returned by classify.
    #[schema(value_type = Object)]
    pub envelope: ProofEnvelope,
    /// Reject the proof unless it was made for this identity number.
    #[serde(default)]
    pub expected_identity: Option<String>,
}

impl Validate for VerifyRequest {
    fn validate(&self) -> Result<(), String> {
        if let Some(ic) = &self.expected_identity {
            IdentityNumber::new(ic).map_err(|e| format!("expected_identity: {e}"))?;
        }
        Ok(())
    }
}

/// Build the income router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/income/classify", post(classify_income))
        .route("/v1/income/verify", post(verify_proof))
}

/// POST /v1/income/classify: Prove the bracket of a signed issuer record.
#[utoipa::path(
    post,
    path = "/v1/income/classify",
    request_body = IssuerRecordBody,
    responses(
        (status = 200, description = "Record classified", body = ClassifyResponse),
        (status = 400, description = "Body is not a valid issuer record", body = crate::error::ErrorBody),
        (status = 422, description = "Record failed validation", body = crate::error::ErrorBody),
        (status = 503, description = "Proving artifacts not loaded", body = crate::error::ErrorBody),
    ),
    tag = "income"
)]
pub(crate) async fn classify_income(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ClassifyResponse>, AppError> {
    let classifier = state.classifier()?;
    let now = Timestamp::now();
    let classified = tokio::task::spawn_blocking(move || classifier.classify_json(&body, now))
        .await
        .map_err(|e| AppError::Internal(format!("proving task failed: {e}")))??;

    Ok(Json(ClassifyResponse {
        result: classified.response.into(),
        envelope: classified.envelope,
    }))
}

/// POST /v1/income/verify: Verify a proof envelope.
#[utoipa::path(
    post,
    path = "/v1/income/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Proof valid", body = ClassificationResult),
        (status = 422, description = "Proof invalid or rejected by policy", body = crate::error::ErrorBody),
        (status = 503, description = "Verification artifacts not loaded", body = crate::error::ErrorBody),
    ),
    tag = "income"
)]
pub(crate) async fn verify_proof(
    State(state): State<AppState>,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<ClassificationResult>, AppError> {
    let req = extract_validated_json(body)?;
    let identity = req
        .expected_identity
        .as_deref()
        .map(IdentityNumber::new)
        .transpose()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let response = state
        .verifier()?
        .verify(&req.envelope, Timestamp::now(), identity.as_ref())?;
    Ok(Json(response.into()))
}
