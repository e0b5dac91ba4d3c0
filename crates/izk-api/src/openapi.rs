//! # OpenAPI Document Assembly
//!
//! Serves the utoipa-generated document at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI document for the API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "izk API: Income Bracket Classification",
        description = "Zero-knowledge proofs that a signed income record falls in a DOSM household income bracket, without disclosing the income.",
        license(name = "BUSL-1.1")
    ),
    paths(
        crate::routes::income::classify_income,
        crate::routes::income::verify_proof,
        crate::routes::circuit::circuit_info,
    ),
    components(schemas(
        crate::routes::income::IssuerRecordBody,
        crate::routes::income::ClassificationResult,
        crate::routes::income::ClassifyResponse,
        crate::routes::income::VerifyRequest,
        crate::routes::circuit::BracketInfo,
        crate::routes::circuit::CircuitInfo,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "income", description = "Classification and verification"),
        (name = "circuit", description = "Circuit metadata and verification key"),
    )
)]
pub struct ApiDoc;

/// Router serving `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
