//! # izk-api: Income Classification Service
//!
//! Wraps the classification pipeline in an HTTP service. Proving runs on
//! the blocking pool; verification and metadata are served inline.
//!
//! ## API Surface
//!
//! | Route                        | Auth   | Module              |
//! |------------------------------|--------|---------------------|
//! | `POST /v1/income/classify`   | bearer | [`routes::income`]  |
//! | `POST /v1/income/verify`     | bearer | [`routes::income`]  |
//! | `GET /v1/circuit`            | bearer | [`routes::circuit`] |
//! | `GET /openapi.json`          | none   | [`openapi`]         |
//! | `GET /health/liveness`       | none   |                     |
//! | `GET /health/readiness`      | none   |                     |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → AuthMiddleware → Handler
//! ```

pub mod auth;
pub mod bootstrap;
pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::error::AppError;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes and `/openapi.json` are mounted outside the auth
/// middleware so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    let api = Router::new()
        .merge(routes::income::router())
        .merge(routes::circuit::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(axum::Extension(auth_config));

    let public = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .merge(openapi::router());

    Router::new()
        .merge(public)
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe: 200 while the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 once proving artifacts are loaded.
async fn readiness(State(state): State<AppState>) -> Result<&'static str, AppError> {
    if state.is_ready() {
        Ok("ready")
    } else {
        Err(AppError::ServiceUnavailable("proving artifacts are not loaded".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, OnceLock};

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use izk_adapter::{IncomeClassifier, IssuerRecordJson, VerificationPolicy};
    use izk_core::Timestamp;
    use izk_crypto::IssuerKeyPair;
    use izk_zkp::{ProvingArtifacts, PublicParams, UniversalParams};
    use rand_core::OsRng;
    use tower::ServiceExt;

    use crate::state::AppConfig;

    const TOKEN: &str = "test-token";

    fn artifacts() -> Arc<ProvingArtifacts> {
        static ARTIFACTS: OnceLock<Arc<ProvingArtifacts>> = OnceLock::new();
        ARTIFACTS
            .get_or_init(|| {
                let params = UniversalParams::generate(16, &mut OsRng).unwrap();
                Arc::new(ProvingArtifacts::generate(&params, &mut OsRng).unwrap())
            })
            .clone()
    }

    fn issuer() -> IssuerKeyPair {
        IssuerKeyPair::from_secret_bytes(&[1u8; 32]).unwrap()
    }

    fn ready_app(policy: VerificationPolicy) -> Router {
        let config = AppConfig {
            auth_token: Some(TOKEN.into()),
            ..AppConfig::default()
        };
        let classifier = IncomeClassifier::new(artifacts(), PublicParams::default(), policy);
        app(AppState::new(config, classifier))
    }

    fn record_json(income: u32, age_secs: i64) -> String {
        let issued = Timestamp::from_epoch_secs(Timestamp::now().epoch_secs() - age_secs).unwrap();
        let record =
            IssuerRecordJson::signed(&issuer(), "900101-14-5678", income, "Test Citizen", issued, "LHDN").unwrap();
        serde_json::to_string(&record).unwrap()
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<String>) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", format!("Bearer {TOKEN}"));
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        let request = builder.body(body.map(Body::from).unwrap_or_else(Body::empty)).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn health_probes_need_no_token() {
        let app = app(AppState::unready(AppConfig {
            auth_token: Some(TOKEN.into()),
            ..AppConfig::default()
        }));
        let live = app
            .clone()
            .oneshot(Request::get("/health/liveness").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(live.status(), StatusCode::OK);

        let ready = app
            .clone()
            .oneshot(Request::get("/health/readiness").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(ready.status(), StatusCode::SERVICE_UNAVAILABLE);

        let doc = app
            .oneshot(Request::get("/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(doc.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn v1_routes_require_token() {
        let app = ready_app(VerificationPolicy::default());
        let response = app
            .oneshot(Request::get("/v1/circuit").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unready_service_returns_503() {
        let app = app(AppState::unready(AppConfig::default()));
        let (status, body) = send(app, "POST", "/v1/income/classify", Some(record_json(1800, 60))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn circuit_metadata() {
        let (status, body) = send(ready_app(VerificationPolicy::default()), "GET", "/v1/circuit", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["public_input_count"], 17);
        assert_eq!(body["brackets"].as_array().unwrap().len(), 10);
        assert_eq!(body["verification_key"]["protocol"], "groth16");
        assert_eq!(body["verification_key"]["nPublic"], 17);
    }

    #[tokio::test]
    async fn classify_then_verify() {
        let app = ready_app(VerificationPolicy::default());
        let (status, body) = send(app.clone(), "POST", "/v1/income/classify", Some(record_json(1800, 60))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["classification"], "B1");
        assert_eq!(body["result"]["is_data_authentic"], true);
        assert_eq!(body["result"]["eligibility_class"], "B40");
        assert!(body["result"].get("monthly_income").is_none());

        let request = serde_json::json!({
            "envelope": body["envelope"],
            "expected_identity": "900101145678",
        });
        let (status, verified) = send(app, "POST", "/v1/income/verify", Some(request.to_string())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(verified, body["result"]);
    }

    #[tokio::test]
    async fn stale_record_is_unauthentic_not_an_error() {
        let app = ready_app(VerificationPolicy::default());
        let (status, body) = send(app, "POST", "/v1/income/classify", Some(record_json(1800, 90_000))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["classification"], "unauthentic");
        assert_eq!(body["result"]["is_signature_valid"], true);
        assert_eq!(body["result"]["is_data_authentic"], false);
        assert!(body["result"]["eligibility_class"].is_null());
    }

    #[tokio::test]
    async fn malformed_and_invalid_records() {
        let app = ready_app(VerificationPolicy::default());
        let (status, _) = send(app.clone(), "POST", "/v1/income/classify", Some("{\"ic\": ".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut record: serde_json::Value = serde_json::from_str(&record_json(1800, 60)).unwrap();
        record["extra"] = serde_json::json!(1);
        let (status, _) = send(app.clone(), "POST", "/v1/income/classify", Some(record.to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut record: serde_json::Value = serde_json::from_str(&record_json(1800, 60)).unwrap();
        record["monthly_income"] = serde_json::json!(-5);
        let (status, body) = send(app, "POST", "/v1/income/classify", Some(record.to_string())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn records_without_name_or_issuer_are_rejected() {
        let app = ready_app(VerificationPolicy::default());
        for field in ["citizen_name", "issuer"] {
            let mut record: serde_json::Value = serde_json::from_str(&record_json(1800, 60)).unwrap();
            record.as_object_mut().unwrap().remove(field);
            let (status, body) = send(app.clone(), "POST", "/v1/income/classify", Some(record.to_string())).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert!(body["error"]["message"].as_str().unwrap().contains(field));
        }
    }

    #[tokio::test]
    async fn tampered_envelope_rejected() {
        let app = ready_app(VerificationPolicy::default());
        let (_, body) = send(app.clone(), "POST", "/v1/income/classify", Some(record_json(6340, 60))).await;
        assert_eq!(body["result"]["classification"], "M2");

        let mut envelope = body["envelope"].clone();
        let signals = envelope["public_signals"].as_array_mut().unwrap();
        signals.swap(2, 7);
        let request = serde_json::json!({ "envelope": envelope });
        let (status, err) = send(app, "POST", "/v1/income/verify", Some(request.to_string())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err["error"]["code"], "PROOF_REJECTED");
    }

    #[tokio::test]
    async fn pinned_issuer_rejects_others() {
        let other = IssuerKeyPair::from_secret_bytes(&[2u8; 32]).unwrap();
        let app = ready_app(VerificationPolicy::default().with_trusted_issuer(other.public_key()));
        let (status, body) = send(app, "POST", "/v1/income/classify", Some(record_json(4000, 60))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "PROOF_REJECTED");
    }

    #[tokio::test]
    async fn verify_rejects_bad_identity() {
        let app = ready_app(VerificationPolicy::default());
        let (_, body) = send(app.clone(), "POST", "/v1/income/classify", Some(record_json(3000, 60))).await;
        let request = serde_json::json!({
            "envelope": body["envelope"],
            "expected_identity": "not-an-ic",
        });
        let (status, err) = send(app, "POST", "/v1/income/verify", Some(request.to_string())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err["error"]["code"], "VALIDATION_ERROR");
    }
}
