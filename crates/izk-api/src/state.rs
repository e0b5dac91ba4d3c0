//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! The classifier holds the proving artifacts behind an `Arc`; handlers
//! clone the `Arc` into blocking tasks and never mutate it. A state with no
//! classifier is alive but not ready: readiness reports 503 and every
//! `/v1/income/*` call fails with `SERVICE_UNAVAILABLE`.

use std::path::PathBuf;
use std::sync::Arc;

use izk_adapter::{EnvelopeVerifier, IncomeClassifier};
use izk_crypto::IssuerPublicKey;
use izk_zkp::PublicParams;
use thiserror::Error;

use crate::error::AppError;

/// Default bind port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default artifacts directory.
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// Invalid server configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An environment variable holds an unusable value.
    #[error("invalid {var}: {reason}")]
    Invalid {
        /// Variable name.
        var: &'static str,
        /// What was wrong with it.
        reason: String,
    },
}

/// Server configuration, read once at startup.
///
/// Custom `Debug` redacts the `auth_token` to prevent credential leakage in logs.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Static bearer token for `/v1/*`. If `None`, authentication is disabled.
    pub auth_token: Option<String>,
    /// Where proving artifacts live.
    pub artifacts_dir: PathBuf,
    /// Universal parameter file used to run setup when no artifacts exist.
    pub params_file: Option<PathBuf>,
    /// Only accept records and proofs signed by this issuer, if set.
    pub trusted_issuer: Option<IssuerPublicKey>,
    /// Anti-replay bound and clock skew tolerance.
    pub public_params: PublicParams,
    /// Emit JSON log lines.
    pub log_json: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("artifacts_dir", &self.artifacts_dir)
            .field("params_file", &self.params_file)
            .field("trusted_issuer", &self.trusted_issuer)
            .field("public_params", &self.public_params)
            .field("log_json", &self.log_json)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            auth_token: None,
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
            params_file: None,
            trusted_issuer: None,
            public_params: PublicParams::default(),
            log_json: false,
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT") {
            config.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "PORT",
                reason: format!("\"{port}\" is not a port number"),
            })?;
        }
        config.auth_token = lookup("AUTH_TOKEN").filter(|t| !t.is_empty());
        if let Some(dir) = lookup("IZK_ARTIFACTS_DIR").filter(|d| !d.is_empty()) {
            config.artifacts_dir = PathBuf::from(dir);
        }
        config.params_file = lookup("IZK_PARAMS_FILE")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);
        if let Some(hex) = lookup("IZK_TRUSTED_ISSUER_KEY").filter(|k| !k.is_empty()) {
            let key = IssuerPublicKey::from_hex(hex.trim()).map_err(|e| ConfigError::Invalid {
                var: "IZK_TRUSTED_ISSUER_KEY",
                reason: e.to_string(),
            })?;
            config.trusted_issuer = Some(key);
        }
        config.public_params = PublicParams::from_lookup(&lookup).map_err(|e| ConfigError::Invalid {
            var: "public parameters",
            reason: e.to_string(),
        })?;
        config.log_json = lookup("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json"));

        Ok(config)
    }
}

/// Shared application state.
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    classifier: Option<Arc<IncomeClassifier>>,
}

impl AppState {
    /// State backed by a loaded classifier.
    pub fn new(config: AppConfig, classifier: IncomeClassifier) -> Self {
        Self {
            config: Arc::new(config),
            classifier: Some(Arc::new(classifier)),
        }
    }

    /// State without artifacts: alive, not ready.
    pub fn unready(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
            classifier: None,
        }
    }

    /// Whether proving artifacts are loaded.
    pub fn is_ready(&self) -> bool {
        self.classifier.is_some()
    }

    /// The classifier, or 503 when artifacts are missing.
    pub fn classifier(&self) -> Result<Arc<IncomeClassifier>, AppError> {
        self.classifier
            .clone()
            .ok_or_else(|| AppError::ServiceUnavailable("proving artifacts are not loaded".into()))
    }

    /// The verifier half of the classifier.
    pub fn verifier(&self) -> Result<&EnvelopeVerifier, AppError> {
        self.classifier
            .as_deref()
            .map(IncomeClassifier::verifier)
            .ok_or_else(|| AppError::ServiceUnavailable("verification artifacts are not loaded".into()))
    }
}
