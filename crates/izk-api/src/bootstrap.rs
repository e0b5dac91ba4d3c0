//! # Startup
//!
//! Loads proving artifacts from `IZK_ARTIFACTS_DIR`, running setup first
//! when the directory is empty and `IZK_PARAMS_FILE` names a parameter
//! file. With neither, the server starts unready.
//!
//! Setup is CPU-bound; call [`bootstrap`] from a blocking task.

use std::sync::Arc;
use std::time::Instant;

use izk_adapter::{IncomeClassifier, VerificationPolicy};
use izk_zkp::{SetupError, SetupManager, UniversalParams};

use crate::state::{AppConfig, AppState};

/// Errors during startup. All are fatal.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Artifacts could not be loaded or generated.
    #[error("setup failed: {0}")]
    Setup(#[from] SetupError),
}

/// Build the application state from `config`.
pub fn bootstrap(config: AppConfig) -> Result<AppState, BootstrapError> {
    let manager = SetupManager::new(config.artifacts_dir.clone());
    let start = Instant::now();

    let artifacts = if manager.is_initialized() {
        manager.load()?
    } else if let Some(params_file) = &config.params_file {
        tracing::info!(params = %params_file.display(), "no artifacts found, running setup");
        let params = UniversalParams::load(params_file)?;
        manager.generate(&params)?
    } else {
        tracing::warn!(
            artifacts_dir = %config.artifacts_dir.display(),
            "no artifacts and no IZK_PARAMS_FILE; starting unready"
        );
        return Ok(AppState::unready(config));
    };

    let mut policy = VerificationPolicy::from_params(&config.public_params);
    if let Some(key) = config.trusted_issuer {
        policy = policy.with_trusted_issuer(key);
    }

    tracing::info!(
        circuit_id = artifacts.circuit_id(),
        fingerprint = %artifacts.fingerprint(),
        constraints = artifacts.constraint_count(),
        pinned_issuer = config.trusted_issuer.is_some(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "proving artifacts loaded"
    );

    let classifier = IncomeClassifier::new(Arc::new(artifacts), config.public_params, policy);
    Ok(AppState::new(config, classifier))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::OsRng;

    #[test]
    fn empty_directory_without_params_is_unready() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            artifacts_dir: dir.path().join("artifacts"),
            ..AppConfig::default()
        };
        let state = bootstrap(config).unwrap();
        assert!(!state.is_ready());
    }

    #[test]
    fn missing_params_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            artifacts_dir: dir.path().join("artifacts"),
            params_file: Some(dir.path().join("absent.json")),
            ..AppConfig::default()
        };
        assert!(bootstrap(config).is_err());
    }

    #[test]
    fn runs_setup_then_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let params_path = dir.path().join("params.json");
        UniversalParams::generate(16, &mut OsRng)
            .unwrap()
            .save(&params_path)
            .unwrap();
        let config = AppConfig {
            artifacts_dir: dir.path().join("artifacts"),
            params_file: Some(params_path),
            ..AppConfig::default()
        };

        let first = bootstrap(config.clone()).unwrap();
        assert!(first.is_ready());

        let reloaded = bootstrap(AppConfig {
            params_file: None,
            ..config
        })
        .unwrap();
        let a = first.classifier().unwrap().artifacts().fingerprint();
        let b = reloaded.classifier().unwrap().artifacts().fingerprint();
        assert_eq!(a, b);
    }
}
