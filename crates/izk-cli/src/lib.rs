//! # izk-cli: The `izk` Command-Line Tool
//!
//! Drives the proof lifecycle from files on disk:
//!
//! ```bash
//! izk params new --power 16 --out params.json
//! izk setup --params params.json
//! izk issuer keygen --output keys/
//! izk issuer sign --key keys/issuer.key --ic 900101-14-5678 --income 1800 --out record.json
//! izk witness record.json --out input.json
//! izk prove input.json --out envelope.json
//! izk verify envelope.json --trusted-issuer "$(cat keys/issuer.pub)"
//! izk classify record.json
//! izk inspect --envelope envelope.json
//! ```
//!
//! Every handler returns an exit code: `0` success, `1` a negative
//! verification result. Errors propagate as `anyhow::Error` and exit `1`.

pub mod issuer;
pub mod params;
pub mod prove;
pub mod setup;
pub mod verify;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use izk_core::Timestamp;
use serde::{de::DeserializeOwned, Serialize};

/// Default artifacts directory when neither the flag nor the environment sets one.
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// Environment variable naming the artifacts directory.
pub const ENV_ARTIFACTS_DIR: &str = "IZK_ARTIFACTS_DIR";

/// Settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct CliContext {
    /// Where setup writes and everything else reads proving artifacts.
    pub artifacts_dir: PathBuf,
}

impl CliContext {
    /// Resolve the artifacts directory: flag, then environment, then default.
    pub fn resolve(flag: Option<PathBuf>) -> Self {
        let artifacts_dir = flag
            .or_else(|| std::env::var_os(ENV_ARTIFACTS_DIR).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACTS_DIR));
        Self { artifacts_dir }
    }
}

/// Read and parse a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

/// Write pretty JSON to `path`, or stdout when `path` is `None`.
pub fn write_json<T: Serialize>(path: Option<&Path>, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(path, text + "\n")
                .with_context(|| format!("failed to write {}", path.display()))
        }
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

/// Parse an optional `--now` override, defaulting to the current time.
pub fn resolve_now(now: Option<&str>) -> Result<Timestamp> {
    match now {
        Some(s) => Timestamp::parse_lenient(s).with_context(|| format!("invalid --now value \"{s}\"")),
        None => Ok(Timestamp::now()),
    }
}
