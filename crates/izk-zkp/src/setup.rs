//! # Trusted Setup and Artifact Management
//!
//! Derives Groth16 keys for the classification circuit once per circuit
//! version, persists them, and reloads them with integrity checks.
//!
//! ## Fingerprint
//!
//! A [`CircuitFingerprint`] is SHA-256 over a domain tag, the circuit id and
//! version, the variable and constraint counts, and every entry of the A/B/C
//! matrices produced by setup-mode synthesis. Any change to the constraint
//! system changes the fingerprint. Manifests, proof envelopes, and the
//! verifier all carry it, so keys and proofs for different circuit versions
//! can never be mixed silently.
//!
//! ## Universal Parameters
//!
//! Groth16 keys are circuit-specific, so the parameter file is a capacity
//! bound plus an identifying beacon: setup refuses to run if
//! `2^power < constraints + instance variables`, and the parameter file's
//! canonical digest is recorded in the manifest. Toxic waste is drawn from
//! the operating system RNG and never stored.
//!
//! ## On-Disk Layout
//!
//! ```text
//! <artifacts_dir>/
//!   proving_key.bin          compressed arkworks encoding
//!   verification_key.json    snarkjs layout
//!   manifest.json            written last; its presence marks completion
//!   .setup.lock              exists only while a setup run is active
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Instant;

use ark_bn254::Bn254;
use ark_ff::{BigInteger, PrimeField};
use ark_groth16::{Groth16, PreparedVerifyingKey, ProvingKey, VerifyingKey};
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystem, OptimizationGoal, SynthesisMode,
};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::{CircuitSpecificSetupSNARK, SNARK};
use izk_core::{sha256_bytes, sha256_digest, CanonicalBytes, ContentDigest, Sha256Accumulator, Timestamp};
use parking_lot::Mutex;
use rand_core::{CryptoRng, OsRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, error, info, warn};

use crate::circuit::{ClassificationCircuit, CIRCUIT_ID, CIRCUIT_VERSION};
use crate::error::SetupError;
use crate::formats::VerificationKeyJson;
use crate::Fr;

/// Format tag of universal parameter files.
pub const PARAMS_FORMAT: &str = "izk-universal-params/v1";
/// Curve universal parameters are defined over.
pub const PARAMS_CURVE: &str = "bn254";
/// Largest accepted parameter power.
pub const MAX_POWER: u32 = 28;
/// Manifest schema version.
pub const MANIFEST_VERSION: u32 = 1;

/// Proving key file name.
pub const PROVING_KEY_FILE: &str = "proving_key.bin";
/// Verification key file name.
pub const VERIFICATION_KEY_FILE: &str = "verification_key.json";
/// Manifest file name.
pub const MANIFEST_FILE: &str = "manifest.json";
/// Lock file name.
pub const LOCK_FILE: &str = ".setup.lock";

const FINGERPRINT_DOMAIN: &[u8] = b"izk/circuit-fingerprint/v1";

// ---------------------------------------------------------------------------
// Universal parameters
// ---------------------------------------------------------------------------

/// The universal parameter file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UniversalParams {
    /// Always [`PARAMS_FORMAT`].
    pub format: String,
    /// Always [`PARAMS_CURVE`].
    pub curve: String,
    /// Capacity exponent: the file supports circuits up to `2^power` terms.
    pub power: u32,
    /// 32-byte hex beacon identifying this parameter set.
    pub beacon: String,
}

impl UniversalParams {
    /// Create a fresh parameter set with a random beacon.
    pub fn generate<R: RngCore + CryptoRng>(power: u32, rng: &mut R) -> Result<Self, SetupError> {
        let mut beacon = [0u8; 32];
        rng.fill_bytes(&mut beacon);
        let params = Self {
            format: PARAMS_FORMAT.into(),
            curve: PARAMS_CURVE.into(),
            power,
            beacon: izk_core::hex::encode(&beacon),
        };
        params.validate()?;
        Ok(params)
    }

    /// Read and validate a parameter file.
    pub fn load(path: &Path) -> Result<Self, SetupError> {
        let bytes = fs::read(path).map_err(|e| SetupError::io(path, e))?;
        let params: Self = serde_json::from_slice(&bytes)
            .map_err(|e| SetupError::MalformedParameterFile(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    /// Write the parameter file as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), SetupError> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| SetupError::Serialization(e.to_string()))?;
        write_atomic(path, &json)
    }

    /// Check format, curve, power, and beacon.
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.format != PARAMS_FORMAT {
            return Err(SetupError::MalformedParameterFile(format!(
                "unsupported format \"{}\"",
                self.format
            )));
        }
        if self.curve != PARAMS_CURVE {
            return Err(SetupError::MalformedParameterFile(format!(
                "unsupported curve \"{}\"",
                self.curve
            )));
        }
        if self.power == 0 || self.power > MAX_POWER {
            return Err(SetupError::MalformedParameterFile(format!(
                "power {} outside 1..={MAX_POWER}",
                self.power
            )));
        }
        izk_core::hex::decode_fixed::<32>(&self.beacon)
            .map_err(|e| SetupError::MalformedParameterFile(format!("beacon: {e}")))?;
        Ok(())
    }

    /// `2^power`.
    pub fn capacity(&self) -> usize {
        1usize << self.power
    }

    /// Canonical digest recorded in manifests.
    pub fn digest(&self) -> Result<ContentDigest, SetupError> {
        let canonical =
            CanonicalBytes::new(self).map_err(|e| SetupError::Serialization(e.to_string()))?;
        Ok(sha256_digest(&canonical))
    }
}

// ---------------------------------------------------------------------------
// Fingerprint and shape
// ---------------------------------------------------------------------------

/// SHA-256 fingerprint of a constraint system. Serializes as hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CircuitFingerprint([u8; 32]);

impl CircuitFingerprint {
    /// Wrap raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex.
    pub fn to_hex(&self) -> String {
        izk_core::hex::encode(&self.0)
    }

    /// Parse 64 hex characters.
    pub fn from_hex(s: &str) -> Result<Self, String> {
        izk_core::hex::decode_fixed::<32>(s).map(Self)
    }
}

impl std::fmt::Display for CircuitFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::fmt::Debug for CircuitFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CircuitFingerprint({})", &self.to_hex()[..16])
    }
}

impl Serialize for CircuitFingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CircuitFingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Size and identity of the compiled constraint system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitShape {
    /// Matrix fingerprint.
    pub fingerprint: CircuitFingerprint,
    /// R1CS constraints after inlining.
    pub constraint_count: usize,
    /// Public signals, excluding the constant `1`.
    pub public_input_count: usize,
    /// Private variables.
    pub witness_count: usize,
}

static SHAPE: OnceLock<CircuitShape> = OnceLock::new();

impl CircuitShape {
    /// Shape of the classification circuit, computed once per process.
    pub fn current() -> Result<Self, SetupError> {
        if let Some(shape) = SHAPE.get() {
            return Ok(*shape);
        }
        let shape = Self::compute(ClassificationCircuit::blank())?;
        Ok(*SHAPE.get_or_init(|| shape))
    }

    /// Synthesize `circuit` in setup mode and fingerprint its matrices.
    pub fn compute(circuit: ClassificationCircuit) -> Result<Self, SetupError> {
        let start = Instant::now();
        let cs = ConstraintSystem::<Fr>::new_ref();
        cs.set_optimization_goal(OptimizationGoal::Constraints);
        cs.set_mode(SynthesisMode::Setup);
        circuit
            .generate_constraints(cs.clone())
            .map_err(|e| SetupError::MalformedConstraintSystem(e.to_string()))?;
        cs.finalize();
        let matrices = cs.to_matrices().ok_or_else(|| {
            SetupError::MalformedConstraintSystem("constraint matrices unavailable".into())
        })?;

        let mut acc = Sha256Accumulator::new();
        acc.update(FINGERPRINT_DOMAIN)
            .update(CIRCUIT_ID)
            .update_u64(u64::from(CIRCUIT_VERSION))
            .update_u64(matrices.num_instance_variables as u64)
            .update_u64(matrices.num_witness_variables as u64)
            .update_u64(matrices.num_constraints as u64);
        for matrix in [&matrices.a, &matrices.b, &matrices.c] {
            acc.update_u64(matrix.len() as u64);
            for row in matrix {
                acc.update_u64(row.len() as u64);
                for (coeff, index) in row {
                    acc.update(coeff.into_bigint().to_bytes_le())
                        .update_u64(*index as u64);
                }
            }
        }

        let shape = Self {
            fingerprint: CircuitFingerprint(acc.finalize()),
            constraint_count: matrices.num_constraints,
            public_input_count: matrices.num_instance_variables.saturating_sub(1),
            witness_count: matrices.num_witness_variables,
        };
        debug!(
            fingerprint = %shape.fingerprint,
            constraints = shape.constraint_count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "circuit shape computed"
        );
        Ok(shape)
    }

    /// Evaluation domain size Groth16 needs for this circuit.
    pub fn required_capacity(&self) -> usize {
        self.constraint_count + self.public_input_count + 1
    }

    /// Fail if `params` cannot hold this circuit.
    pub fn check_capacity(&self, params: &UniversalParams) -> Result<(), SetupError> {
        let required = self.required_capacity();
        if params.capacity() < required {
            return Err(SetupError::ParameterFileTooSmall {
                power: params.power,
                available: params.capacity(),
                required,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Manifest and artifacts
// ---------------------------------------------------------------------------

/// Metadata binding a key pair to a circuit version and parameter set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactManifest {
    /// Manifest schema version.
    pub version: u32,
    /// Circuit identifier.
    pub circuit_id: String,
    /// Circuit version.
    pub circuit_version: u32,
    /// Constraint system fingerprint.
    pub fingerprint: CircuitFingerprint,
    /// R1CS constraints.
    pub constraint_count: usize,
    /// Public signals.
    pub public_input_count: usize,
    /// Digest of the universal parameter file used.
    pub params_digest: ContentDigest,
    /// Digest of `proving_key.bin`.
    pub proving_key_digest: ContentDigest,
    /// Digest of `verification_key.json`.
    pub verification_key_digest: ContentDigest,
    /// When setup ran.
    pub created_at: Timestamp,
}

/// Verifier-side artifacts: key, prepared key, and manifest.
#[derive(Clone)]
pub struct VerificationArtifacts {
    verifying_key: VerifyingKey<Bn254>,
    prepared: PreparedVerifyingKey<Bn254>,
    manifest: ArtifactManifest,
}

impl VerificationArtifacts {
    /// Assemble from a key and its manifest.
    ///
    /// # Errors
    ///
    /// [`SetupError::ArtifactConflict`] if the key's input count disagrees
    /// with the manifest.
    pub fn new(verifying_key: VerifyingKey<Bn254>, manifest: ArtifactManifest) -> Result<Self, SetupError> {
        if verifying_key.gamma_abc_g1.len() != manifest.public_input_count + 1 {
            return Err(SetupError::ArtifactConflict(format!(
                "verification key has {} input bases, manifest declares {} public inputs",
                verifying_key.gamma_abc_g1.len(),
                manifest.public_input_count
            )));
        }
        let prepared = Groth16::<Bn254>::process_vk(&verifying_key)
            .map_err(|e| SetupError::Serialization(e.to_string()))?;
        Ok(Self {
            verifying_key,
            prepared,
            manifest,
        })
    }

    /// The verifying key.
    pub fn verifying_key(&self) -> &VerifyingKey<Bn254> {
        &self.verifying_key
    }

    /// The prepared verifying key used for pairing checks.
    pub fn prepared(&self) -> &PreparedVerifyingKey<Bn254> {
        &self.prepared
    }

    /// The manifest.
    pub fn manifest(&self) -> &ArtifactManifest {
        &self.manifest
    }

    /// Circuit fingerprint.
    pub fn fingerprint(&self) -> CircuitFingerprint {
        self.manifest.fingerprint
    }

    /// Circuit identifier.
    pub fn circuit_id(&self) -> &str {
        &self.manifest.circuit_id
    }

    /// Number of public signals.
    pub fn public_input_count(&self) -> usize {
        self.manifest.public_input_count
    }

    /// The verification key in snarkjs layout.
    pub fn verification_key_json(&self) -> VerificationKeyJson {
        VerificationKeyJson::from_vk(&self.verifying_key)
    }
}

impl std::fmt::Debug for VerificationArtifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationArtifacts")
            .field("manifest", &self.manifest)
            .finish_non_exhaustive()
    }
}

/// Proving key plus the verifier-side artifacts. Immutable once built.
#[derive(Clone)]
pub struct ProvingArtifacts {
    proving_key: ProvingKey<Bn254>,
    verification: VerificationArtifacts,
}

impl ProvingArtifacts {
    /// Run Groth16 setup in memory without persisting anything.
    pub fn generate<R: RngCore + CryptoRng>(
        params: &UniversalParams,
        rng: &mut R,
    ) -> Result<Self, SetupError> {
        params.validate()?;
        let shape = CircuitShape::current()?;
        shape.check_capacity(params)?;

        let start = Instant::now();
        let (proving_key, verifying_key) =
            Groth16::<Bn254>::circuit_specific_setup(ClassificationCircuit::blank(), rng)
                .map_err(|e| SetupError::MalformedConstraintSystem(e.to_string()))?;

        let pk_bytes = encode_proving_key(&proving_key)?;
        let vk_bytes = encode_verification_key(&verifying_key)?;
        let manifest = ArtifactManifest {
            version: MANIFEST_VERSION,
            circuit_id: CIRCUIT_ID.into(),
            circuit_version: CIRCUIT_VERSION,
            fingerprint: shape.fingerprint,
            constraint_count: shape.constraint_count,
            public_input_count: shape.public_input_count,
            params_digest: params.digest()?,
            proving_key_digest: sha256_bytes(&pk_bytes),
            verification_key_digest: sha256_bytes(&vk_bytes),
            created_at: Timestamp::now(),
        };
        info!(
            circuit_id = CIRCUIT_ID,
            fingerprint = %shape.fingerprint,
            constraints = shape.constraint_count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "groth16 setup complete"
        );
        Ok(Self {
            proving_key,
            verification: VerificationArtifacts::new(verifying_key, manifest)?,
        })
    }

    /// The proving key.
    pub fn proving_key(&self) -> &ProvingKey<Bn254> {
        &self.proving_key
    }

    /// Verifier-side view.
    pub fn verification(&self) -> &VerificationArtifacts {
        &self.verification
    }

    /// The manifest.
    pub fn manifest(&self) -> &ArtifactManifest {
        self.verification.manifest()
    }

    /// Circuit identifier.
    pub fn circuit_id(&self) -> &str {
        self.verification.circuit_id()
    }

    /// Constraint count.
    pub fn constraint_count(&self) -> usize {
        self.manifest().constraint_count
    }

    /// Circuit fingerprint.
    pub fn fingerprint(&self) -> CircuitFingerprint {
        self.verification.fingerprint()
    }
}

impl std::fmt::Debug for ProvingArtifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvingArtifacts")
            .field("manifest", self.manifest())
            .finish_non_exhaustive()
    }
}

fn encode_proving_key(pk: &ProvingKey<Bn254>) -> Result<Vec<u8>, SetupError> {
    let mut bytes = Vec::with_capacity(pk.compressed_size());
    pk.serialize_compressed(&mut bytes)
        .map_err(|e| SetupError::Serialization(e.to_string()))?;
    Ok(bytes)
}

fn encode_verification_key(vk: &VerifyingKey<Bn254>) -> Result<Vec<u8>, SetupError> {
    serde_json::to_vec_pretty(&VerificationKeyJson::from_vk(vk))
        .map_err(|e| SetupError::Serialization(e.to_string()))
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

static SETUP_MUTEX: Mutex<()> = parking_lot::const_mutex(());

/// Owns an artifacts directory: runs setup into it and loads from it.
#[derive(Debug, Clone)]
pub struct SetupManager {
    dir: PathBuf,
}

impl SetupManager {
    /// Manage artifacts under `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The artifacts directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether a completed setup exists.
    pub fn is_initialized(&self) -> bool {
        self.dir.join(MANIFEST_FILE).is_file()
    }

    /// Run setup once for this circuit version.
    ///
    /// Reuses existing artifacts when their fingerprint and parameter digest
    /// match; never overwrites artifacts made for anything else.
    ///
    /// # Errors
    ///
    /// [`SetupError::ParameterFileTooSmall`], [`SetupError::SetupInProgress`]
    /// when another process holds the lock, [`SetupError::ArtifactConflict`]
    /// when the directory holds artifacts for a different circuit or
    /// parameter set, and I/O or serialization failures.
    pub fn generate(&self, params: &UniversalParams) -> Result<ProvingArtifacts, SetupError> {
        params.validate()?;
        let shape = CircuitShape::current()?;
        shape.check_capacity(params)?;
        let params_digest = params.digest()?;

        let _in_process = SETUP_MUTEX.lock();
        fs::create_dir_all(&self.dir).map_err(|e| SetupError::io(&self.dir, e))?;
        let _lock = SetupLock::acquire(&self.dir.join(LOCK_FILE))?;

        if self.is_initialized() {
            let existing = self.read_manifest()?;
            if existing.fingerprint == shape.fingerprint && existing.params_digest == params_digest {
                info!(fingerprint = %shape.fingerprint, dir = %self.dir.display(), "setup already done, reusing artifacts");
                return self.load();
            }
            warn!(
                existing = %existing.fingerprint,
                current = %shape.fingerprint,
                "refusing to overwrite artifacts"
            );
            return Err(SetupError::ArtifactConflict(format!(
                "{} holds artifacts for fingerprint {} / params {}, requested {} / {}",
                self.dir.display(),
                existing.fingerprint,
                existing.params_digest,
                shape.fingerprint,
                params_digest
            )));
        }

        let artifacts = ProvingArtifacts::generate(params, &mut OsRng).map_err(|e| {
            error!(error = %e, "groth16 setup failed");
            e
        })?;
        self.persist(&artifacts)?;
        info!(dir = %self.dir.display(), "artifacts persisted");
        Ok(artifacts)
    }

    /// Load proving and verification artifacts.
    ///
    /// # Errors
    ///
    /// [`SetupError::Integrity`] if a file does not match its manifest
    /// digest; [`SetupError::ArtifactConflict`] if the artifacts were made
    /// for a different constraint system than this build compiles.
    pub fn load(&self) -> Result<ProvingArtifacts, SetupError> {
        let manifest = self.read_checked_manifest()?;
        let pk_path = self.dir.join(PROVING_KEY_FILE);
        let pk_bytes = fs::read(&pk_path).map_err(|e| SetupError::io(&pk_path, e))?;
        check_digest(PROVING_KEY_FILE, &manifest.proving_key_digest, &pk_bytes)?;
        // Digest-verified bytes written by this manager; skip subgroup checks.
        let proving_key = ProvingKey::<Bn254>::deserialize_compressed_unchecked(&pk_bytes[..])
            .map_err(|e| SetupError::Serialization(e.to_string()))?;
        let verification = self.load_verification_with(manifest)?;
        debug!(dir = %self.dir.display(), "proving artifacts loaded");
        Ok(ProvingArtifacts {
            proving_key,
            verification,
        })
    }

    /// Load only what a verifier needs.
    pub fn load_verification(&self) -> Result<VerificationArtifacts, SetupError> {
        let manifest = self.read_checked_manifest()?;
        self.load_verification_with(manifest)
    }

    /// Read the manifest without checking it against this build.
    pub fn read_manifest(&self) -> Result<ArtifactManifest, SetupError> {
        let path = self.dir.join(MANIFEST_FILE);
        let bytes = fs::read(&path).map_err(|e| SetupError::io(&path, e))?;
        serde_json::from_slice(&bytes).map_err(|e| SetupError::Serialization(format!("{MANIFEST_FILE}: {e}")))
    }

    fn read_checked_manifest(&self) -> Result<ArtifactManifest, SetupError> {
        let manifest = self.read_manifest()?;
        let shape = CircuitShape::current()?;
        if manifest.version != MANIFEST_VERSION {
            return Err(SetupError::ArtifactConflict(format!(
                "manifest version {} (expected {MANIFEST_VERSION})",
                manifest.version
            )));
        }
        if manifest.circuit_id != CIRCUIT_ID || manifest.fingerprint != shape.fingerprint {
            return Err(SetupError::ArtifactConflict(format!(
                "artifacts are for {} {}, this build compiles {CIRCUIT_ID} {}",
                manifest.circuit_id, manifest.fingerprint, shape.fingerprint
            )));
        }
        Ok(manifest)
    }

    fn load_verification_with(&self, manifest: ArtifactManifest) -> Result<VerificationArtifacts, SetupError> {
        let vk_path = self.dir.join(VERIFICATION_KEY_FILE);
        let vk_bytes = fs::read(&vk_path).map_err(|e| SetupError::io(&vk_path, e))?;
        check_digest(VERIFICATION_KEY_FILE, &manifest.verification_key_digest, &vk_bytes)?;
        let vk_json: VerificationKeyJson = serde_json::from_slice(&vk_bytes)
            .map_err(|e| SetupError::Serialization(format!("{VERIFICATION_KEY_FILE}: {e}")))?;
        let vk = vk_json
            .to_vk()
            .map_err(|e| SetupError::Serialization(format!("{VERIFICATION_KEY_FILE}: {e}")))?;
        VerificationArtifacts::new(vk, manifest)
    }

    fn persist(&self, artifacts: &ProvingArtifacts) -> Result<(), SetupError> {
        let pk_bytes = encode_proving_key(artifacts.proving_key())?;
        let vk_bytes = encode_verification_key(artifacts.verification().verifying_key())?;
        let manifest = artifacts.manifest();
        check_digest(PROVING_KEY_FILE, &manifest.proving_key_digest, &pk_bytes)?;
        check_digest(VERIFICATION_KEY_FILE, &manifest.verification_key_digest, &vk_bytes)?;

        write_atomic(&self.dir.join(PROVING_KEY_FILE), &pk_bytes)?;
        write_atomic(&self.dir.join(VERIFICATION_KEY_FILE), &vk_bytes)?;
        let manifest_bytes = serde_json::to_vec_pretty(manifest)
            .map_err(|e| SetupError::Serialization(e.to_string()))?;
        write_atomic(&self.dir.join(MANIFEST_FILE), &manifest_bytes)
    }
}

fn check_digest(file: &str, expected: &ContentDigest, bytes: &[u8]) -> Result<(), SetupError> {
    let actual = sha256_bytes(bytes);
    if &actual != expected {
        return Err(SetupError::Integrity {
            file: file.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SetupError> {
    let tmp = path.with_extension("tmp");
    let mut file = fs::File::create(&tmp).map_err(|e| SetupError::io(&tmp, e))?;
    file.write_all(bytes).map_err(|e| SetupError::io(&tmp, e))?;
    file.sync_all().map_err(|e| SetupError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| SetupError::io(path, e))
}

/// Exclusive lock file, removed on drop.
struct SetupLock {
    path: PathBuf,
}

impl SetupLock {
    fn acquire(path: &Path) -> Result<Self, SetupError> {
        match fs::OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut file) => {
                // Drop removes the file if the write below fails.
                let lock = Self {
                    path: path.to_path_buf(),
                };
                writeln!(file, "{}", std::process::id()).map_err(|e| SetupError::io(path, e))?;
                Ok(lock)
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                let holder = fs::read_to_string(path)
                    .ok()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| "unknown".to_string());
                Err(SetupError::SetupInProgress {
                    path: path.display().to_string(),
                    holder,
                })
            }
            Err(e) => Err(SetupError::io(path, e)),
        }
    }
}

impl Drop for SetupLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "could not remove setup lock");
        }
    }
}
