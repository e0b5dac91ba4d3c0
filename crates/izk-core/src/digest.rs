//! # Content-Addressed Digests
//!
//! Defines [`ContentDigest`] and [`DigestAlgorithm`]. Proving artifacts are
//! content addressed: the manifest records the digest of every key file and
//! of the universal parameter file it was derived from.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;

/// The hash algorithm used to compute a content digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// SHA-256.
    Sha256,
}

/// A 32-byte content digest with its algorithm tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest {
    /// The hash algorithm that produced this digest.
    pub algorithm: DigestAlgorithm,
    /// The raw 32-byte digest value.
    #[serde(with = "hex32")]
    pub bytes: [u8; 32],
}

impl ContentDigest {
    /// Create a SHA-256 content digest from raw bytes.
    pub fn sha256(bytes: [u8; 32]) -> Self {
        Self {
            algorithm: DigestAlgorithm::Sha256,
            bytes,
        }
    }

    /// Return the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        crate::hex::encode(&self.bytes)
    }

    /// Parse a 64-character lowercase or uppercase hex digest.
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = crate::hex::decode_fixed::<32>(s).ok()?;
        Some(Self::sha256(bytes))
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}

/// SHA-256 over canonical JSON bytes.
pub fn sha256_digest(canonical: &CanonicalBytes) -> ContentDigest {
    sha256_bytes(canonical.as_bytes())
}

/// SHA-256 over raw bytes (key files, binary artifacts).
pub fn sha256_bytes(data: &[u8]) -> ContentDigest {
    let out: [u8; 32] = Sha256::digest(data).into();
    ContentDigest::sha256(out)
}

/// Incremental SHA-256 over a sequence of byte chunks.
///
/// Used where the hashed content is a composite of domain tags and binary
/// encodings (the circuit fingerprint, deterministic signing nonces) rather
/// than a single canonical JSON document.
#[derive(Debug, Clone, Default)]
pub struct Sha256Accumulator {
    hasher: Sha256,
}

impl Sha256Accumulator {
    /// Start a new accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed another chunk.
    pub fn update(&mut self, data: impl AsRef<[u8]>) -> &mut Self {
        self.hasher.update(data.as_ref());
        self
    }

    /// Feed a `u64` as 8 little-endian bytes.
    pub fn update_u64(&mut self, value: u64) -> &mut Self {
        self.hasher.update(value.to_le_bytes());
        self
    }

    /// Finish and return the raw 32-byte digest.
    pub fn finalize(self) -> [u8; 32] {
        self.hasher.finalize().into()
    }

    /// Finish and return the digest as a [`ContentDigest`].
    pub fn finalize_digest(self) -> ContentDigest {
        ContentDigest::sha256(self.finalize())
    }

    /// Finish and return the digest as lowercase hex.
    pub fn finalize_hex(self) -> String {
        crate::hex::encode(&self.finalize())
    }
}

mod hex32 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&crate::hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let s = String::deserialize(deserializer)?;
        crate::hex::decode_fixed::<32>(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            sha256_bytes(b"").to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn accumulator_matches_one_shot() {
        let mut acc = Sha256Accumulator::new();
        acc.update(b"income").update(b"-zk");
        assert_eq!(acc.finalize_digest(), sha256_bytes(b"income-zk"));
    }

    #[test]
    fn accumulator_u64_is_little_endian() {
        let mut a = Sha256Accumulator::new();
        a.update_u64(1);
        let mut b = Sha256Accumulator::new();
        b.update([1u8, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(a.finalize(), b.finalize());
    }

    #[test]
    fn canonical_digest_ignores_key_order() {
        let a = CanonicalBytes::new(&json!({"a": 1, "b": 2})).unwrap();
        let b = CanonicalBytes::new(&json!({"b": 2, "a": 1})).unwrap();
        assert_eq!(sha256_digest(&a), sha256_digest(&b));
    }

    #[test]
    fn display_has_algorithm_prefix() {
        let d = sha256_bytes(b"x");
        assert!(d.to_string().starts_with("sha256:"));
        assert_eq!(d.to_string().len(), "sha256:".len() + 64);
    }

    #[test]
    fn serde_uses_hex() {
        let d = sha256_bytes(b"x");
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["algorithm"], "sha256");
        assert_eq!(v["bytes"], d.to_hex());
        let back: ContentDigest = serde_json::from_value(v).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn from_hex_round_trips() {
        let d = sha256_bytes(b"artifact");
        assert_eq!(ContentDigest::from_hex(&d.to_hex()), Some(d));
        assert_eq!(ContentDigest::from_hex("abcd"), None);
    }
}
