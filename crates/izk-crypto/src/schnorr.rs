//! # Issuer Signatures: Schnorr over Baby Jubjub
//!
//! The income authority signs each attestation
//! `(identity_hash, monthly_income, issued_at)` with a Schnorr signature on
//! the Baby Jubjub twisted Edwards curve:
//!
//! ```text
//! PK = sk·G
//! k  = H(sk, msg) mod r                      (deterministic nonce)
//! R  = k·G
//! e  = Poseidon(R.x, R.y, PK.x, PK.y, identity_hash, monthly_income, issued_at)
//! s  = k + (e mod r)·sk  mod r
//! ```
//!
//! Verification checks `s·G == R + e·PK`, with `e` used as a full integer
//! (not reduced mod `r`). The circuit performs exactly the same computation,
//! so a signature verifies natively if and only if it verifies in-circuit.
//!
//! ## Wire Encoding
//!
//! - Public key: 32-byte compressed point, hex.
//! - Signature: compressed `R` (32 bytes) ‖ `s` little-endian (32 bytes), hex.
//!
//! ## Security Invariant
//!
//! Secret key bytes are zeroized on drop and never appear in `Debug` output.

use ark_ec::{AffineRepr, CurveGroup};
use ark_ed_on_bn254::{EdwardsAffine, Fr};
use ark_ff::{BigInteger, PrimeField, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use izk_core::Sha256Accumulator;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::poseidon::poseidon_hash;
use crate::Fq;

const NONCE_DOMAIN: &[u8] = b"izk/issuer-schnorr/nonce/v1";

/// The statement an issuer signs: who, how much, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttestationMessage {
    /// Field-encoded hash of the citizen's identity number.
    pub identity_hash: Fq,
    /// Monthly income in currency units.
    pub monthly_income: u64,
    /// Issue time, Unix seconds.
    pub issued_at: u64,
}

impl AttestationMessage {
    fn nonce_bytes(&self) -> Vec<u8> {
        let mut out = self.identity_hash.into_bigint().to_bytes_le();
        out.extend_from_slice(&self.monthly_income.to_le_bytes());
        out.extend_from_slice(&self.issued_at.to_le_bytes());
        out
    }
}

// ---------------------------------------------------------------------------
// Public key
// ---------------------------------------------------------------------------

/// An issuer's public key: a point in Baby Jubjub's prime-order subgroup.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct IssuerPublicKey(EdwardsAffine);

impl IssuerPublicKey {
    /// Wrap a curve point.
    pub fn from_point(point: EdwardsAffine) -> Self {
        Self(point)
    }

    /// The underlying point.
    pub fn point(&self) -> &EdwardsAffine {
        &self.0
    }

    /// Affine `(x, y)` coordinates as circuit field elements.
    pub fn coordinates(&self) -> (Fq, Fq) {
        (self.0.x, self.0.y)
    }

    /// Compressed 32-byte encoding.
    pub fn to_bytes(&self) -> [u8; 32] {
        compress_point(&self.0)
    }

    /// Decode a compressed point, checking curve and subgroup membership.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        EdwardsAffine::deserialize_compressed(&bytes[..])
            .map(Self)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
    }

    /// Lowercase hex of the compressed encoding.
    pub fn to_hex(&self) -> String {
        izk_core::hex::encode(&self.to_bytes())
    }

    /// Parse 64 hex characters.
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        let bytes = izk_core::hex::decode_fixed::<32>(hex.trim()).map_err(CryptoError::HexDecode)?;
        Self::from_bytes(&bytes)
    }
}

impl std::fmt::Debug for IssuerPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IssuerPublicKey({}...)", &self.to_hex()[..16])
    }
}

impl std::fmt::Display for IssuerPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for IssuerPublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for IssuerPublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// A Schnorr signature `(R, s)`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct IssuerSignature {
    r: EdwardsAffine,
    s: Fr,
}

impl IssuerSignature {
    /// The commitment point `R`.
    pub fn r(&self) -> &EdwardsAffine {
        &self.r
    }

    /// The response scalar `s`.
    pub fn s(&self) -> &Fr {
        &self.s
    }

    /// `[R.x, R.y, s]` as circuit field elements.
    ///
    /// `s < r < q`, so lifting the scalar into the circuit field preserves
    /// its integer value.
    pub fn field_elements(&self) -> [Fq; 3] {
        [self.r.x, self.r.y, scalar_to_base(&self.s)]
    }

    /// 64-byte encoding: compressed `R` ‖ `s` little-endian.
    pub fn to_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&compress_point(&self.r));
        out[32..].copy_from_slice(&scalar_bytes(&self.s));
        out
    }

    /// Decode, rejecting an `R` outside the subgroup or a non-canonical `s`.
    pub fn from_bytes(bytes: &[u8; 64]) -> Result<Self, CryptoError> {
        let r = EdwardsAffine::deserialize_compressed(&bytes[..32])
            .map_err(|e| CryptoError::InvalidSignature(format!("R: {e}")))?;
        let s = Fr::deserialize_compressed(&bytes[32..])
            .map_err(|e| CryptoError::InvalidSignature(format!("s: {e}")))?;
        Ok(Self { r, s })
    }

    /// Lowercase hex of the 64-byte encoding.
    pub fn to_hex(&self) -> String {
        izk_core::hex::encode(&self.to_bytes())
    }

    /// Parse 128 hex characters.
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        let bytes = izk_core::hex::decode_fixed::<64>(hex.trim()).map_err(CryptoError::HexDecode)?;
        Self::from_bytes(&bytes)
    }
}

impl std::fmt::Debug for IssuerSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IssuerSignature({}...)", &self.to_hex()[..16])
    }
}

impl Serialize for IssuerSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for IssuerSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Key pair
// ---------------------------------------------------------------------------

/// An issuer signing key.
///
/// Does not implement `Serialize`; export the secret explicitly with
/// [`IssuerKeyPair::secret_hex`].
pub struct IssuerKeyPair {
    secret: Zeroizing<[u8; 32]>,
    public: IssuerPublicKey,
}

impl IssuerKeyPair {
    /// Generate a fresh key pair.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        loop {
            let mut wide = Zeroizing::new([0u8; 64]);
            rng.fill_bytes(&mut wide[..]);
            let sk = Fr::from_le_bytes_mod_order(&wide[..]);
            if !sk.is_zero() {
                return Self::from_scalar(sk);
            }
        }
    }

    /// Load from a canonical little-endian secret scalar.
    pub fn from_secret_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        let sk = Fr::deserialize_compressed(&bytes[..])
            .map_err(|e| CryptoError::InvalidSecretKey(e.to_string()))?;
        if sk.is_zero() {
            return Err(CryptoError::InvalidSecretKey("zero scalar".into()));
        }
        Ok(Self::from_scalar(sk))
    }

    /// Load from 64 hex characters.
    pub fn from_secret_hex(hex: &str) -> Result<Self, CryptoError> {
        let bytes = Zeroizing::new(
            izk_core::hex::decode_fixed::<32>(hex.trim()).map_err(CryptoError::HexDecode)?,
        );
        Self::from_secret_bytes(&bytes)
    }

    fn from_scalar(sk: Fr) -> Self {
        let point = EdwardsAffine::generator().mul_bigint(sk.into_bigint());
        let public = IssuerPublicKey(point.into_affine());
        Self {
            secret: Zeroizing::new(scalar_bytes(&sk)),
            public,
        }
    }

    /// The matching public key.
    pub fn public_key(&self) -> IssuerPublicKey {
        self.public
    }

    /// Hex of the secret scalar, for writing a key file.
    pub fn secret_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(izk_core::hex::encode(&self.secret[..]))
    }

    /// Sign an attestation.
    pub fn sign(&self, msg: &AttestationMessage) -> IssuerSignature {
        let sk = Fr::from_le_bytes_mod_order(&self.secret[..]);
        let k = self.nonce(msg);
        let r = EdwardsAffine::generator().mul_bigint(k.into_bigint()).into_affine();
        let e = challenge(&r, &self.public, msg);
        let e_mod_r = Fr::from_le_bytes_mod_order(&e.into_bigint().to_bytes_le());
        IssuerSignature {
            r,
            s: k + e_mod_r * sk,
        }
    }

    fn nonce(&self, msg: &AttestationMessage) -> Fr {
        let body = msg.nonce_bytes();
        let mut wide = Zeroizing::new([0u8; 64]);
        for (i, chunk) in wide.chunks_mut(32).enumerate() {
            let mut acc = Sha256Accumulator::new();
            acc.update(NONCE_DOMAIN)
                .update([i as u8])
                .update(&self.secret[..])
                .update(&body);
            chunk.copy_from_slice(&acc.finalize());
        }
        Fr::from_le_bytes_mod_order(&wide[..])
    }
}

impl std::fmt::Debug for IssuerKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuerKeyPair")
            .field("public", &self.public)
            .field("secret", &"<private>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// The Fiat–Shamir challenge `e`, in the circuit field.
pub fn challenge(r: &EdwardsAffine, pk: &IssuerPublicKey, msg: &AttestationMessage) -> Fq {
    let (pk_x, pk_y) = pk.coordinates();
    poseidon_hash(&[
        r.x,
        r.y,
        pk_x,
        pk_y,
        msg.identity_hash,
        Fq::from(msg.monthly_income),
        Fq::from(msg.issued_at),
    ])
}

/// Check `s·G == R + e·PK`.
pub fn verify(pk: &IssuerPublicKey, msg: &AttestationMessage, sig: &IssuerSignature) -> bool {
    let e = challenge(&sig.r, pk, msg);
    let lhs = EdwardsAffine::generator().mul_bigint(sig.s.into_bigint());
    let rhs = sig.r.into_group() + pk.0.mul_bigint(e.into_bigint());
    lhs == rhs
}

fn compress_point(p: &EdwardsAffine) -> [u8; 32] {
    let mut out = [0u8; 32];
    // A compressed Baby Jubjub point is exactly 32 bytes.
    let _ = p.serialize_compressed(&mut out[..]);
    out
}

fn scalar_bytes(s: &Fr) -> [u8; 32] {
    let mut out = [0u8; 32];
    let _ = s.serialize_compressed(&mut out[..]);
    out
}

fn scalar_to_base(s: &Fr) -> Fq {
    Fq::from_le_bytes_mod_order(&s.into_bigint().to_bytes_le())
}
