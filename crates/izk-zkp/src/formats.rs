//! # Wire Formats
//!
//! JSON shapes exchanged with provers, verifiers, and snarkjs tooling.
//! Proof and verification-key files use the snarkjs layout (decimal
//! strings, projective coordinates with `z = 1`, curve name `bn128`), so
//! keys and proofs produced here can be checked with `snarkjs groth16
//! verify` and vice versa.
//!
//! Every point decoded from JSON is checked for curve and subgroup
//! membership before it reaches the pairing.

use ark_bn254::{Bn254, Fq, Fq2, G1Affine, G2Affine};
use ark_ec::AffineRepr;
use ark_groth16::{Proof, VerifyingKey};
use izk_core::{Classification, BRACKET_COUNT};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::circuit::{signal, PUBLIC_INPUT_COUNT};
use crate::codec::{decode_onehot, field_from_decimal, field_to_bool, field_to_decimal, field_to_u64};
use crate::error::CodecError;
use crate::setup::CircuitFingerprint;
use crate::Fr;

/// Protocol tag in proof and key files.
pub const PROTOCOL: &str = "groth16";
/// Curve name snarkjs uses for BN254.
pub const CURVE: &str = "bn128";

// ---------------------------------------------------------------------------
// Points
// ---------------------------------------------------------------------------

fn g1_to_json(p: &G1Affine) -> [String; 3] {
    if p.infinity {
        return ["0".into(), "1".into(), "0".into()];
    }
    [field_to_decimal(&p.x), field_to_decimal(&p.y), "1".into()]
}

fn g1_from_json(what: &str, v: &[String; 3]) -> Result<G1Affine, CodecError> {
    match v[2].as_str() {
        "0" => Ok(G1Affine::zero()),
        "1" => {
            let x: Fq = field_from_decimal(&v[0])?;
            let y: Fq = field_from_decimal(&v[1])?;
            let p = G1Affine::new_unchecked(x, y);
            if p.is_on_curve() && p.is_in_correct_subgroup_assuming_on_curve() {
                Ok(p)
            } else {
                Err(CodecError::InvalidPoint(format!("{what} is not a G1 point")))
            }
        }
        other => Err(CodecError::InvalidPoint(format!(
            "{what} has non-normalized z = {other}"
        ))),
    }
}

fn fq2_to_json(v: &Fq2) -> [String; 2] {
    [field_to_decimal(&v.c0), field_to_decimal(&v.c1)]
}

fn fq2_from_json(v: &[String; 2]) -> Result<Fq2, CodecError> {
    Ok(Fq2::new(field_from_decimal(&v[0])?, field_from_decimal(&v[1])?))
}

fn g2_to_json(p: &G2Affine) -> [[String; 2]; 3] {
    if p.infinity {
        return [
            ["0".into(), "0".into()],
            ["1".into(), "0".into()],
            ["0".into(), "0".into()],
        ];
    }
    [fq2_to_json(&p.x), fq2_to_json(&p.y), ["1".into(), "0".into()]]
}

fn g2_from_json(what: &str, v: &[[String; 2]; 3]) -> Result<G2Affine, CodecError> {
    let z = (v[2][0].as_str(), v[2][1].as_str());
    match z {
        ("0", "0") => Ok(G2Affine::zero()),
        ("1", "0") => {
            let p = G2Affine::new_unchecked(fq2_from_json(&v[0])?, fq2_from_json(&v[1])?);
            if p.is_on_curve() && p.is_in_correct_subgroup_assuming_on_curve() {
                Ok(p)
            } else {
                Err(CodecError::InvalidPoint(format!("{what} is not a G2 point")))
            }
        }
        _ => Err(CodecError::InvalidPoint(format!(
            "{what} has non-normalized z"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Proof
// ---------------------------------------------------------------------------

/// A Groth16 proof in snarkjs `proof.json` layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProofJson {
    /// `A` in G1.
    pub pi_a: [String; 3],
    /// `B` in G2.
    pub pi_b: [[String; 2]; 3],
    /// `C` in G1.
    pub pi_c: [String; 3],
    /// Always `"groth16"`.
    pub protocol: String,
    /// Always `"bn128"`.
    pub curve: String,
}

impl ProofJson {
    /// Encode an arkworks proof.
    pub fn from_proof(proof: &Proof<Bn254>) -> Self {
        Self {
            pi_a: g1_to_json(&proof.a),
            pi_b: g2_to_json(&proof.b),
            pi_c: g1_to_json(&proof.c),
            protocol: PROTOCOL.into(),
            curve: CURVE.into(),
        }
    }

    /// Decode and validate every point.
    pub fn to_proof(&self) -> Result<Proof<Bn254>, CodecError> {
        check_tags(&self.protocol, &self.curve)?;
        Ok(Proof {
            a: g1_from_json("pi_a", &self.pi_a)?,
            b: g2_from_json("pi_b", &self.pi_b)?,
            c: g1_from_json("pi_c", &self.pi_c)?,
        })
    }
}

fn check_tags(protocol: &str, curve: &str) -> Result<(), CodecError> {
    if protocol != PROTOCOL {
        return Err(CodecError::InvalidPoint(format!("unsupported protocol \"{protocol}\"")));
    }
    if curve != CURVE && curve != "bn254" {
        return Err(CodecError::InvalidPoint(format!("unsupported curve \"{curve}\"")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Verification key
// ---------------------------------------------------------------------------

/// A Groth16 verification key in snarkjs `verification_key.json` layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationKeyJson {
    /// Always `"groth16"`.
    pub protocol: String,
    /// Always `"bn128"`.
    pub curve: String,
    /// Number of public signals.
    #[serde(rename = "nPublic")]
    pub n_public: usize,
    /// `α` in G1.
    pub vk_alpha_1: [String; 3],
    /// `β` in G2.
    pub vk_beta_2: [[String; 2]; 3],
    /// `γ` in G2.
    pub vk_gamma_2: [[String; 2]; 3],
    /// `δ` in G2.
    pub vk_delta_2: [[String; 2]; 3],
    /// Input commitment bases, one more than `nPublic`.
    #[serde(rename = "IC")]
    pub ic: Vec<[String; 3]>,
}

impl VerificationKeyJson {
    /// Encode an arkworks verifying key.
    pub fn from_vk(vk: &VerifyingKey<Bn254>) -> Self {
        Self {
            protocol: PROTOCOL.into(),
            curve: CURVE.into(),
            n_public: vk.gamma_abc_g1.len().saturating_sub(1),
            vk_alpha_1: g1_to_json(&vk.alpha_g1),
            vk_beta_2: g2_to_json(&vk.beta_g2),
            vk_gamma_2: g2_to_json(&vk.gamma_g2),
            vk_delta_2: g2_to_json(&vk.delta_g2),
            ic: vk.gamma_abc_g1.iter().map(g1_to_json).collect(),
        }
    }

    /// Decode and validate every point.
    pub fn to_vk(&self) -> Result<VerifyingKey<Bn254>, CodecError> {
        check_tags(&self.protocol, &self.curve)?;
        if self.ic.len() != self.n_public + 1 {
            return Err(CodecError::WrongLength {
                what: "IC",
                expected: self.n_public + 1,
                actual: self.ic.len(),
            });
        }
        Ok(VerifyingKey {
            alpha_g1: g1_from_json("vk_alpha_1", &self.vk_alpha_1)?,
            beta_g2: g2_from_json("vk_beta_2", &self.vk_beta_2)?,
            gamma_g2: g2_from_json("vk_gamma_2", &self.vk_gamma_2)?,
            delta_g2: g2_from_json("vk_delta_2", &self.vk_delta_2)?,
            gamma_abc_g1: self
                .ic
                .iter()
                .map(|p| g1_from_json("IC", p))
                .collect::<Result<_, _>>()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Public signals
// ---------------------------------------------------------------------------

/// Ordered public signals, serialized as decimal strings.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicSignals(Vec<Fr>);

impl PublicSignals {
    /// Wrap raw signals.
    pub fn new(signals: Vec<Fr>) -> Self {
        Self(signals)
    }

    /// The signals in verifier order.
    pub fn as_slice(&self) -> &[Fr] {
        &self.0
    }

    /// Number of signals.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no signals.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Mutable access, for building negative test cases.
    pub fn as_mut_slice(&mut self) -> &mut [Fr] {
        &mut self.0
    }

    /// Interpret the signals of the classification circuit.
    ///
    /// # Errors
    ///
    /// Wrong length, non-boolean flags, an invalid bracket vector, or a
    /// bracket vector that disagrees with the authenticity bit.
    pub fn decode(&self) -> Result<DecodedSignals, CodecError> {
        if self.0.len() != PUBLIC_INPUT_COUNT {
            return Err(CodecError::WrongLength {
                what: "public_signals",
                expected: PUBLIC_INPUT_COUNT,
                actual: self.0.len(),
            });
        }
        let s = &self.0;
        let is_signature_valid = field_to_bool(&s[signal::SIGNATURE_VALID], "is_signature_valid")?;
        let is_data_authentic = field_to_bool(&s[signal::DATA_AUTHENTIC], "is_data_authentic")?;

        let mut flags = [Fr::from(0u64); BRACKET_COUNT];
        flags.copy_from_slice(&s[signal::BRACKETS..signal::BRACKETS + BRACKET_COUNT]);
        let classification = decode_onehot(&flags)?;
        match (is_data_authentic, classification) {
            (true, Classification::Unauthentic) => {
                return Err(CodecError::InvalidOneHot(
                    "authentic record with empty bracket vector".into(),
                ))
            }
            (false, Classification::Bracket(_)) => {
                return Err(CodecError::InvalidOneHot(
                    "bracket set on unauthentic record".into(),
                ))
            }
            _ => {}
        }

        let max_signature_age_seconds = field_to_u64(&s[signal::MAX_SIGNATURE_AGE])
            .ok_or_else(|| CodecError::IntegerOverflow("max_signature_age_seconds".into()))?;
        let reference_time = field_to_u64(&s[signal::REFERENCE_TIME])
            .ok_or_else(|| CodecError::IntegerOverflow("reference_time".into()))?;

        Ok(DecodedSignals {
            is_signature_valid,
            is_data_authentic,
            classification,
            issuer_public_key: [s[signal::ISSUER_PK_X], s[signal::ISSUER_PK_Y]],
            identity_hash: s[signal::IDENTITY_HASH],
            max_signature_age_seconds,
            reference_time,
        })
    }
}

impl std::fmt::Debug for PublicSignals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.0.iter().map(field_to_decimal))
            .finish()
    }
}

impl Serialize for PublicSignals {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let decimals: Vec<String> = self.0.iter().map(field_to_decimal).collect();
        decimals.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PublicSignals {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let decimals = Vec::<String>::deserialize(deserializer)?;
        decimals
            .iter()
            .map(|s| field_from_decimal(s))
            .collect::<Result<Vec<Fr>, _>>()
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

/// Typed view of the classification circuit's public signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedSignals {
    /// Issuer signature verified in-circuit.
    pub is_signature_valid: bool,
    /// Signature valid, fresh, and income plausible.
    pub is_data_authentic: bool,
    /// Decoded bracket vector.
    pub classification: Classification,
    /// Issuer key the proof was made against.
    pub issuer_public_key: [Fr; 2],
    /// Field-encoded identity hash.
    pub identity_hash: Fr,
    /// Anti-replay bound the proof was made against.
    pub max_signature_age_seconds: u64,
    /// Time the signature age was measured at, Unix seconds.
    pub reference_time: u64,
}

// ---------------------------------------------------------------------------
// Proof with circuit binding
// ---------------------------------------------------------------------------

/// A proof and the circuit it claims to be for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IncomeProof {
    /// Circuit identifier.
    pub circuit_id: String,
    /// Fingerprint of the constraint system the proving key was made for.
    pub fingerprint: CircuitFingerprint,
    /// The Groth16 proof.
    pub proof: ProofJson,
}

/// What a prover hands to a verifier: proof, binding, and public signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProofEnvelope {
    /// Circuit identifier.
    pub circuit_id: String,
    /// Circuit fingerprint.
    pub fingerprint: CircuitFingerprint,
    /// The Groth16 proof.
    pub proof: ProofJson,
    /// Public signals in verifier order.
    pub public_signals: PublicSignals,
}

impl ProofEnvelope {
    /// Bundle a proof with its signals.
    pub fn new(proof: IncomeProof, public_signals: PublicSignals) -> Self {
        Self {
            circuit_id: proof.circuit_id,
            fingerprint: proof.fingerprint,
            proof: proof.proof,
            public_signals,
        }
    }

    /// The proof half, for passing to a verifier.
    pub fn income_proof(&self) -> IncomeProof {
        IncomeProof {
            circuit_id: self.circuit_id.clone(),
            fingerprint: self.fingerprint,
            proof: self.proof.clone(),
        }
    }
}
