//! # Field Codec
//!
//! Conversions between domain values and BN254 scalar-field elements, and
//! the decimal string form snarkjs uses on the wire.
//!
//! The identity number never enters a circuit in the clear: it is hashed
//! with SHA-256 over its canonical 12-digit form and reduced mod `p`.
//! Key and signature material is carried in full, one field element per
//! curve coordinate or scalar.

use ark_ff::{BigInteger, One, PrimeField, Zero};
use izk_core::{sha256_bytes, BracketLabel, Classification, IdentityNumber, BRACKET_COUNT};
use izk_crypto::{IssuerPublicKey, IssuerSignature};
use num_bigint::BigUint;

use crate::error::CodecError;
use crate::Fr;

/// Encode a machine integer.
pub fn encode_integer(value: u64) -> Fr {
    Fr::from(value)
}

/// Encode bytes as a big-endian integer reduced mod `p`.
pub fn encode_bytes(bytes: &[u8]) -> Fr {
    Fr::from_be_bytes_mod_order(bytes)
}

/// SHA-256 of the canonical identity number, reduced mod `p`.
pub fn encode_identity(identity: &IdentityNumber) -> Fr {
    let digest = sha256_bytes(identity.as_str().as_bytes());
    encode_bytes(&digest.bytes)
}

/// `(x, y)` of the issuer key.
pub fn encode_public_key(key: &IssuerPublicKey) -> [Fr; 2] {
    let (x, y) = key.coordinates();
    [x, y]
}

/// `(R.x, R.y, s)` of a signature, `s` lifted into the circuit field.
pub fn encode_signature(signature: &IssuerSignature) -> [Fr; 3] {
    signature.field_elements()
}

/// The value of a field element if it is below `2^64`.
pub fn field_to_u64(value: &Fr) -> Option<u64> {
    let limbs = value.into_bigint().0;
    limbs[1..].iter().all(|l| *l == 0).then_some(limbs[0])
}

/// Read a 0/1 field element.
///
/// # Errors
///
/// [`CodecError::NotBoolean`] for any other value; `what` names the signal.
pub fn field_to_bool(value: &Fr, what: &str) -> Result<bool, CodecError> {
    if value.is_zero() {
        Ok(false)
    } else if value.is_one() {
        Ok(true)
    } else {
        Err(CodecError::NotBoolean(what.to_string()))
    }
}

/// Encode a boolean as 0/1.
pub fn encode_bool(value: bool) -> Fr {
    if value {
        Fr::one()
    } else {
        Fr::zero()
    }
}

/// Decode the published bracket vector.
///
/// All zeros is [`Classification::Unauthentic`]; exactly one `1` selects
/// that bracket.
///
/// # Errors
///
/// [`CodecError::InvalidOneHot`] when two or more flags are set or any flag
/// is neither 0 nor 1.
pub fn decode_onehot(flags: &[Fr; BRACKET_COUNT]) -> Result<Classification, CodecError> {
    let mut selected = None;
    for (i, flag) in flags.iter().enumerate() {
        if flag.is_zero() {
            continue;
        }
        if !flag.is_one() {
            return Err(CodecError::InvalidOneHot(format!("flag {i} is not binary")));
        }
        if let Some(previous) = selected.replace(i) {
            return Err(CodecError::InvalidOneHot(format!(
                "flags {previous} and {i} are both set"
            )));
        }
    }
    match selected {
        None => Ok(Classification::Unauthentic),
        Some(i) => BracketLabel::from_index(i)
            .map(Classification::Bracket)
            .map_err(|e| CodecError::InvalidOneHot(e.to_string())),
    }
}

/// The bracket vector a classification decodes from.
pub fn encode_classification(classification: Classification) -> [Fr; BRACKET_COUNT] {
    let mut flags = [Fr::zero(); BRACKET_COUNT];
    if let Some(label) = classification.label() {
        flags[label.index()] = Fr::one();
    }
    flags
}

// ---------------------------------------------------------------------------
// Decimal strings
// ---------------------------------------------------------------------------

/// Render a prime field element in base 10.
///
/// Generic over the field, so proof coordinates (base field) and public
/// signals (scalar field) share one codec.
pub fn field_to_decimal<F: PrimeField>(value: &F) -> String {
    let n: BigUint = value.into_bigint().into();
    n.to_string()
}

/// Parse a base-10 field element.
///
/// # Errors
///
/// [`CodecError::InvalidDecimal`] for empty or non-digit input,
/// [`CodecError::OutOfField`] for values `>= p`.
pub fn field_from_decimal<F: PrimeField>(s: &str) -> Result<F, CodecError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CodecError::InvalidDecimal(truncate(s)));
    }
    let n: BigUint = s.parse().map_err(|_| CodecError::InvalidDecimal(truncate(s)))?;
    let modulus: BigUint = F::MODULUS.into();
    if n >= modulus {
        return Err(CodecError::OutOfField(truncate(s)));
    }
    Ok(F::from(n))
}

/// Decode a fixed-size array of decimal strings.
pub fn decimals_to_fields<const N: usize>(
    what: &'static str,
    values: &[String],
) -> Result<[Fr; N], CodecError> {
    if values.len() != N {
        return Err(CodecError::WrongLength {
            what,
            expected: N,
            actual: values.len(),
        });
    }
    let mut out = [Fr::zero(); N];
    for (slot, s) in out.iter_mut().zip(values) {
        *slot = field_from_decimal(s)?;
    }
    Ok(out)
}

fn truncate(s: &str) -> String {
    if s.len() > 80 {
        let cut = s.char_indices().nth(80).map(|(i, _)| i).unwrap_or(s.len());
        format!("{}...", &s[..cut])
    } else {
        s.to_string()
    }
}

/// Bit length of a field element's canonical integer.
pub(crate) fn bit_length(value: &Fr) -> usize {
    value.into_bigint().num_bits() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use izk_crypto::{AttestationMessage, IssuerKeyPair};
    use proptest::prelude::*;

    const MODULUS: &str =
        "21888242871839275222246405745257275088548364400416034343698204186575808495617";
    const MODULUS_MINUS_ONE: &str =
        "21888242871839275222246405745257275088548364400416034343698204186575808495616";

    #[test]
    fn integer_encoding() {
        assert_eq!(encode_integer(0), Fr::zero());
        assert_eq!(encode_integer(6340), Fr::from(6340u64));
    }

    #[test]
    fn bytes_are_big_endian() {
        assert_eq!(encode_bytes(&[1, 0]), Fr::from(256u64));
        assert_eq!(encode_bytes(&[]), Fr::zero());
    }

    #[test]
    fn identity_hash_ignores_dashes() {
        let a = IdentityNumber::new("900101-14-5678").unwrap();
        let b = IdentityNumber::new("900101145678").unwrap();
        assert_eq!(encode_identity(&a), encode_identity(&b));
        let c = IdentityNumber::new("900101145679").unwrap();
        assert_ne!(encode_identity(&a), encode_identity(&c));
    }

    #[test]
    fn key_and_signature_carry_full_material() {
        let kp = IssuerKeyPair::from_secret_bytes(&[2u8; 32]).unwrap();
        let msg = AttestationMessage {
            identity_hash: Fr::from(42u64),
            monthly_income: 1800,
            issued_at: 1_767_225_600,
        };
        let sig = kp.sign(&msg);
        let [x, y] = encode_public_key(&kp.public_key());
        assert_eq!((x, y), kp.public_key().coordinates());
        let [rx, ry, s] = encode_signature(&sig);
        assert_eq!((rx, ry), (sig.r().x, sig.r().y));
        assert!(bit_length(&s) > 64);
    }

    #[test]
    fn u64_extraction() {
        assert_eq!(field_to_u64(&Fr::from(u64::MAX)), Some(u64::MAX));
        assert_eq!(field_to_u64(&(Fr::from(u64::MAX) + Fr::one())), None);
        assert_eq!(field_to_u64(&-Fr::one()), None);
    }

    #[test]
    fn bool_decoding() {
        assert!(!field_to_bool(&Fr::zero(), "x").unwrap());
        assert!(field_to_bool(&Fr::one(), "x").unwrap());
        assert_eq!(
            field_to_bool(&Fr::from(2u64), "sig").unwrap_err(),
            CodecError::NotBoolean("sig".into())
        );
    }

    #[test]
    fn onehot_round_trip_for_every_bracket() {
        for label in BracketLabel::ALL {
            let c = Classification::Bracket(label);
            assert_eq!(decode_onehot(&encode_classification(c)).unwrap(), c);
        }
    }

    #[test]
    fn all_zero_is_unauthentic() {
        let zeros = [Fr::zero(); BRACKET_COUNT];
        assert_eq!(decode_onehot(&zeros).unwrap(), Classification::Unauthentic);
        assert_eq!(encode_classification(Classification::Unauthentic), zeros);
    }

    #[test]
    fn two_flags_rejected() {
        let mut flags = [Fr::zero(); BRACKET_COUNT];
        flags[2] = Fr::one();
        flags[7] = Fr::one();
        assert!(matches!(
            decode_onehot(&flags),
            Err(CodecError::InvalidOneHot(_))
        ));
    }

    #[test]
    fn non_binary_flag_rejected() {
        let mut flags = [Fr::zero(); BRACKET_COUNT];
        flags[4] = Fr::from(2u64);
        assert!(matches!(
            decode_onehot(&flags),
            Err(CodecError::InvalidOneHot(_))
        ));
    }

    #[test]
    fn zero_renders_as_zero() {
        assert_eq!(field_to_decimal(&Fr::zero()), "0");
    }

    #[test]
    fn small_values_render_plainly() {
        assert_eq!(field_to_decimal(&Fr::from(1u64)), "1");
        assert_eq!(field_to_decimal(&Fr::from(86_400u64)), "86400");
        assert_eq!(
            field_to_decimal(&Fr::from(10_000_000_000_000_000_000u128)),
            "10000000000000000000"
        );
    }

    #[test]
    fn largest_element_round_trips() {
        let max: Fr = field_from_decimal(MODULUS_MINUS_ONE).unwrap();
        assert_eq!(max, -Fr::one());
        assert_eq!(field_to_decimal(&max), MODULUS_MINUS_ONE);
    }

    #[test]
    fn modulus_is_rejected() {
        assert!(matches!(
            field_from_decimal::<Fr>(MODULUS),
            Err(CodecError::OutOfField(_))
        ));
        let huge = "9".repeat(100);
        assert!(matches!(
            field_from_decimal::<Fr>(&huge),
            Err(CodecError::OutOfField(_))
        ));
    }

    #[test]
    fn non_digits_are_rejected() {
        for bad in ["", "-1", "0x10", "12 3", "1.5"] {
            assert!(
                matches!(field_from_decimal::<Fr>(bad), Err(CodecError::InvalidDecimal(_))),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn leading_zeros_accepted() {
        assert_eq!(field_from_decimal::<Fr>("0007").unwrap(), Fr::from(7u64));
    }

    #[test]
    fn base_field_uses_same_codec() {
        let v = ark_bn254::Fq::from(123_456_789u64);
        assert_eq!(field_to_decimal(&v), "123456789");
        assert_eq!(field_from_decimal::<ark_bn254::Fq>("123456789").unwrap(), v);
    }

    #[test]
    fn fixed_array_length_checked() {
        let err = decimals_to_fields::<3>("signature", &["1".into(), "2".into()]).unwrap_err();
        assert_eq!(
            err,
            CodecError::WrongLength {
                what: "signature",
                expected: 3,
                actual: 2
            }
        );
    }

    proptest! {
        #[test]
        fn decimal_matches_u128(v in any::<u128>()) {
            let f = Fr::from(v);
            prop_assert_eq!(field_to_decimal(&f), v.to_string());
            prop_assert_eq!(field_from_decimal::<Fr>(&v.to_string()).unwrap(), f);
        }

        #[test]
        fn decimal_round_trips_hashes(bytes in proptest::collection::vec(any::<u8>(), 32)) {
            let f = encode_bytes(&bytes);
            let back: Fr = field_from_decimal(&field_to_decimal(&f)).unwrap();
            prop_assert_eq!(back, f);
        }
    }
}
