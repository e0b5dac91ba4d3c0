//! Constraint gadgets used by the classification circuit.
//!
//! Every gadget here is total: for any assignment of its inputs there is a
//! satisfying assignment of the auxiliary variables it allocates. Checks
//! that can fail (range, curve membership, signature equation) return a
//! [`Boolean`] instead of enforcing.

use ark_crypto_primitives::sponge::constraints::CryptographicSpongeVar;
use ark_crypto_primitives::sponge::poseidon::constraints::PoseidonSpongeVar;
use ark_ec::twisted_edwards::TECurveConfig;
use ark_ec::{AffineRepr, CurveGroup};
use ark_ed_on_bn254::constraints::EdwardsVar;
use ark_ed_on_bn254::{EdwardsAffine, EdwardsConfig};
use ark_ff::{BigInteger, Field, PrimeField};
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};
use izk_crypto::poseidon_config;

use crate::Fr;

/// `a < b` for operands already known to be below `2^bits`.
///
/// Decomposes `a + 2^bits - b` into `bits + 1` witnessed bits; the top bit
/// is set exactly when `a >= b`.
pub fn less_than(
    cs: ConstraintSystemRef<Fr>,
    a: &FpVar<Fr>,
    b: &FpVar<Fr>,
    bits: usize,
) -> Result<Boolean<Fr>, SynthesisError> {
    let shift = FpVar::constant(Fr::from(2u64).pow([bits as u64]));
    let diff = (a + &shift) - b;
    let decomposition = (0..=bits)
        .map(|i| {
            Boolean::new_witness(cs.clone(), || {
                diff.value().map(|v| v.into_bigint().get_bit(i))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Boolean::le_bits_to_fp_var(&decomposition)?.enforce_equal(&diff)?;
    Ok(decomposition[bits].not())
}

/// Whether `x < 2^bits`, and the integer formed by its low `bits` bits.
///
/// The low part equals `x` when it fits and is always below `2^bits`, so it
/// can feed [`less_than`] regardless of the input.
pub fn split_low_bits(
    x: &FpVar<Fr>,
    bits: usize,
) -> Result<(Boolean<Fr>, FpVar<Fr>), SynthesisError> {
    let le = x.to_bits_le()?;
    let fits = Boolean::kary_or(&le[bits..])?.not();
    let low = Boolean::le_bits_to_fp_var(&le[..bits])?;
    Ok((fits, low))
}

/// `a·x² + y² == 1 + d·x²·y²` on Baby Jubjub.
pub fn is_on_curve(x: &FpVar<Fr>, y: &FpVar<Fr>) -> Result<Boolean<Fr>, SynthesisError> {
    let a = FpVar::constant(EdwardsConfig::COEFF_A);
    let d = FpVar::constant(EdwardsConfig::COEFF_D);
    let x2 = x.square()?;
    let y2 = y.square()?;
    let lhs = &a * &x2 + &y2;
    let rhs = FpVar::one() + &d * &x2 * &y2;
    lhs.is_eq(&rhs)
}

/// The point `(x, y)` if it is on the curve, otherwise the identity.
pub fn point_or_identity(
    x: &FpVar<Fr>,
    y: &FpVar<Fr>,
) -> Result<(EdwardsVar, Boolean<Fr>), SynthesisError> {
    let on_curve = is_on_curve(x, y)?;
    let px = on_curve.select(x, &FpVar::zero())?;
    let py = on_curve.select(y, &FpVar::one())?;
    Ok((EdwardsVar::new(px, py), on_curve))
}

/// Poseidon over `inputs`, matching `izk_crypto::poseidon_hash`.
pub fn poseidon(
    cs: ConstraintSystemRef<Fr>,
    inputs: &[&FpVar<Fr>],
) -> Result<FpVar<Fr>, SynthesisError> {
    let mut sponge = PoseidonSpongeVar::new(cs, poseidon_config());
    for input in inputs {
        sponge.absorb(*input)?;
    }
    sponge
        .squeeze_field_elements(1)?
        .pop()
        .ok_or(SynthesisError::Unsatisfiable)
}

/// Signature components and the attested message, as circuit variables.
pub struct SchnorrVars<'a> {
    /// Nonce point `x`.
    pub r_x: &'a FpVar<Fr>,
    /// Nonce point `y`.
    pub r_y: &'a FpVar<Fr>,
    /// Response scalar.
    pub s: &'a FpVar<Fr>,
    /// Issuer key `x`.
    pub pk_x: &'a FpVar<Fr>,
    /// Issuer key `y`.
    pub pk_y: &'a FpVar<Fr>,
    /// Hashed identity number.
    pub identity_hash: &'a FpVar<Fr>,
    /// Attested income.
    pub monthly_income: &'a FpVar<Fr>,
    /// Issue time.
    pub issued_at: &'a FpVar<Fr>,
}

/// `R` and `PK` on the curve and `s·G == R + e·PK`.
///
/// The challenge is computed over the raw coordinates; off-curve points are
/// swapped for the identity only for the group arithmetic.
pub fn schnorr_verify(
    cs: ConstraintSystemRef<Fr>,
    vars: &SchnorrVars<'_>,
) -> Result<Boolean<Fr>, SynthesisError> {
    let (r_point, r_on_curve) = point_or_identity(vars.r_x, vars.r_y)?;
    let (pk_point, pk_on_curve) = point_or_identity(vars.pk_x, vars.pk_y)?;

    let e = poseidon(
        cs,
        &[
            vars.r_x,
            vars.r_y,
            vars.pk_x,
            vars.pk_y,
            vars.identity_hash,
            vars.monthly_income,
            vars.issued_at,
        ],
    )?;

    let generator = EdwardsVar::constant(EdwardsAffine::generator().into_group());
    let lhs = generator.scalar_mul_le(vars.s.to_bits_le()?.iter())?;
    let rhs = r_point + pk_point.scalar_mul_le(e.to_bits_le()?.iter())?;
    let equation = lhs.is_eq(&rhs)?;

    Boolean::kary_and(&[r_on_curve, pk_on_curve, equation])
}

/// Native curve membership, mirroring [`is_on_curve`].
pub(crate) fn native_on_curve(x: Fr, y: Fr) -> bool {
    let x2 = x.square();
    let y2 = y.square();
    EdwardsConfig::COEFF_A * x2 + y2 == Fr::from(1u64) + EdwardsConfig::COEFF_D * x2 * y2
}

/// Native counterpart of [`point_or_identity`].
pub(crate) fn native_point_or_identity(x: Fr, y: Fr) -> (EdwardsAffine, bool) {
    if native_on_curve(x, y) {
        (EdwardsAffine::new_unchecked(x, y), true)
    } else {
        (EdwardsAffine::zero(), false)
    }
}

/// Native counterpart of [`schnorr_verify`] over raw field elements.
pub(crate) fn native_schnorr_verify(
    [r_x, r_y, s]: [Fr; 3],
    [pk_x, pk_y]: [Fr; 2],
    [identity_hash, monthly_income, issued_at]: [Fr; 3],
) -> bool {
    let (r_point, r_on_curve) = native_point_or_identity(r_x, r_y);
    let (pk_point, pk_on_curve) = native_point_or_identity(pk_x, pk_y);
    let e = izk_crypto::poseidon_hash(&[
        r_x,
        r_y,
        pk_x,
        pk_y,
        identity_hash,
        monthly_income,
        issued_at,
    ]);
    let lhs = EdwardsAffine::generator().mul_bigint(s.into_bigint());
    let rhs = r_point.into_group() + pk_point.mul_bigint(e.into_bigint());
    r_on_curve && pk_on_curve && lhs.into_affine() == rhs.into_affine()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::{One, Zero};
    use ark_relations::r1cs::ConstraintSystem;
    use izk_crypto::{AttestationMessage, IssuerKeyPair};

    fn witness(cs: &ConstraintSystemRef<Fr>, v: Fr) -> FpVar<Fr> {
        FpVar::new_witness(cs.clone(), || Ok(v)).unwrap()
    }

    #[test]
    fn less_than_exhaustive_four_bits() {
        for a in 0..16u64 {
            for b in 0..16u64 {
                let cs = ConstraintSystem::<Fr>::new_ref();
                let av = witness(&cs, Fr::from(a));
                let bv = witness(&cs, Fr::from(b));
                let lt = less_than(cs.clone(), &av, &bv, 4).unwrap();
                assert_eq!(lt.value().unwrap(), a < b, "{a} < {b}");
                assert!(cs.is_satisfied().unwrap());
            }
        }
    }

    #[test]
    fn less_than_against_constant_at_64_bits() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let a = witness(&cs, Fr::from(u64::MAX - 1));
        let b = FpVar::constant(Fr::from(u64::MAX));
        assert!(less_than(cs.clone(), &a, &b, 64).unwrap().value().unwrap());
        assert!(!less_than(cs.clone(), &b, &a, 64).unwrap().value().unwrap());
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn split_reports_fit_and_low_bits() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let small = witness(&cs, Fr::from(0xdead_beefu64));
        let (fits, low) = split_low_bits(&small, 32).unwrap();
        assert!(fits.value().unwrap());
        assert_eq!(low.value().unwrap(), Fr::from(0xdead_beefu64));

        let big = witness(&cs, Fr::from((1u64 << 32) + 5));
        let (fits, low) = split_low_bits(&big, 32).unwrap();
        assert!(!fits.value().unwrap());
        assert_eq!(low.value().unwrap(), Fr::from(5u64));

        let negative = witness(&cs, -Fr::one());
        let (fits, _) = split_low_bits(&negative, 64).unwrap();
        assert!(!fits.value().unwrap());
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn generator_is_on_curve_and_junk_is_not() {
        let g = EdwardsAffine::generator();
        let cs = ConstraintSystem::<Fr>::new_ref();
        let on = is_on_curve(&witness(&cs, g.x), &witness(&cs, g.y)).unwrap();
        let off = is_on_curve(&witness(&cs, Fr::from(3u64)), &witness(&cs, Fr::from(5u64))).unwrap();
        assert!(on.value().unwrap());
        assert!(!off.value().unwrap());
        assert!(native_on_curve(g.x, g.y));
        assert!(!native_on_curve(Fr::from(3u64), Fr::from(5u64)));
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn off_curve_point_becomes_identity() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let (p, on) = point_or_identity(&witness(&cs, Fr::zero()), &witness(&cs, Fr::zero())).unwrap();
        assert!(!on.value().unwrap());
        assert_eq!(p.x.value().unwrap(), Fr::zero());
        assert_eq!(p.y.value().unwrap(), Fr::one());
    }

    #[test]
    fn poseidon_gadget_matches_native() {
        let inputs: Vec<Fr> = (1..=7u64).map(Fr::from).collect();
        let cs = ConstraintSystem::<Fr>::new_ref();
        let vars: Vec<FpVar<Fr>> = inputs.iter().map(|v| witness(&cs, *v)).collect();
        let refs: Vec<&FpVar<Fr>> = vars.iter().collect();
        let out = poseidon(cs.clone(), &refs).unwrap();
        assert_eq!(out.value().unwrap(), izk_crypto::poseidon_hash(&inputs));
        assert!(cs.is_satisfied().unwrap());
    }

    fn signed(income: u64) -> ([Fr; 3], [Fr; 2], [Fr; 3]) {
        let kp = IssuerKeyPair::from_secret_bytes(&[3u8; 32]).unwrap();
        let msg = AttestationMessage {
            identity_hash: Fr::from(77u64),
            monthly_income: income,
            issued_at: 1_767_225_600,
        };
        let sig = kp.sign(&msg);
        let (pk_x, pk_y) = kp.public_key().coordinates();
        (
            sig.field_elements(),
            [pk_x, pk_y],
            [msg.identity_hash, Fr::from(income), Fr::from(msg.issued_at)],
        )
    }

    fn run_gadget(sig: [Fr; 3], pk: [Fr; 2], msg: [Fr; 3]) -> bool {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let [r_x, r_y, s] = sig.map(|v| witness(&cs, v));
        let [pk_x, pk_y] = pk.map(|v| witness(&cs, v));
        let [identity_hash, monthly_income, issued_at] = msg.map(|v| witness(&cs, v));
        let ok = schnorr_verify(
            cs.clone(),
            &SchnorrVars {
                r_x: &r_x,
                r_y: &r_y,
                s: &s,
                pk_x: &pk_x,
                pk_y: &pk_y,
                identity_hash: &identity_hash,
                monthly_income: &monthly_income,
                issued_at: &issued_at,
            },
        )
        .unwrap();
        assert!(cs.is_satisfied().unwrap());
        ok.value().unwrap()
    }

    #[test]
    fn schnorr_gadget_accepts_issuer_signature() {
        let (sig, pk, msg) = signed(1800);
        assert!(native_schnorr_verify(sig, pk, msg));
        assert!(run_gadget(sig, pk, msg));
    }

    #[test]
    fn schnorr_gadget_rejects_altered_income() {
        let (sig, pk, mut msg) = signed(1800);
        msg[1] = Fr::from(1801u64);
        assert!(!native_schnorr_verify(sig, pk, msg));
        assert!(!run_gadget(sig, pk, msg));
    }

    #[test]
    fn schnorr_gadget_rejects_off_curve_r() {
        let (mut sig, pk, msg) = signed(1800);
        sig[0] = Fr::from(3u64);
        assert!(!native_schnorr_verify(sig, pk, msg));
        assert!(!run_gadget(sig, pk, msg));
    }
}
