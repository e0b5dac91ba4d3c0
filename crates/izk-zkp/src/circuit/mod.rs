//! # Income Classification Circuit
//!
//! R1CS over the BN254 scalar field that, from a signed income record,
//! publishes a signature-validity bit, a data-authenticity bit, and a
//! ten-flag bracket vector gated by authenticity.
//!
//! ## Public Signals
//!
//! Allocated in this order, which is also the order of the verifier's
//! public input vector:
//!
//! | index | signal |
//! |-------|--------|
//! | 0 | `is_signature_valid` |
//! | 1 | `is_data_authentic` |
//! | 2..=11 | `bracket_0` .. `bracket_9` |
//! | 12, 13 | issuer public key `x`, `y` |
//! | 14 | `identity_hash` |
//! | 15 | `max_signature_age_seconds` |
//! | 16 | `reference_time` |
//!
//! ## Totality
//!
//! Every check that depends on prover-supplied data yields a bit rather
//! than an enforced constraint, so garbage inputs produce a valid proof of
//! "not authentic". The only hard constraints beyond gadget internals are
//! the clock binding `issued_at + age == reference_time`, the one-hot sum,
//! and equality of each published output with its computed value.

pub mod gadgets;
pub mod native;

use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};
use izk_core::{BRACKET_COUNT, BRACKET_THRESHOLDS, INCOME_UPPER_BOUND};
use zeroize::Zeroize;

use self::gadgets::{less_than, schnorr_verify, split_low_bits, SchnorrVars};
pub use self::native::{evaluate, CircuitOutputs};
use crate::Fr;

/// Stable identifier recorded in artifact manifests and proof envelopes.
pub const CIRCUIT_ID: &str = "izk-income-bracket";

/// Bumped whenever the constraint system changes shape.
pub const CIRCUIT_VERSION: u32 = 1;

/// Number of public signals, excluding the constant `1`.
pub const PUBLIC_INPUT_COUNT: usize = 17;

/// Positions in the public signal vector.
pub mod signal {
    use izk_core::BRACKET_COUNT;

    /// `is_signature_valid`.
    pub const SIGNATURE_VALID: usize = 0;
    /// `is_data_authentic`.
    pub const DATA_AUTHENTIC: usize = 1;
    /// First bracket flag.
    pub const BRACKETS: usize = 2;
    /// Issuer key `x`.
    pub const ISSUER_PK_X: usize = BRACKETS + BRACKET_COUNT;
    /// Issuer key `y`.
    pub const ISSUER_PK_Y: usize = ISSUER_PK_X + 1;
    /// Field-encoded identity hash.
    pub const IDENTITY_HASH: usize = ISSUER_PK_Y + 1;
    /// Anti-replay bound in seconds.
    pub const MAX_SIGNATURE_AGE: usize = IDENTITY_HASH + 1;
    /// Time the signature age was measured at.
    pub const REFERENCE_TIME: usize = MAX_SIGNATURE_AGE + 1;
}

/// A full assignment of the circuit's non-output inputs.
///
/// Built by `WitnessBuilder`. The private half is redacted from `Debug` and
/// zeroized when the value is dropped.
#[derive(Clone)]
pub struct CircuitInputs {
    /// Private: monthly income in currency units.
    pub monthly_income: Fr,
    /// Private: `(R.x, R.y, s)`.
    pub signature: [Fr; 3],
    /// Private: issue time, Unix seconds.
    pub issued_at: Fr,
    /// Private: `reference_time - issued_at`.
    pub verification_age_seconds: Fr,
    /// Public: issuer key `(x, y)`.
    pub issuer_public_key: [Fr; 2],
    /// Public: hash of the identity number.
    pub identity_hash: Fr,
    /// Public: anti-replay bound.
    pub max_signature_age_seconds: Fr,
    /// Public: time the age was measured at, Unix seconds.
    pub reference_time: Fr,
}

impl std::fmt::Debug for CircuitInputs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitInputs")
            .field("monthly_income", &"[REDACTED]")
            .field("signature", &"[REDACTED]")
            .field("issued_at", &"[REDACTED]")
            .field("verification_age_seconds", &"[REDACTED]")
            .field("max_signature_age_seconds", &self.max_signature_age_seconds)
            .field("reference_time", &self.reference_time)
            .finish_non_exhaustive()
    }
}

impl Drop for CircuitInputs {
    fn drop(&mut self) {
        self.monthly_income.zeroize();
        self.signature.zeroize();
        self.issued_at.zeroize();
        self.verification_age_seconds.zeroize();
    }
}

/// The classification circuit.
///
/// [`ClassificationCircuit::blank`] is used for setup and fingerprinting;
/// proving needs [`ClassificationCircuit::new`] with a full assignment.
#[derive(Debug, Clone, Default)]
pub struct ClassificationCircuit {
    inputs: Option<CircuitInputs>,
}

impl ClassificationCircuit {
    /// A circuit with no assignment, for setup.
    pub fn blank() -> Self {
        Self::default()
    }

    /// A circuit carrying a witness, for proving.
    pub fn new(inputs: CircuitInputs) -> Self {
        Self {
            inputs: Some(inputs),
        }
    }

    /// The assignment, if any.
    pub fn inputs(&self) -> Option<&CircuitInputs> {
        self.inputs.as_ref()
    }
}

fn assigned<T>(value: Option<T>) -> Result<T, SynthesisError> {
    value.ok_or(SynthesisError::AssignmentMissing)
}

impl ConstraintSynthesizer<Fr> for ClassificationCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let inputs = self.inputs.as_ref();
        let outputs = inputs.map(evaluate);

        // Public outputs first so they lead the instance vector.
        let signature_valid_out =
            Boolean::new_input(cs.clone(), || assigned(outputs.map(|o| o.is_signature_valid)))?;
        let data_authentic_out =
            Boolean::new_input(cs.clone(), || assigned(outputs.map(|o| o.is_data_authentic)))?;
        let bracket_outs = (0..BRACKET_COUNT)
            .map(|i| Boolean::new_input(cs.clone(), || assigned(outputs.map(|o| o.brackets[i]))))
            .collect::<Result<Vec<_>, _>>()?;

        let pk_x =
            FpVar::new_input(cs.clone(), || assigned(inputs.map(|i| i.issuer_public_key[0])))?;
        let pk_y =
            FpVar::new_input(cs.clone(), || assigned(inputs.map(|i| i.issuer_public_key[1])))?;
        let identity_hash = FpVar::new_input(cs.clone(), || assigned(inputs.map(|i| i.identity_hash)))?;
        let max_age = FpVar::new_input(cs.clone(), || {
            assigned(inputs.map(|i| i.max_signature_age_seconds))
        })?;
        let reference_time =
            FpVar::new_input(cs.clone(), || assigned(inputs.map(|i| i.reference_time)))?;

        let income = FpVar::new_witness(cs.clone(), || assigned(inputs.map(|i| i.monthly_income)))?;
        let r_x = FpVar::new_witness(cs.clone(), || assigned(inputs.map(|i| i.signature[0])))?;
        let r_y = FpVar::new_witness(cs.clone(), || assigned(inputs.map(|i| i.signature[1])))?;
        let s = FpVar::new_witness(cs.clone(), || assigned(inputs.map(|i| i.signature[2])))?;
        let issued_at = FpVar::new_witness(cs.clone(), || assigned(inputs.map(|i| i.issued_at)))?;
        let age = FpVar::new_witness(cs.clone(), || {
            assigned(inputs.map(|i| i.verification_age_seconds))
        })?;

        (&issued_at + &age).enforce_equal(&reference_time)?;

        // Signature validity.
        let zero = FpVar::zero();
        let sig_present = Boolean::kary_or(&[r_x.is_neq(&zero)?, r_y.is_neq(&zero)?, s.is_neq(&zero)?])?;
        let key_present = Boolean::kary_or(&[pk_x.is_neq(&zero)?, pk_y.is_neq(&zero)?])?;
        let equation_holds = schnorr_verify(
            cs.clone(),
            &SchnorrVars {
                r_x: &r_x,
                r_y: &r_y,
                s: &s,
                pk_x: &pk_x,
                pk_y: &pk_y,
                identity_hash: &identity_hash,
                monthly_income: &income,
                issued_at: &issued_at,
            },
        )?;
        let signature_valid = Boolean::kary_and(&[sig_present, key_present, equation_holds])?;

        // Freshness.
        let (age_fits, age_low) = split_low_bits(&age, 64)?;
        let (max_fits, max_low) = split_low_bits(&max_age, 64)?;
        let fresh = less_than(cs.clone(), &age_low, &max_low, 64)?;
        let timestamp_ok = Boolean::kary_and(&[age_fits, max_fits, fresh])?;

        // Income plausibility.
        let (income_fits, income_low) = split_low_bits(&income, 32)?;
        let upper = FpVar::constant(Fr::from(INCOME_UPPER_BOUND));
        let below_upper = less_than(cs.clone(), &income_low, &upper, 32)?;
        let income_in_range = income_fits.and(&below_upper)?;

        let data_authentic =
            Boolean::kary_and(&[signature_valid.clone(), timestamp_ok, income_in_range])?;

        // Brackets.
        let below = BRACKET_THRESHOLDS
            .iter()
            .map(|t| less_than(cs.clone(), &income_low, &FpVar::constant(Fr::from(*t)), 32))
            .collect::<Result<Vec<_>, _>>()?;
        let mut flags = Vec::with_capacity(BRACKET_COUNT);
        flags.push(below[0].clone());
        for pair in below.windows(2) {
            flags.push(pair[0].not().and(&pair[1])?);
        }
        flags.push(below[BRACKET_COUNT - 2].not());

        let total = flags
            .iter()
            .fold(FpVar::zero(), |acc, flag| acc + FpVar::from(flag.clone()));
        total.enforce_equal(&FpVar::one())?;

        // Published outputs.
        signature_valid_out.enforce_equal(&signature_valid)?;
        data_authentic_out.enforce_equal(&data_authentic)?;
        for (out, flag) in bracket_outs.iter().zip(&flags) {
            out.enforce_equal(&flag.and(&data_authentic)?)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{signed_inputs, ISSUED_AT, MAX_AGE};
    use ark_ff::{One, Zero};
    use ark_relations::r1cs::{ConstraintSystem, SynthesisMode};
    use izk_core::BracketLabel;

    /// Synthesize with a witness; returns satisfaction and the public signals.
    fn synthesize(inputs: &CircuitInputs) -> (bool, Vec<Fr>) {
        let cs = ConstraintSystem::<Fr>::new_ref();
        ClassificationCircuit::new(inputs.clone())
            .generate_constraints(cs.clone())
            .unwrap();
        let satisfied = cs.is_satisfied().unwrap();
        let instance = cs.borrow().unwrap().instance_assignment[1..].to_vec();
        (satisfied, instance)
    }

    fn assert_honest(inputs: &CircuitInputs) -> CircuitOutputs {
        let (satisfied, instance) = synthesize(inputs);
        assert!(satisfied, "honest witness must satisfy the circuit");
        let outputs = evaluate(inputs);
        assert_eq!(instance, outputs.public_signals(inputs));
        outputs
    }

    fn bracket_index(outputs: &CircuitOutputs) -> Option<usize> {
        outputs.brackets.iter().position(|b| *b)
    }

    #[test]
    fn blank_circuit_shape() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        cs.set_mode(SynthesisMode::Setup);
        ClassificationCircuit::blank()
            .generate_constraints(cs.clone())
            .unwrap();
        assert_eq!(cs.num_instance_variables(), PUBLIC_INPUT_COUNT + 1);
        assert!(cs.num_constraints() > 1000);
    }

    #[test]
    fn blank_circuit_cannot_prove() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let err = ClassificationCircuit::blank()
            .generate_constraints(cs)
            .unwrap_err();
        assert!(matches!(err, SynthesisError::AssignmentMissing));
    }

    #[test]
    fn signal_positions() {
        assert_eq!(signal::ISSUER_PK_X, 12);
        assert_eq!(signal::REFERENCE_TIME, PUBLIC_INPUT_COUNT - 1);
    }

    #[test]
    fn fresh_low_income_is_b1() {
        let outputs = assert_honest(&signed_inputs(1800, 60));
        assert!(outputs.is_signature_valid);
        assert!(outputs.is_data_authentic);
        assert_eq!(bracket_index(&outputs), Some(BracketLabel::B1.index()));
    }

    #[test]
    fn income_6340_is_index_5() {
        let outputs = assert_honest(&signed_inputs(6340, 0));
        assert_eq!(bracket_index(&outputs), Some(5));
    }

    #[test]
    fn every_boundary_is_exact() {
        for (i, t) in BRACKET_THRESHOLDS.iter().enumerate() {
            let below = assert_honest(&signed_inputs(t - 1, 10));
            let at = assert_honest(&signed_inputs(*t, 10));
            assert_eq!(bracket_index(&below), Some(i), "income {}", t - 1);
            assert_eq!(bracket_index(&at), Some(i + 1), "income {t}");
        }
    }

    #[test]
    fn age_equal_to_max_is_replay() {
        let outputs = assert_honest(&signed_inputs(1800, MAX_AGE));
        assert!(outputs.is_signature_valid);
        assert!(!outputs.timestamp_ok);
        assert!(!outputs.is_data_authentic);
        assert_eq!(bracket_index(&outputs), None);
    }

    #[test]
    fn age_one_below_max_is_fresh() {
        let outputs = assert_honest(&signed_inputs(1800, MAX_AGE - 1));
        assert!(outputs.is_data_authentic);
    }

    #[test]
    fn day_old_record_is_stale() {
        let outputs = assert_honest(&signed_inputs(1800, 90_000));
        assert!(outputs.is_signature_valid);
        assert!(!outputs.is_data_authentic);
        assert!(outputs.brackets.iter().all(|b| !b));
    }

    #[test]
    fn zero_signature_is_invalid() {
        let mut inputs = signed_inputs(1800, 60);
        inputs.signature = [Fr::zero(); 3];
        let outputs = assert_honest(&inputs);
        assert!(!outputs.is_signature_valid);
        assert!(!outputs.is_data_authentic);
    }

    #[test]
    fn zero_key_is_invalid() {
        let mut inputs = signed_inputs(1800, 60);
        inputs.issuer_public_key = [Fr::zero(); 2];
        let outputs = assert_honest(&inputs);
        assert!(!outputs.is_signature_valid);
    }

    #[test]
    fn altered_income_breaks_signature() {
        let mut inputs = signed_inputs(1800, 60);
        inputs.monthly_income = Fr::from(20_000u64);
        let outputs = assert_honest(&inputs);
        assert!(!outputs.is_signature_valid);
        assert_eq!(bracket_index(&outputs), None);
        assert!(outputs.raw_flags[BracketLabel::T2.index()]);
    }

    #[test]
    fn off_curve_r_is_invalid_not_unsatisfiable() {
        let mut inputs = signed_inputs(1800, 60);
        inputs.signature[0] = Fr::from(12345u64);
        let outputs = assert_honest(&inputs);
        assert!(!outputs.is_signature_valid);
    }

    #[test]
    fn upper_bound_income_is_unauthentic() {
        let outputs = assert_honest(&signed_inputs(INCOME_UPPER_BOUND, 60));
        assert!(outputs.is_signature_valid);
        assert!(!outputs.income_in_range);
        assert!(!outputs.is_data_authentic);
    }

    #[test]
    fn income_beyond_32_bits_stays_total() {
        let outputs = assert_honest(&signed_inputs(1 << 40, 60));
        assert!(!outputs.income_in_range);
        assert_eq!(outputs.raw_flags.iter().filter(|f| **f).count(), 1);
    }

    #[test]
    fn age_beyond_64_bits_stays_total() {
        let mut inputs = signed_inputs(1800, 0);
        let huge = Fr::from(u64::MAX) + Fr::one();
        inputs.verification_age_seconds = huge;
        inputs.reference_time = Fr::from(ISSUED_AT) + huge;
        let outputs = assert_honest(&inputs);
        assert!(!outputs.timestamp_ok);
    }

    #[test]
    fn clock_mismatch_is_unsatisfiable() {
        let mut inputs = signed_inputs(1800, 60);
        inputs.reference_time += Fr::one();
        let (satisfied, _) = synthesize(&inputs);
        assert!(!satisfied);
    }

    #[test]
    fn debug_redacts_private_inputs() {
        let inputs = signed_inputs(1800, 60);
        let dbg = format!("{inputs:?}");
        assert!(dbg.contains("[REDACTED]"));
        assert!(!dbg.contains("1800"));
    }
}
