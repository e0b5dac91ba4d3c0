//! Out-of-circuit evaluation of the classification logic.
//!
//! The prover needs the published outputs before synthesis so it can assign
//! them as public inputs. [`evaluate`] computes them with the same
//! range-splitting and identity-substitution rules the gadgets use, so a
//! witness built from honest inputs always satisfies the circuit.

use ark_ff::{PrimeField, Zero};
use izk_core::{BRACKET_COUNT, BRACKET_THRESHOLDS, INCOME_UPPER_BOUND};

use super::gadgets::native_schnorr_verify;
use super::CircuitInputs;
use crate::codec::{bit_length, encode_bool};
use crate::Fr;

/// Everything the circuit derives from its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitOutputs {
    /// Signature present, key present, both points on curve, equation holds.
    pub is_signature_valid: bool,
    /// `is_signature_valid ∧ timestamp_ok ∧ income_in_range`.
    pub is_data_authentic: bool,
    /// Signature age strictly below the maximum.
    pub timestamp_ok: bool,
    /// Income below 2^32 and below the upper bound.
    pub income_in_range: bool,
    /// Ungated bracket flags; exactly one is set.
    pub raw_flags: [bool; BRACKET_COUNT],
    /// Published flags: `raw_flags` gated by authenticity.
    pub brackets: [bool; BRACKET_COUNT],
}

impl CircuitOutputs {
    /// The 17 public signals in allocation order.
    pub fn public_signals(&self, inputs: &CircuitInputs) -> Vec<Fr> {
        let mut signals = Vec::with_capacity(super::PUBLIC_INPUT_COUNT);
        signals.push(encode_bool(self.is_signature_valid));
        signals.push(encode_bool(self.is_data_authentic));
        signals.extend(self.brackets.iter().map(|b| encode_bool(*b)));
        signals.extend_from_slice(&inputs.issuer_public_key);
        signals.push(inputs.identity_hash);
        signals.push(inputs.max_signature_age_seconds);
        signals.push(inputs.reference_time);
        signals
    }
}

/// Evaluate the circuit's outputs for an assignment.
pub fn evaluate(inputs: &CircuitInputs) -> CircuitOutputs {
    let [r_x, r_y, s] = inputs.signature;
    let [pk_x, pk_y] = inputs.issuer_public_key;

    let sig_present = !(r_x.is_zero() && r_y.is_zero() && s.is_zero());
    let key_present = !(pk_x.is_zero() && pk_y.is_zero());
    let is_signature_valid = sig_present
        && key_present
        && native_schnorr_verify(
            inputs.signature,
            inputs.issuer_public_key,
            [inputs.identity_hash, inputs.monthly_income, inputs.issued_at],
        );

    let (age_fits, age) = split(&inputs.verification_age_seconds, 64);
    let (max_fits, max) = split(&inputs.max_signature_age_seconds, 64);
    let timestamp_ok = age_fits && max_fits && age < max;

    let (income_fits, income) = split(&inputs.monthly_income, 32);
    let income_in_range = income_fits && income < INCOME_UPPER_BOUND;

    let is_data_authentic = is_signature_valid && timestamp_ok && income_in_range;

    let raw_flags = bracket_flags(income);
    let brackets = raw_flags.map(|f| f && is_data_authentic);

    CircuitOutputs {
        is_signature_valid,
        is_data_authentic,
        timestamp_ok,
        income_in_range,
        raw_flags,
        brackets,
    }
}

/// Ascending half-open bracket flags for an income below 2^32.
pub(crate) fn bracket_flags(income: u64) -> [bool; BRACKET_COUNT] {
    let below: Vec<bool> = BRACKET_THRESHOLDS.iter().map(|t| income < *t).collect();
    let mut flags = [false; BRACKET_COUNT];
    flags[0] = below[0];
    for i in 1..BRACKET_COUNT - 1 {
        flags[i] = !below[i - 1] && below[i];
    }
    flags[BRACKET_COUNT - 1] = !below[BRACKET_COUNT - 2];
    flags
}

/// `(x < 2^bits, low bits of x)` for `bits <= 64`.
fn split(x: &Fr, bits: usize) -> (bool, u64) {
    let fits = bit_length(x) <= bits;
    let limb = x.into_bigint().0[0];
    let low = if bits >= 64 {
        limb
    } else {
        limb & ((1u64 << bits) - 1)
    };
    (fits, low)
}
