//! # Poseidon over the BN254 Scalar Field
//!
//! A single fixed parameter set shared by the native hash here and the
//! constraint gadget in `izk-zkp`. The round constants and MDS matrix are
//! derived once with the Grain LFSR procedure and cached for the process
//! lifetime.
//!
//! Changing any parameter changes every issuer signature challenge and the
//! circuit fingerprint.

use std::sync::OnceLock;

use ark_crypto_primitives::sponge::poseidon::{
    find_poseidon_ark_and_mds, PoseidonConfig, PoseidonSponge,
};
use ark_crypto_primitives::sponge::{CryptographicSponge, FieldBasedCryptographicSponge};
use ark_ff::PrimeField;

use crate::Fq;

/// Sponge rate (field elements absorbed per permutation).
pub const RATE: usize = 2;
/// Sponge capacity.
pub const CAPACITY: usize = 1;
/// S-box exponent.
pub const ALPHA: u64 = 5;
/// Full rounds.
pub const FULL_ROUNDS: usize = 8;
/// Partial rounds.
pub const PARTIAL_ROUNDS: usize = 57;

static CONFIG: OnceLock<PoseidonConfig<Fq>> = OnceLock::new();

/// The process-wide Poseidon configuration.
pub fn poseidon_config() -> &'static PoseidonConfig<Fq> {
    CONFIG.get_or_init(|| {
        let (ark, mds) = find_poseidon_ark_and_mds::<Fq>(
            u64::from(Fq::MODULUS_BIT_SIZE),
            RATE,
            FULL_ROUNDS as u64,
            PARTIAL_ROUNDS as u64,
            0,
        );
        PoseidonConfig::new(FULL_ROUNDS, PARTIAL_ROUNDS, ALPHA, mds, ark, RATE, CAPACITY)
    })
}

/// Hash a sequence of field elements to one field element.
///
/// Elements are absorbed one at a time in order, then a single element is
/// squeezed. The gadget in `izk-zkp` follows the same absorb/squeeze
/// schedule.
pub fn poseidon_hash(inputs: &[Fq]) -> Fq {
    let mut sponge = PoseidonSponge::<Fq>::new(poseidon_config());
    for x in inputs {
        sponge.absorb(x);
    }
    // Squeezing one element always yields exactly one element.
    sponge.squeeze_native_field_elements(1)[0]
}
