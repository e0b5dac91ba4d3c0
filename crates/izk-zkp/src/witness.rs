//! # Witness Builder
//!
//! Turns a [`SignedIncomeRecord`] and the current time into a full circuit
//! assignment. All shape and range problems are reported here, before any
//! cryptographic work, as [`WitnessError`]s.
//!
//! Signature and key material that is well-formed hex but does not decode
//! to a curve point is encoded as zeros. The circuit then reports
//! `is_signature_valid = 0` instead of the prover failing, so a forged
//! record yields a proof of "not authentic" rather than an error.
//!
//! Nothing in this module logs income, signature bytes, or the identity
//! number.

use ark_ff::Zero;
use izk_core::{IdentityNumber, Timestamp};
use izk_crypto::{IssuerPublicKey, IssuerSignature};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use zeroize::Zeroize;

use crate::circuit::CircuitInputs;
use crate::codec::{
    encode_identity, encode_integer, encode_public_key, encode_signature, field_from_decimal,
    field_to_decimal,
};
use crate::error::{CodecError, WitnessError};
use crate::Fr;

/// Default anti-replay bound: one day.
pub const DEFAULT_MAX_SIGNATURE_AGE_SECS: u64 = 86_400;
/// Default tolerance for records issued slightly in the future.
pub const DEFAULT_CLOCK_SKEW_TOLERANCE_SECS: u64 = 300;

/// Environment variable overriding [`PublicParams::max_signature_age_seconds`].
pub const ENV_MAX_SIGNATURE_AGE: &str = "IZK_MAX_SIGNATURE_AGE_SECS";
/// Environment variable overriding [`PublicParams::clock_skew_tolerance_seconds`].
pub const ENV_CLOCK_SKEW_TOLERANCE: &str = "IZK_CLOCK_SKEW_TOLERANCE_SECS";

/// An issuer-signed income record, as received. Every field is optional so
/// absence can be reported precisely.
#[derive(Clone, Default)]
pub struct SignedIncomeRecord {
    /// Citizen identity number, any accepted layout.
    pub identity_id: Option<String>,
    /// Monthly income in currency units.
    pub monthly_income: Option<i64>,
    /// When the issuer signed the record.
    pub issued_at: Option<Timestamp>,
    /// 64-byte signature, hex.
    pub signature: Option<String>,
    /// 32-byte compressed issuer key, hex.
    pub issuer_public_key: Option<String>,
}

impl std::fmt::Debug for SignedIncomeRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedIncomeRecord")
            .field("identity_id", &self.identity_id.as_ref().map(|_| "[REDACTED]"))
            .field("monthly_income", &self.monthly_income.map(|_| "[REDACTED]"))
            .field("issued_at", &self.issued_at)
            .field("signature", &self.signature.as_ref().map(|_| "[REDACTED]"))
            .field("issuer_public_key", &self.issuer_public_key)
            .finish()
    }
}

/// Deployment-wide public parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicParams {
    /// Signatures this old or older are stale.
    pub max_signature_age_seconds: u64,
    /// How far in the future `issued_at` may be before it is rejected.
    pub clock_skew_tolerance_seconds: u64,
}

impl Default for PublicParams {
    fn default() -> Self {
        Self {
            max_signature_age_seconds: DEFAULT_MAX_SIGNATURE_AGE_SECS,
            clock_skew_tolerance_seconds: DEFAULT_CLOCK_SKEW_TOLERANCE_SECS,
        }
    }
}

impl PublicParams {
    /// Defaults overridden by `IZK_MAX_SIGNATURE_AGE_SECS` and
    /// `IZK_CLOCK_SKEW_TOLERANCE_SECS`.
    pub fn from_env() -> Result<Self, WitnessError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, WitnessError> {
        let mut params = Self::default();
        if let Some(v) = lookup(ENV_MAX_SIGNATURE_AGE) {
            params.max_signature_age_seconds = parse_secs(ENV_MAX_SIGNATURE_AGE, &v)?;
        }
        if let Some(v) = lookup(ENV_CLOCK_SKEW_TOLERANCE) {
            params.clock_skew_tolerance_seconds = parse_secs(ENV_CLOCK_SKEW_TOLERANCE, &v)?;
        }
        params.validate()?;
        Ok(params)
    }

    /// A zero age bound would make every record stale.
    pub fn validate(&self) -> Result<(), WitnessError> {
        if self.max_signature_age_seconds == 0 {
            return Err(WitnessError::OutOfRange {
                field: "max_signature_age_seconds",
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }
}

fn parse_secs(field: &'static str, value: &str) -> Result<u64, WitnessError> {
    value.trim().parse().map_err(|_| WitnessError::Malformed {
        field,
        reason: format!("expected whole seconds, got \"{value}\""),
    })
}

/// Builds circuit assignments under a fixed set of [`PublicParams`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WitnessBuilder {
    params: PublicParams,
}

impl WitnessBuilder {
    /// A builder using `params`.
    pub fn new(params: PublicParams) -> Self {
        Self { params }
    }

    /// The parameters in force.
    pub fn params(&self) -> &PublicParams {
        &self.params
    }

    /// Validate `record` and assemble the circuit inputs at time `now`.
    ///
    /// # Errors
    ///
    /// - [`WitnessError::MissingField`] for an absent or empty field.
    /// - [`WitnessError::OutOfRange`] for negative or ≥ 2^32 income and
    ///   negative timestamps.
    /// - [`WitnessError::ClockSkew`] when `issued_at` is further ahead of
    ///   `now` than the skew tolerance.
    /// - [`WitnessError::Malformed`] for a bad identity number or hex.
    pub fn build(&self, record: &SignedIncomeRecord, now: Timestamp) -> Result<CircuitInputs, WitnessError> {
        self.params.validate()?;

        let identity = required_str(record.identity_id.as_deref(), "identity_id")?;
        let identity = IdentityNumber::new(identity).map_err(|_| WitnessError::Malformed {
            field: "identity_id",
            reason: "expected 12 digits, optionally as YYMMDD-PB-NNNG".into(),
        })?;

        let income = record.monthly_income.ok_or(WitnessError::MissingField("monthly_income"))?;
        if income < 0 {
            return Err(WitnessError::OutOfRange {
                field: "monthly_income",
                reason: "must be non-negative".into(),
            });
        }
        if income > i64::from(u32::MAX) {
            return Err(WitnessError::OutOfRange {
                field: "monthly_income",
                reason: "must be below 2^32".into(),
            });
        }

        let issued_at = record.issued_at.ok_or(WitnessError::MissingField("issued_at"))?;
        let issued = non_negative_secs(issued_at, "issued_at")?;
        let now_secs = non_negative_secs(now, "now")?;

        let (reference_time, age) = if issued > now_secs {
            let skew = issued - now_secs;
            if skew > self.params.clock_skew_tolerance_seconds {
                warn!(
                    skew_seconds = skew,
                    tolerance_seconds = self.params.clock_skew_tolerance_seconds,
                    "record issued in the future"
                );
                return Err(WitnessError::ClockSkew {
                    skew_seconds: skew,
                    tolerance_seconds: self.params.clock_skew_tolerance_seconds,
                });
            }
            (issued, 0)
        } else {
            (now_secs, now_secs - issued)
        };

        let signature = decode_signature(required_str(record.signature.as_deref(), "signature")?)?;
        let issuer_public_key =
            decode_public_key(required_str(record.issuer_public_key.as_deref(), "issuer_public_key")?)?;

        let identity_hash = encode_identity(&identity);
        debug!(
            identity = %identity.masked(),
            reference_time,
            age_seconds = age,
            "witness assembled"
        );

        Ok(CircuitInputs {
            monthly_income: encode_integer(income as u64),
            signature,
            issued_at: encode_integer(issued),
            verification_age_seconds: encode_integer(age),
            issuer_public_key,
            identity_hash,
            max_signature_age_seconds: encode_integer(self.params.max_signature_age_seconds),
            reference_time: encode_integer(reference_time),
        })
    }
}

fn required_str<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, WitnessError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(WitnessError::MissingField(field)),
    }
}

fn non_negative_secs(ts: Timestamp, field: &'static str) -> Result<u64, WitnessError> {
    u64::try_from(ts.epoch_secs()).map_err(|_| WitnessError::OutOfRange {
        field,
        reason: "must not precede the Unix epoch".into(),
    })
}

fn decode_signature(hex: &str) -> Result<[Fr; 3], WitnessError> {
    let bytes = izk_core::hex::decode_fixed::<64>(hex).map_err(|reason| WitnessError::Malformed {
        field: "signature",
        reason,
    })?;
    if bytes.iter().all(|b| *b == 0) {
        return Ok([Fr::zero(); 3]);
    }
    match IssuerSignature::from_bytes(&bytes) {
        Ok(sig) => Ok(encode_signature(&sig)),
        Err(e) => {
            debug!(error = %e, "signature does not decode, encoding as zeros");
            Ok([Fr::zero(); 3])
        }
    }
}

fn decode_public_key(hex: &str) -> Result<[Fr; 2], WitnessError> {
    let bytes = izk_core::hex::decode_fixed::<32>(hex).map_err(|reason| WitnessError::Malformed {
        field: "issuer_public_key",
        reason,
    })?;
    if bytes.iter().all(|b| *b == 0) {
        return Ok([Fr::zero(); 2]);
    }
    match IssuerPublicKey::from_bytes(&bytes) {
        Ok(pk) => Ok(encode_public_key(&pk)),
        Err(e) => {
            debug!(error = %e, "issuer key does not decode, encoding as zeros");
            Ok([Fr::zero(); 2])
        }
    }
}

// ---------------------------------------------------------------------------
// Circuit input file
// ---------------------------------------------------------------------------

/// The circuit input JSON file: every element as a decimal string.
///
/// Holds private values; `Debug` redacts them and they are wiped on drop.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CircuitInputFile {
    /// Private income.
    pub monthly_income: String,
    /// Private `(R.x, R.y, s)`.
    pub signature: [String; 3],
    /// Private issue time.
    pub issued_at: String,
    /// Public reference time.
    pub verification_timestamp: String,
    /// Private age at the reference time.
    pub verification_age: String,
    /// Public issuer key `(x, y)`.
    pub public_key: [String; 2],
    /// Public identity hash.
    pub ic_hash: String,
    /// Public anti-replay bound.
    pub timestamp_range: String,
}

impl CircuitInputFile {
    /// Render an assignment.
    pub fn from_inputs(inputs: &CircuitInputs) -> Self {
        Self {
            monthly_income: field_to_decimal(&inputs.monthly_income),
            signature: inputs.signature.map(|f| field_to_decimal(&f)),
            issued_at: field_to_decimal(&inputs.issued_at),
            verification_timestamp: field_to_decimal(&inputs.reference_time),
            verification_age: field_to_decimal(&inputs.verification_age_seconds),
            public_key: inputs.issuer_public_key.map(|f| field_to_decimal(&f)),
            ic_hash: field_to_decimal(&inputs.identity_hash),
            timestamp_range: field_to_decimal(&inputs.max_signature_age_seconds),
        }
    }

    /// Parse back into an assignment.
    ///
    /// # Errors
    ///
    /// Any element that is not a canonical decimal below the field modulus.
    pub fn to_inputs(&self) -> Result<CircuitInputs, CodecError> {
        let [r_x, r_y, s] = &self.signature;
        let [pk_x, pk_y] = &self.public_key;
        Ok(CircuitInputs {
            monthly_income: field_from_decimal(&self.monthly_income)?,
            signature: [
                field_from_decimal(r_x)?,
                field_from_decimal(r_y)?,
                field_from_decimal(s)?,
            ],
            issued_at: field_from_decimal(&self.issued_at)?,
            verification_age_seconds: field_from_decimal(&self.verification_age)?,
            issuer_public_key: [field_from_decimal(pk_x)?, field_from_decimal(pk_y)?],
            identity_hash: field_from_decimal(&self.ic_hash)?,
            max_signature_age_seconds: field_from_decimal(&self.timestamp_range)?,
            reference_time: field_from_decimal(&self.verification_timestamp)?,
        })
    }
}

impl std::fmt::Debug for CircuitInputFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitInputFile")
            .field("monthly_income", &"[REDACTED]")
            .field("signature", &"[REDACTED]")
            .field("verification_timestamp", &self.verification_timestamp)
            .field("ic_hash", &self.ic_hash)
            .field("timestamp_range", &self.timestamp_range)
            .finish_non_exhaustive()
    }
}

impl Drop for CircuitInputFile {
    fn drop(&mut self) {
        self.monthly_income.zeroize();
        self.signature.iter_mut().for_each(Zeroize::zeroize);
        self.issued_at.zeroize();
        self.verification_age.zeroize();
    }
}
