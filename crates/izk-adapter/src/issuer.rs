//! # Issuer Record Wire Format
//!
//! The JSON an income authority returns for a citizen:
//!
//! ```json
//! {
//!   "ic": "900101-14-5678",
//!   "monthly_income": 1800,
//!   "citizen_name": "…",
//!   "verification_timestamp": "2026-01-01T00:00:00Z",
//!   "signature": "<128 hex chars>",
//!   "public_key": "<64 hex chars>",
//!   "issuer": "LHDN"
//! }
//! ```
//!
//! Unknown fields are rejected at parse time. Missing fields parse as
//! `None` and are reported by name, either here (`citizen_name`,
//! `issuer`) or by the witness builder, so a caller learns exactly which
//! field was absent.

use izk_core::{IdentityNumber, Timestamp};
use izk_crypto::{AttestationMessage, IssuerKeyPair};
use izk_zkp::codec::encode_identity;
use izk_zkp::{SignedIncomeRecord, WitnessError};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::AdapterError;

/// An issuer record as received.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IssuerRecordJson {
    /// Identity card number.
    #[serde(default)]
    pub ic: Option<String>,
    /// Monthly income, integer currency units.
    #[serde(default)]
    pub monthly_income: Option<i64>,
    /// Citizen name. Carried for the platform; never enters the circuit.
    #[serde(default)]
    pub citizen_name: Option<String>,
    /// When the issuer signed, ISO 8601.
    #[serde(default)]
    pub verification_timestamp: Option<String>,
    /// Signature hex.
    #[serde(default)]
    pub signature: Option<String>,
    /// Issuer public key hex.
    #[serde(default)]
    pub public_key: Option<String>,
    /// Issuing authority name.
    #[serde(default)]
    pub issuer: Option<String>,
}

impl IssuerRecordJson {
    /// Parse issuer JSON.
    ///
    /// # Errors
    ///
    /// [`AdapterError::InvalidRecord`] for syntax errors, unknown fields, or
    /// wrongly typed values (including a fractional income).
    pub fn parse(json: &str) -> Result<Self, AdapterError> {
        serde_json::from_str(json).map_err(|e| AdapterError::InvalidRecord(e.to_string()))
    }

    /// Sign a record as the issuer holding `key`.
    pub fn signed(
        key: &IssuerKeyPair,
        ic: &str,
        monthly_income: u32,
        citizen_name: &str,
        issued_at: Timestamp,
        issuer: &str,
    ) -> Result<Self, AdapterError> {
        let identity = IdentityNumber::new(ic).map_err(|e| AdapterError::Signing(e.to_string()))?;
        let issued_secs = u64::try_from(issued_at.epoch_secs())
            .map_err(|_| AdapterError::Signing("issue time precedes the Unix epoch".into()))?;
        let signature = key.sign(&AttestationMessage {
            identity_hash: encode_identity(&identity),
            monthly_income: u64::from(monthly_income),
            issued_at: issued_secs,
        });
        Ok(Self {
            ic: Some(ic.to_string()),
            monthly_income: Some(i64::from(monthly_income)),
            citizen_name: Some(citizen_name.to_string()),
            verification_timestamp: Some(issued_at.to_iso8601()),
            signature: Some(signature.to_hex()),
            public_key: Some(key.public_key().to_hex()),
            issuer: Some(issuer.to_string()),
        })
    }

    /// Convert to the witness builder's input.
    ///
    /// # Errors
    ///
    /// [`WitnessError::Malformed`] if the timestamp does not parse, and
    /// [`WitnessError::MissingField`] if `citizen_name` or `issuer` is
    /// absent or blank.
    pub fn to_record(&self) -> Result<SignedIncomeRecord, AdapterError> {
        let issued_at = self
            .verification_timestamp
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                Timestamp::parse_lenient(s).map_err(|_| WitnessError::Malformed {
                    field: "verification_timestamp",
                    reason: "expected an ISO 8601 date-time".into(),
                })
            })
            .transpose()?;
        require_text(self.citizen_name.as_deref(), "citizen_name")?;
        require_text(self.issuer.as_deref(), "issuer")?;
        Ok(SignedIncomeRecord {
            identity_id: self.ic.clone(),
            monthly_income: self.monthly_income,
            issued_at,
            signature: self.signature.clone(),
            issuer_public_key: self.public_key.clone(),
        })
    }
}

fn require_text(value: Option<&str>, field: &'static str) -> Result<(), WitnessError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(WitnessError::MissingField(field)),
    }
}

impl std::fmt::Debug for IssuerRecordJson {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuerRecordJson")
            .field("ic", &self.ic.as_ref().map(|_| "[REDACTED]"))
            .field("monthly_income", &self.monthly_income.map(|_| "[REDACTED]"))
            .field("citizen_name", &self.citizen_name.as_ref().map(|_| "[REDACTED]"))
            .field("verification_timestamp", &self.verification_timestamp)
            .field("public_key", &self.public_key)
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl Drop for IssuerRecordJson {
    fn drop(&mut self) {
        if let Some(name) = self.citizen_name.as_mut() {
            name.zeroize();
        }
        if let Some(ic) = self.ic.as_mut() {
            ic.zeroize();
        }
        self.monthly_income.zeroize();
    }
}
