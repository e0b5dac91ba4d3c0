//! The platform-facing result of a classification.

use izk_core::{Classification, EligibilityClass};
use izk_zkp::DecodedSignals;
use serde::{Deserialize, Serialize};

/// Bracket label and authenticity bits. Never carries the income.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterResponse {
    /// `"B1"`..`"T2"`, or `"unauthentic"`.
    pub classification: Classification,
    /// The issuer signature verified in-circuit.
    pub is_signature_valid: bool,
    /// Signature valid, fresh, and income plausible.
    pub is_data_authentic: bool,
    /// Policy group for the bracket; `null` when unauthentic.
    pub eligibility_class: Option<EligibilityClass>,
}

impl From<&DecodedSignals> for AdapterResponse {
    fn from(signals: &DecodedSignals) -> Self {
        Self {
            classification: signals.classification,
            is_signature_valid: signals.is_signature_valid,
            is_data_authentic: signals.is_data_authentic,
            eligibility_class: signals.classification.eligibility_class(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use izk_core::BracketLabel;
    use izk_zkp::Fr;

    fn decoded(classification: Classification) -> DecodedSignals {
        DecodedSignals {
            is_signature_valid: true,
            is_data_authentic: classification != Classification::Unauthentic,
            classification,
            issuer_public_key: [Fr::from(1u64), Fr::from(2u64)],
            identity_hash: Fr::from(3u64),
            max_signature_age_seconds: 86_400,
            reference_time: 1,
        }
    }

    #[test]
    fn authentic_response_json() {
        let resp = AdapterResponse::from(&decoded(Classification::Bracket(BracketLabel::M2)));
        let json = serde_json::to_value(resp).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "classification": "M2",
                "is_signature_valid": true,
                "is_data_authentic": true,
                "eligibility_class": "M40-M1"
            })
        );
    }

    #[test]
    fn unauthentic_has_no_class() {
        let resp = AdapterResponse::from(&decoded(Classification::Unauthentic));
        assert_eq!(resp.eligibility_class, None);
        let json = serde_json::to_value(resp).unwrap();
        assert_eq!(json["classification"], "unauthentic");
        assert!(json["eligibility_class"].is_null());
    }
}
