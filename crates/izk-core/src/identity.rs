//! # Identity Numbers
//!
//! The Malaysian identity card number (MyKad, "IC") is the citizen key in
//! issuer records. It only ever enters a circuit as a hash, so the type's
//! job is to pin one canonical string per citizen before hashing:
//! `"900101-14-5678"` and `"900101145678"` must hash identically.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A MyKad identity number in canonical 12-digit form.
///
/// Accepts `YYMMDDPBNNNG` or `YYMMDD-PB-NNNG`. The birth-date prefix is not
/// calendar-validated; issuers own that check.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentityNumber(String);

impl IdentityNumber {
    /// Validate and normalize an identity number.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidIdentityNumber`] if the value is not
    /// 12 digits or uses a dash layout other than 6-2-4.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.contains('-') {
            let parts: Vec<&str> = trimmed.split('-').collect();
            if parts.len() != 3 || parts[0].len() != 6 || parts[1].len() != 2 || parts[2].len() != 4
            {
                return Err(ValidationError::InvalidIdentityNumber(raw));
            }
        }
        let digits: String = trimmed.chars().filter(|c| *c != '-').collect();
        if digits.len() != 12 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidIdentityNumber(raw));
        }
        Ok(Self(digits))
    }

    /// The canonical 12-digit form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A masked rendering safe for logs, e.g. `900101******`.
    pub fn masked(&self) -> String {
        format!("{}******", &self.0[..6])
    }
}

impl std::fmt::Debug for IdentityNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("IdentityNumber").field(&self.masked()).finish()
    }
}

impl std::fmt::Display for IdentityNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for IdentityNumber {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IdentityNumber> for String {
    fn from(value: IdentityNumber) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_digits() {
        assert_eq!(IdentityNumber::new("900101145678").unwrap().as_str(), "900101145678");
    }

    #[test]
    fn dashed_form_normalizes() {
        let a = IdentityNumber::new("900101-14-5678").unwrap();
        let b = IdentityNumber::new("900101145678").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(IdentityNumber::new("90010114567").is_err());
        assert!(IdentityNumber::new("9001011456789").is_err());
    }

    #[test]
    fn rejects_letters() {
        assert!(IdentityNumber::new("90010114567A").is_err());
    }

    #[test]
    fn rejects_wrong_dash_layout() {
        assert!(IdentityNumber::new("9001011-4-5678").is_err());
        assert!(IdentityNumber::new("900101-145678").is_err());
    }

    #[test]
    fn debug_is_masked() {
        let id = IdentityNumber::new("900101145678").unwrap();
        let dbg = format!("{id:?}");
        assert!(dbg.contains("900101******"));
        assert!(!dbg.contains("5678"));
    }

    #[test]
    fn serde_validates() {
        let id: IdentityNumber = serde_json::from_str("\"900101-14-5678\"").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"900101145678\"");
        assert!(serde_json::from_str::<IdentityNumber>("\"123\"").is_err());
    }
}
