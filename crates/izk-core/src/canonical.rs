//! # Canonical Serialization: JCS-Compatible Canonicalization
//!
//! This module defines [`CanonicalBytes`], the sole construction path for
//! bytes used in JSON digest computation: the universal parameter file
//! digest and the artifact manifest digest both flow through it.
//!
//! ## Coercion Rules
//!
//! 1. Reject floats: amounts and counts must be integers or strings.
//! 2. Normalize RFC 3339 datetimes to UTC with `Z` suffix, truncated to seconds.
//! 3. Sort object keys lexicographically (RFC 8785 via `serde_jcs`).
//! 4. Use compact separators.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS-compatible canonicalization.
///
/// The inner `Vec<u8>` is private: downstream code cannot construct
/// `CanonicalBytes` except through [`CanonicalBytes::new()`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`CanonicalizationError::FloatRejected`] if the value contains
    /// a non-integer number anywhere in its tree.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        Self::from_value(value)
    }

    /// Construct canonical bytes from an already-built JSON value.
    pub fn from_value(value: Value) -> Result<Self, CanonicalizationError> {
        let coerced = coerce_json_value(value)?;
        let s = serde_jcs::to_string(&coerced)?;
        Ok(Self(s.into_bytes()))
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume and return the inner byte vector.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn coerce_json_value(value: Value) -> Result<Value, CanonicalizationError> {
    match value {
        Value::Number(ref n) => {
            if n.is_f64() {
                if let Some(f) = n.as_f64() {
                    return Err(CanonicalizationError::FloatRejected(f));
                }
            }
            Ok(value)
        }
        Value::String(s) => match chrono::DateTime::parse_from_rfc3339(&s) {
            Ok(dt) => Ok(Value::String(
                dt.with_timezone(&chrono::Utc)
                    .format("%Y-%m-%dT%H:%M:%SZ")
                    .to_string(),
            )),
            Err(_) => Ok(Value::String(s)),
        },
        Value::Object(map) => {
            let mut coerced = serde_json::Map::new();
            for (k, v) in map {
                coerced.insert(k, coerce_json_value(v)?);
            }
            Ok(Value::Object(coerced))
        }
        Value::Array(arr) => {
            let coerced: Result<Vec<_>, _> = arr.into_iter().map(coerce_json_value).collect();
            Ok(Value::Array(coerced?))
        }
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sorted_keys_compact_separators() {
        let cb = CanonicalBytes::new(&json!({"power": 16, "curve": "bn254", "beacon": "ab"}))
            .unwrap();
        assert_eq!(
            std::str::from_utf8(cb.as_bytes()).unwrap(),
            r#"{"beacon":"ab","curve":"bn254","power":16}"#
        );
    }

    #[test]
    fn nested_objects_are_sorted() {
        let cb = CanonicalBytes::new(&json!({"b": {"z": 1, "a": 2}, "a": [3, 1]})).unwrap();
        assert_eq!(
            std::str::from_utf8(cb.as_bytes()).unwrap(),
            r#"{"a":[3,1],"b":{"a":2,"z":1}}"#
        );
    }

    #[test]
    fn floats_rejected() {
        let err = CanonicalBytes::new(&json!({"income": 1800.5})).unwrap_err();
        assert!(matches!(err, CanonicalizationError::FloatRejected(_)));
    }

    #[test]
    fn negative_integers_accepted() {
        assert!(CanonicalBytes::new(&json!({"delta": -5})).is_ok());
    }

    #[test]
    fn datetimes_normalized_to_utc_seconds() {
        let cb = CanonicalBytes::new(&json!({"t": "2026-01-15T17:00:00.123+05:00"})).unwrap();
        assert_eq!(
            std::str::from_utf8(cb.as_bytes()).unwrap(),
            r#"{"t":"2026-01-15T12:00:00Z"}"#
        );
    }

    #[test]
    fn key_order_does_not_change_bytes() {
        let a = CanonicalBytes::new(&json!({"x": 1, "y": 2})).unwrap();
        let b = CanonicalBytes::new(&json!({"y": 2, "x": 1})).unwrap();
        assert_eq!(a, b);
    }
}
