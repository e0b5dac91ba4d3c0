//! # Hex Encoding
//!
//! Lowercase hex helpers for key, signature, and digest material.

/// Encode bytes as lowercase hex.
pub fn encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decode a hex string (either case, optional `0x` prefix) into bytes.
///
/// # Errors
///
/// Returns a description of the first problem found: odd length or a
/// non-hex character.
pub fn decode(s: &str) -> Result<Vec<u8>, String> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    if s.len() % 2 != 0 {
        return Err(format!("odd hex length {}", s.len()));
    }
    if let Some(bad) = s.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(format!("non-hex character {bad:?}"));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(|e| e.to_string()))
        .collect()
}

/// Decode a hex string that must be exactly `N` bytes long.
pub fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], String> {
    let bytes = decode(s)?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| format!("expected {N} bytes, got {len}"))
}
