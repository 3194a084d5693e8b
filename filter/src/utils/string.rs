//! String utility functions

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid escape {0:?}")]
    InvalidEscape(String),
    #[error("invalid UTF-8 after decoding")]
    InvalidUtf8,
}

/// Decode one form-encoded query component: `+` is a space, then
/// percent-escapes are resolved.
pub fn decode_form_component(raw: &str) -> Result<String, DecodeError> {
    let bytes = raw.as_bytes();
    for (idx, _) in raw.match_indices('%') {
        let escape = bytes.get(idx + 1..idx + 3);
        if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
            let end = (idx + 3).min(raw.len());
            let shown = String::from_utf8_lossy(&bytes[idx..end]).into_owned();
            return Err(DecodeError::InvalidEscape(shown));
        }
    }
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| DecodeError::InvalidUtf8)
}

/// Split a comma-separated list, trimming each element.
///
/// An empty input yields an empty list; inner empty elements are kept.
pub fn split_list(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    value.split(',').map(|s| s.trim().to_string()).collect()
}

/// Truthiness of a flag value: empty, `1` and `true` (any case) are true
pub fn is_truthy(value: &str) -> bool {
    value.is_empty() || value == "1" || value.eq_ignore_ascii_case("true")
}

/// Parse a boolean written as `true`/`false`/`1`/`0`, case-insensitively
pub fn parse_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    if value == "1" || value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value == "0" || value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
