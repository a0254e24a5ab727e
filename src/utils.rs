//! Shared utility functions
//!
//! Integers in key layout files use C `strtol` base-0 syntax. [`parse_c_int`]
//! reproduces those rules so that existing files parse identically.

use thiserror::Error;

/// Error returned by [`parse_c_int`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntParseError {
    /// The token does not start with a number
    #[error("Could not parse {0}")]
    NoDigits(String),
    /// The number does not fit in 32 bits
    #[error("Out of bounds: {0}")]
    OutOfBounds(String),
}

/// Parses an integer with C `strtol(str, &end, 0)` semantics.
///
/// - optional leading whitespace and sign (`+` or `-`)
/// - `0x` / `0X` prefix selects hex (only when a hex digit follows)
/// - a leading `0` selects octal
/// - otherwise decimal
///
/// The longest valid numeric prefix is used and anything after it is
/// ignored, exactly like `strtol`. A token with no digits at all is an error.
///
/// Values above `i32::MAX` but within `u32::MAX` are reinterpreted as their
/// 32-bit pattern, which keeps vendor HID usage pages (`0xff00xxxx`) usable.
///
/// # Example
///
/// ```
/// use keylayout::utils::parse_c_int;
///
/// assert_eq!(parse_c_int("16"), Ok(16));
/// assert_eq!(parse_c_int("0x10"), Ok(16));
/// assert_eq!(parse_c_int("020"), Ok(16));
/// assert_eq!(parse_c_int("-5"), Ok(-5));
/// assert!(parse_c_int("abc").is_err());
/// ```
pub fn parse_c_int(token: &str) -> Result<i32, IntParseError> {
    let bytes = token.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() && is_c_space(bytes[pos]) {
        pos += 1;
    }

    let mut negative = false;
    if pos < bytes.len() && (bytes[pos] == b'+' || bytes[pos] == b'-') {
        negative = bytes[pos] == b'-';
        pos += 1;
    }

    let radix: u64 = if bytes.get(pos) == Some(&b'0')
        && matches!(bytes.get(pos + 1), Some(b'x' | b'X'))
        && bytes.get(pos + 2).is_some_and(|b| b.is_ascii_hexdigit())
    {
        pos += 2;
        16
    } else if bytes.get(pos) == Some(&b'0') {
        8
    } else {
        10
    };

    let mut magnitude: u64 = 0;
    let mut digits = 0;
    let mut overflow = false;
    while let Some(digit) = bytes.get(pos).and_then(|b| (*b as char).to_digit(radix as u32)) {
        match magnitude
            .checked_mul(radix)
            .and_then(|m| m.checked_add(u64::from(digit)))
        {
            Some(m) => magnitude = m,
            None => overflow = true,
        }
        digits += 1;
        pos += 1;
    }

    if digits == 0 {
        return Err(IntParseError::NoDigits(token.to_string()));
    }

    // strtol reports ERANGE once the value leaves the range of a 64-bit long
    let limit = if negative {
        i64::MAX as u64 + 1
    } else {
        i64::MAX as u64
    };
    if overflow || magnitude > limit {
        return Err(IntParseError::OutOfBounds(token.to_string()));
    }

    let value: i64 = if negative {
        (magnitude as i64).wrapping_neg()
    } else {
        magnitude as i64
    };

    if let Ok(v) = i32::try_from(value) {
        Ok(v)
    } else if let Ok(v) = u32::try_from(value) {
        Ok(v as i32)
    } else {
        Err(IntParseError::OutOfBounds(token.to_string()))
    }
}

fn is_c_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}
