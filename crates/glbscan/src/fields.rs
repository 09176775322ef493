//! Scalar decoders over raw value spans.
//!
//! Each decoder takes the exact bytes of one bare JSON value (whitespace
//! already trimmed) and returns a typed scalar or a [`SyntaxError`]. None of
//! them allocate on success. Exponent notation is not supported.

use bstr::BString;

use crate::error::SyntaxError;

/// Longest span accepted by [`parse_int`]: a sign and nineteen digits.
pub const MAX_INTEGER_LEN: usize = 20;

/// Strips leading and trailing ASCII whitespace.
#[must_use]
pub fn trim(span: &[u8]) -> &[u8] {
    span.trim_ascii()
}

fn invalid(span: &[u8]) -> SyntaxError {
    SyntaxError::InvalidNumber(BString::from(span))
}

fn out_of_range(span: &[u8]) -> SyntaxError {
    SyntaxError::NumberOutOfRange(BString::from(span))
}

/// Splits an optional leading minus sign off a numeric span.
fn sign(span: &[u8]) -> (bool, &[u8]) {
    match span.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, span),
    }
}

/// Parses an optionally negative decimal integer.
///
/// # Errors
///
/// Fails on an empty span, a span longer than [`MAX_INTEGER_LEN`], any byte
/// that is not an ASCII digit after the sign, or a value outside `i64`.
pub fn parse_int(span: &[u8]) -> Result<i64, SyntaxError> {
    if span.len() > MAX_INTEGER_LEN {
        return Err(invalid(span));
    }
    let (negative, digits) = sign(span);
    if digits.is_empty() {
        return Err(invalid(span));
    }

    let mut value: i64 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return Err(invalid(span));
        }
        let digit = i64::from(b - b'0');
        // Accumulating towards the sign keeps i64::MIN representable.
        value = value
            .checked_mul(10)
            .and_then(|v| {
                if negative {
                    v.checked_sub(digit)
                } else {
                    v.checked_add(digit)
                }
            })
            .ok_or_else(|| out_of_range(span))?;
    }
    Ok(value)
}

/// Parses a non-negative integer that must fit a `u32` (indices, lengths,
/// enum codes).
///
/// # Errors
///
/// As [`parse_int`], plus [`SyntaxError::NumberOutOfRange`] for negative or
/// too-large values.
pub fn parse_u32(span: &[u8]) -> Result<u32, SyntaxError> {
    let value = parse_int(span)?;
    u32::try_from(value).map_err(|_| out_of_range(span))
}

/// Parses a non-negative integer that must fit a `u64`.
///
/// # Errors
///
/// As [`parse_u32`].
pub fn parse_u64(span: &[u8]) -> Result<u64, SyntaxError> {
    let value = parse_int(span)?;
    u64::try_from(value).map_err(|_| out_of_range(span))
}

/// Parses a decimal number with at most one decimal point.
///
/// Integer digits accumulate as `value * 10 + digit`; each fractional digit
/// is divided by ten raised to its position after the point.
///
/// # Errors
///
/// Fails on an empty span, a lone sign, a second decimal point, a point
/// without digits on both sides, exponents, or any other non-digit byte.
pub fn parse_float(span: &[u8]) -> Result<f64, SyntaxError> {
    let (negative, body) = sign(span);

    let mut value = 0.0f64;
    let mut int_digits = 0usize;
    let mut frac_digits = 0usize;
    let mut scale = 1.0f64;
    let mut seen_point = false;

    for &b in body {
        match b {
            b'.' if !seen_point => seen_point = true,
            b'0'..=b'9' => {
                let digit = f64::from(b - b'0');
                if seen_point {
                    frac_digits += 1;
                    scale *= 10.0;
                    value += digit / scale;
                } else {
                    int_digits += 1;
                    value = value * 10.0 + digit;
                }
            }
            _ => return Err(invalid(span)),
        }
    }

    if int_digits == 0 || (seen_point && frac_digits == 0) {
        return Err(invalid(span));
    }
    Ok(if negative { -value } else { value })
}

/// Parses `true` or `false`.
///
/// # Errors
///
/// [`SyntaxError::InvalidLiteral`] for anything else.
pub fn parse_bool(span: &[u8]) -> Result<bool, SyntaxError> {
    match span {
        b"true" => Ok(true),
        b"false" => Ok(false),
        _ => Err(SyntaxError::InvalidLiteral(BString::from(span))),
    }
}
