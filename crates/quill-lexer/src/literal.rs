//! Literal parsing shared by the lexer and by runtime coercion.
//!
//! Numbers and dates written in an expression and numbers and dates
//! recovered from text at runtime go through the same grammar.

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use num_bigint::BigInt;

/// Largest decimal exponent accepted in a number literal.
pub const MAX_EXPONENT: i64 = 9_999;

/// Parse a decimal number: `[+-]? (digits [. digits*] | . digits) ([eE] [+-]? digits)?`.
///
/// Surrounding whitespace is ignored.
pub fn parse_number(text: &str) -> Option<BigDecimal> {
    let text = text.trim();
    let (negative, rest) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };

    let (mantissa, exponent) = match rest.find(['e', 'E']) {
        Some(idx) => (&rest[..idx], Some(&rest[idx + 1..])),
        None => (rest, None),
    };

    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (mantissa, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let exponent: i64 = match exponent {
        Some(exp) => {
            let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) || digits.len() > 6 {
                return None;
            }
            let value: i64 = digits.parse().ok()?;
            if value > MAX_EXPONENT {
                return None;
            }
            if exp.starts_with('-') { -value } else { value }
        }
        None => 0,
    };

    let mut digits = String::with_capacity(int_part.len() + frac_part.len() + 1);
    if negative {
        digits.push('-');
    }
    digits.push_str(int_part);
    digits.push_str(frac_part);
    let unscaled: BigInt = digits.parse().ok()?;
    Some(BigDecimal::new(unscaled, frac_part.len() as i64 - exponent))
}

/// Parse an ISO-8601 date or date-time.
///
/// Accepts RFC 3339 (`2024-01-31T08:00:00+02:00`), a date-time without an
/// offset (taken as UTC, `T` or a space between date and time), and a bare
/// date (midnight UTC).
pub fn parse_date(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().fixed_offset())
}
