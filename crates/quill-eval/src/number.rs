//! Decimal arithmetic at a fixed number of significant digits.
//!
//! Every result is rounded half-up (ties away from zero) to the active
//! precision by `bigdecimal` and kept in normal form, without trailing
//! zeros in the unscaled value.

use std::num::NonZeroU64;

use bigdecimal::{BigDecimal, Context as DecimalContext, RoundingMode};
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};

use crate::EvalError;

/// Largest decimal exponent, either way, a computed number may reach.
pub const MAX_MAGNITUDE: i64 = 100_000;

/// Largest absolute exponent accepted by [`pow`].
pub const MAX_POWER: i64 = 9_999;

/// Extra digits carried by division before rounding.
const GUARD_DIGITS: i64 = 3;

const ROUNDING: RoundingMode = RoundingMode::HalfUp;

fn significant(precision: u32) -> NonZeroU64 {
    NonZeroU64::new(u64::from(precision)).unwrap_or(NonZeroU64::MIN)
}

fn decimal_context(precision: u32) -> DecimalContext {
    DecimalContext::new(significant(precision), ROUNDING)
}

/// Round to `precision` significant digits.
pub fn round(value: &BigDecimal, precision: u32) -> BigDecimal {
    value.with_precision_round(significant(precision), ROUNDING).normalized()
}

/// Round to a number of decimal places (negative places round to tens,
/// hundreds and so on).
pub fn round_places(value: &BigDecimal, places: i64) -> BigDecimal {
    value.with_scale_round(places, ROUNDING).normalized()
}

/// Decimal exponent of the leading digit: `2` for `123`, `-3` for `0.001`.
fn exponent_of(value: &BigDecimal) -> i64 {
    let (_, scale) = value.as_bigint_and_exponent();
    value.digits() as i64 - 1 - scale
}

/// Fail when a result has left the supported range.
pub fn checked(value: BigDecimal) -> Result<BigDecimal, EvalError> {
    if !value.is_zero() && exponent_of(&value).abs() > MAX_MAGNITUDE {
        return Err(EvalError::arithmetic("number out of range"));
    }
    Ok(value)
}

pub fn add(a: &BigDecimal, b: &BigDecimal, precision: u32) -> Result<BigDecimal, EvalError> {
    checked(round(&(a + b), precision))
}

pub fn sub(a: &BigDecimal, b: &BigDecimal, precision: u32) -> Result<BigDecimal, EvalError> {
    checked(round(&(a - b), precision))
}

pub fn mul(a: &BigDecimal, b: &BigDecimal, precision: u32) -> Result<BigDecimal, EvalError> {
    checked(round(&(a * b), precision))
}

/// Division at any precision. The quotient of the unscaled values carries
/// [`GUARD_DIGITS`] past the precision and is then rounded once.
pub fn div(a: &BigDecimal, b: &BigDecimal, precision: u32) -> Result<BigDecimal, EvalError> {
    if b.is_zero() {
        return Err(EvalError::arithmetic("division by zero"));
    }
    let wanted = i64::from(precision.max(1)) + GUARD_DIGITS;
    let shift = (wanted + b.digits() as i64 - a.digits() as i64).max(0);

    let (a_digits, a_scale) = a.as_bigint_and_exponent();
    let (b_digits, b_scale) = b.as_bigint_and_exponent();
    let quotient = a_digits * num_traits::pow(BigInt::from(10u32), shift as usize) / b_digits;

    checked(round(&BigDecimal::new(quotient, a_scale - b_scale + shift), precision))
}

/// Remainder with the sign of the dividend.
pub fn rem(a: &BigDecimal, b: &BigDecimal, precision: u32) -> Result<BigDecimal, EvalError> {
    if b.is_zero() {
        return Err(EvalError::arithmetic("division by zero"));
    }
    let (_, a_scale) = a.as_bigint_and_exponent();
    let (_, b_scale) = b.as_bigint_and_exponent();
    if (a_scale - b_scale).abs() > 2 * MAX_MAGNITUDE {
        return Err(EvalError::arithmetic("number out of range"));
    }
    checked(round(&(a % b), precision))
}

/// Raise to an integral power; negative exponents divide.
pub fn pow(base: &BigDecimal, exponent: &BigDecimal, precision: u32) -> Result<BigDecimal, EvalError> {
    let exponent = to_integer(exponent)
        .and_then(|e| e.to_i64())
        .ok_or_else(|| EvalError::arithmetic("exponent must be an integer"))?;
    if exponent.abs() > MAX_POWER {
        return Err(EvalError::arithmetic(format!(
            "exponent {} is larger than {}",
            exponent, MAX_POWER
        )));
    }
    if exponent == 0 {
        return Ok(BigDecimal::from(1));
    }
    if base.is_zero() {
        if exponent < 0 {
            return Err(EvalError::arithmetic("division by zero"));
        }
        return Ok(BigDecimal::zero());
    }

    let base = round(base, precision);
    if exponent_of(&base).saturating_mul(exponent).abs() > 2 * MAX_MAGNITUDE {
        return Err(EvalError::arithmetic("number out of range"));
    }
    checked(round(&base.powi_with_context(exponent, &decimal_context(precision)), precision))
}

/// Square root; negative input is out of domain.
pub fn sqrt(value: &BigDecimal, precision: u32) -> Result<BigDecimal, EvalError> {
    if value.is_negative() {
        return Err(EvalError::arithmetic(format!(
            "square root of negative number {}",
            format(value)
        )));
    }
    value
        .sqrt_with_context(&decimal_context(precision))
        .map(|root| root.normalized())
        .ok_or_else(|| EvalError::arithmetic("square root failed"))
}

/// The exact integer value, if `value` has no fractional part.
pub fn to_integer(value: &BigDecimal) -> Option<BigInt> {
    if !value.is_integer() {
        return None;
    }
    if !value.is_zero() && exponent_of(value) > MAX_MAGNITUDE {
        return None;
    }
    let (digits, _) = value.with_scale(0).into_bigint_and_exponent();
    Some(digits)
}

/// Plain decimal notation, never scientific: `42`, `-1.5`, `0.001`.
pub fn format(value: &BigDecimal) -> String {
    value.normalized().to_plain_string()
}
