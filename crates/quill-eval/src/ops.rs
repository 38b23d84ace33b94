//! Operator semantics over [`Value`]s.

use std::cmp::Ordering;

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset};
use quill_syntax::{BinOp, UnaryOp};

use crate::value::{epoch_seconds, from_epoch_seconds};
use crate::{ConversionError, EvalError, Value, number};

/// Apply a strict binary operator. `&&` and `||` short-circuit and are
/// handled by the evaluator; here they coerce both sides to logic.
pub fn binary(op: BinOp, left: &Value, right: &Value, precision: u32) -> Result<Value, EvalError> {
    match op {
        BinOp::Add => add(left, right, precision),
        BinOp::Sub => sub(left, right, precision),
        BinOp::Mul => numeric(left, right, |a, b| number::mul(a, b, precision)),
        BinOp::Div => numeric(left, right, |a, b| number::div(a, b, precision)),
        BinOp::Rem => numeric(left, right, |a, b| number::rem(a, b, precision)),
        BinOp::Pow => numeric(left, right, |a, b| number::pow(a, b, precision)),
        BinOp::Concat => {
            let mut text = left.to_text();
            text.push_str(&right.to_text());
            Ok(Value::text(text))
        }
        BinOp::Eq => Ok(Value::Logic(equals(left, right))),
        BinOp::Ne => Ok(Value::Logic(!equals(left, right))),
        BinOp::Lt => Ok(Value::Logic(compare(left, right)? == Ordering::Less)),
        BinOp::Le => Ok(Value::Logic(compare(left, right)? != Ordering::Greater)),
        BinOp::Gt => Ok(Value::Logic(compare(left, right)? == Ordering::Greater)),
        BinOp::Ge => Ok(Value::Logic(compare(left, right)? != Ordering::Less)),
        BinOp::And => Ok(Value::Logic(left.as_logic()? && right.as_logic()?)),
        BinOp::Or => Ok(Value::Logic(left.as_logic()? || right.as_logic()?)),
    }
}

pub fn unary(op: UnaryOp, operand: &Value, precision: u32) -> Result<Value, EvalError> {
    match op {
        UnaryOp::Neg => Ok(Value::Number(-number::round(&operand.as_number()?, precision))),
        UnaryOp::Plus => Ok(Value::Number(number::round(&operand.as_number()?, precision))),
        UnaryOp::Not => Ok(Value::Logic(!operand.as_logic()?)),
    }
}

/// Equality after coercing the right operand to the left's variant.
/// A failed coercion makes the values unequal.
pub fn equals(left: &Value, right: &Value) -> bool {
    right
        .coerce(left.value_type())
        .is_ok_and(|right| right == *left)
}

/// Ordering after coercing the right operand to the left's variant.
pub fn compare(left: &Value, right: &Value) -> Result<Ordering, EvalError> {
    let right = right.coerce(left.value_type())?;
    let ordering = match (left, &right) {
        (Value::Text(a), Value::Text(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => a.cmp(b),
        (Value::Logic(a), Value::Logic(b)) => a.cmp(b),
        (Value::Date(a), Value::Date(b)) => a.cmp(b),
        _ => return Err(ConversionError::new(right.to_text(), left.value_type().name()).into()),
    };
    Ok(ordering)
}

fn numeric(
    left: &Value,
    right: &Value,
    apply: impl FnOnce(&BigDecimal, &BigDecimal) -> Result<BigDecimal, EvalError>,
) -> Result<Value, EvalError> {
    Ok(Value::Number(apply(&left.as_number()?, &right.as_number()?)?))
}

fn add(left: &Value, right: &Value, precision: u32) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Date(_), Value::Date(_)) => Err(EvalError::arithmetic("cannot add two dates")),
        (Value::Date(date), offset) | (offset, Value::Date(date)) => {
            shift(date, &offset.as_number()?).map(Value::Date)
        }
        _ => numeric(left, right, |a, b| number::add(a, b, precision)),
    }
}

fn sub(left: &Value, right: &Value, precision: u32) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Date(a), Value::Date(b)) => {
            Ok(Value::Number(number::sub(&epoch_seconds(a), &epoch_seconds(b), precision)?))
        }
        (Value::Date(date), offset) => shift(date, &-(offset.as_number()?)).map(Value::Date),
        _ => numeric(left, right, |a, b| number::sub(a, b, precision)),
    }
}

/// Move a date by a number of seconds, keeping its offset.
fn shift(date: &DateTime<FixedOffset>, seconds: &BigDecimal) -> Result<DateTime<FixedOffset>, EvalError> {
    let moved = epoch_seconds(date) + seconds;
    from_epoch_seconds(&moved)
        .map(|d| d.with_timezone(date.offset()))
        .ok_or_else(|| EvalError::arithmetic("date out of range"))
}
