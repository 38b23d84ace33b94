//! Runtime values and the coercion table between them.
//! 运行时值及其之间的类型转换表。

use std::fmt;
use std::sync::Arc;

use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{DateTime, FixedOffset, SecondsFormat};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use quill_lexer::literal::{parse_date, parse_number};

use crate::ConversionError;
use crate::number;

/// The variant of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Text,
    Number,
    Logic,
    Date,
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Text => "text",
            ValueType::Number => "number",
            ValueType::Logic => "logic",
            ValueType::Date => "date",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A runtime value. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(Arc<str>),
    Number(BigDecimal),
    Logic(bool),
    Date(DateTime<FixedOffset>),
}

impl Value {
    pub fn text(text: impl Into<Arc<str>>) -> Self {
        Value::Text(text.into())
    }

    pub fn number(n: impl Into<BigDecimal>) -> Self {
        Value::Number(n.into())
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Text(_) => ValueType::Text,
            Value::Number(_) => ValueType::Number,
            Value::Logic(_) => ValueType::Logic,
            Value::Date(_) => ValueType::Date,
        }
    }

    /// The text representation. Never fails.
    pub fn to_text(&self) -> String {
        match self {
            Value::Text(s) => s.to_string(),
            Value::Number(n) => number::format(n),
            Value::Logic(b) => b.to_string(),
            Value::Date(d) => d.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }

    pub fn as_number(&self) -> Result<BigDecimal, ConversionError> {
        match self {
            Value::Number(n) => Ok(n.clone()),
            Value::Date(d) => Ok(epoch_seconds(d)),
            Value::Text(s) => parse_number(s).ok_or_else(|| self.cannot("number")),
            Value::Logic(_) => Err(self.cannot("number")),
        }
    }

    pub fn as_logic(&self) -> Result<bool, ConversionError> {
        if let Value::Logic(b) = self {
            return Ok(*b);
        }
        let text = self.to_text();
        let text = text.trim();
        if text.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if text.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(self.cannot("logic"))
        }
    }

    pub fn as_date(&self) -> Result<DateTime<FixedOffset>, ConversionError> {
        match self {
            Value::Date(d) => Ok(*d),
            Value::Number(n) => from_epoch_seconds(n).ok_or_else(|| self.cannot("date")),
            Value::Text(s) => parse_date(s).ok_or_else(|| self.cannot("date")),
            Value::Logic(_) => Err(self.cannot("date")),
        }
    }

    /// Narrow to a 32-bit integer; fails on a fraction or overflow.
    pub fn as_int(&self) -> Result<i32, ConversionError> {
        self.as_integer("int")?
            .to_i32()
            .ok_or_else(|| self.cannot("int"))
    }

    /// Narrow to a 64-bit integer; fails on a fraction or overflow.
    pub fn as_long(&self) -> Result<i64, ConversionError> {
        self.as_integer("long")?
            .to_i64()
            .ok_or_else(|| self.cannot("long"))
    }

    fn as_integer(&self, target: &'static str) -> Result<BigInt, ConversionError> {
        let n = self.as_number().map_err(|_| self.cannot(target))?;
        number::to_integer(&n).ok_or_else(|| self.cannot(target))
    }

    /// Convert to another variant following the coercion table.
    pub fn coerce(&self, target: ValueType) -> Result<Value, ConversionError> {
        if self.value_type() == target {
            return Ok(self.clone());
        }
        Ok(match target {
            ValueType::Text => Value::text(self.to_text()),
            ValueType::Number => Value::Number(self.as_number()?),
            ValueType::Logic => Value::Logic(self.as_logic()?),
            ValueType::Date => Value::Date(self.as_date()?),
        })
    }

    fn cannot(&self, target: &'static str) -> ConversionError {
        ConversionError::new(self.to_text(), target)
    }
}

/// Seconds since the Unix epoch, with the sub-second part as a fraction.
pub(crate) fn epoch_seconds(date: &DateTime<FixedOffset>) -> BigDecimal {
    let nanos = BigInt::from(date.timestamp()) * 1_000_000_000u32 + date.timestamp_subsec_nanos();
    BigDecimal::new(nanos, 9).normalized()
}

/// The UTC instant `seconds` after the Unix epoch, rounded to the nanosecond.
pub(crate) fn from_epoch_seconds(seconds: &BigDecimal) -> Option<DateTime<FixedOffset>> {
    if number::checked(seconds.clone()).is_err() {
        return None;
    }
    let (nanos, _) = seconds
        .with_scale_round(9, RoundingMode::HalfUp)
        .into_bigint_and_exponent();
    let billion = BigInt::from(1_000_000_000u32);
    let mut secs = &nanos / &billion;
    let mut subsec = &nanos % &billion;
    if subsec < BigInt::from(0) {
        secs -= 1u32;
        subsec += &billion;
    }
    DateTime::from_timestamp(secs.to_i64()?, subsec.to_u32()?).map(|d| d.fixed_offset())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::text(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Logic(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(BigDecimal::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(BigDecimal::from(n))
    }
}

impl From<BigDecimal> for Value {
    fn from(n: BigDecimal) -> Self {
        Value::Number(n)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(d: DateTime<FixedOffset>) -> Self {
        Value::Date(d)
    }
}
