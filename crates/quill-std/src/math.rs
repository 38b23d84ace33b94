//! Math functions.
//! 标准库的数学函数。

use bigdecimal::BigDecimal;
use quill_eval::{Arg, FunctionDef, FunctionUnit, HostError, Param, Value, number};

/// Decimal places accepted by `round`, either way.
const MAX_PLACES: i32 = 1_000;

pub struct MathUnit;

impl FunctionUnit for MathUnit {
    fn name(&self) -> &str {
        "math"
    }

    fn functions(&self) -> Vec<FunctionDef> {
        vec![
            // Aggregates / 聚合
            FunctionDef::new("max", |args| {
                extreme(args.function(), args.rest(0)?, |candidate, best| candidate > best)
            })
            .param(Param::number("values").variadic()),
            FunctionDef::new("min", |args| {
                extreme(args.function(), args.rest(0)?, |candidate, best| candidate < best)
            })
            .param(Param::number("values").variadic()),
            FunctionDef::new("sum", |args| {
                let total = args
                    .rest(0)?
                    .iter()
                    .filter_map(Arg::as_number)
                    .fold(BigDecimal::from(0), |acc, n| acc + n);
                Ok(Value::Number(total))
            })
            .param(Param::number("values").variadic()),
            // Single values / 单值运算
            FunctionDef::new("abs", |args| Ok(Value::Number(args.number(0)?.abs())))
                .param(Param::number("x")),
            FunctionDef::new("round", |args| {
                let places = args.int(1)?;
                if !(-MAX_PLACES..=MAX_PLACES).contains(&places) {
                    return Err(HostError::failed(format!(
                        "places must be between -{} and {}",
                        MAX_PLACES, MAX_PLACES
                    )));
                }
                Ok(Value::Number(number::round_places(args.number(0)?, i64::from(places))))
            })
            .param(Param::number("x"))
            .param(Param::int("places").default("0")),
            FunctionDef::new("sqrt", |args| {
                let precision = args.context()?.precision();
                Ok(Value::Number(number::sqrt(args.number(0)?, precision)?))
            })
            .param(Param::number("x"))
            .param(Param::context("context")),
        ]
    }
}

fn extreme(
    function: &str,
    values: &[Arg<'_>],
    better: impl Fn(&BigDecimal, &BigDecimal) -> bool,
) -> Result<Value, HostError> {
    let mut best: Option<&BigDecimal> = None;
    for n in values.iter().filter_map(Arg::as_number) {
        if best.is_none_or(|b| better(n, b)) {
            best = Some(n);
        }
    }
    best.cloned()
        .map(Value::Number)
        .ok_or_else(|| HostError::failed(format!("`{}` needs at least one value", function)))
}
