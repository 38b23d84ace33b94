//! Date functions.

use std::fmt::Write;

use chrono::Utc;
use quill_eval::{FunctionDef, FunctionUnit, HostError, Param, Value};

pub struct DateUnit;

impl FunctionUnit for DateUnit {
    fn name(&self) -> &str {
        "date"
    }

    fn functions(&self) -> Vec<FunctionDef> {
        vec![
            // Not deterministic: every call reads the clock.
            FunctionDef::new("now", |_| Ok(Value::Date(Utc::now().fixed_offset()))),
            FunctionDef::new("date", |args| Ok(Value::Date(args.date(0)?))).param(Param::date("value")),
            FunctionDef::new("format", |args| {
                let date = args.date(0)?;
                let pattern = args.text(1)?;
                let mut out = String::new();
                write!(out, "{}", date.format(pattern))
                    .map_err(|_| HostError::failed(format!("invalid date pattern `{}`", pattern)))?;
                Ok(Value::text(out))
            })
            .param(Param::date("date"))
            .param(Param::text("pattern").default("%Y-%m-%d")),
            FunctionDef::new("epoch", |args| Ok(Value::Number(Value::Date(args.date(0)?).as_number()?)))
                .param(Param::date("date")),
        ]
    }
}
