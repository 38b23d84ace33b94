//! Conditional functions over lazy arguments.

use quill_eval::{EvalError, FunctionDef, FunctionUnit, Param, Value};

pub struct LogicUnit;

impl FunctionUnit for LogicUnit {
    fn name(&self) -> &str {
        "logic"
    }

    fn functions(&self) -> Vec<FunctionDef> {
        vec![
            // Only the chosen branch is evaluated.
            FunctionDef::new("if", |args| {
                let branch = if args.logic(0)? { 1 } else { 2 };
                Ok(args.thunk(branch)?.evaluate()?)
            })
            .param(Param::logic("condition"))
            .param(Param::lazy("then"))
            .param(Param::lazy("otherwise").default("")),
            // The first argument unless it is missing or empty.
            FunctionDef::new("default", |args| {
                match args.thunk(0)?.evaluate() {
                    Ok(Value::Text(text)) if text.is_empty() => Ok(args.value(1)?),
                    Ok(value) => Ok(value),
                    Err(EvalError::UnresolvedSymbol { .. } | EvalError::Conversion(_)) => Ok(args.value(1)?),
                    Err(err) => Err(err.into()),
                }
            })
            .param(Param::lazy("value"))
            .param(Param::any("fallback")),
        ]
    }
}
