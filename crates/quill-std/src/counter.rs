//! Named counters kept in the per-context resource cache.

use std::collections::HashMap;
use std::sync::Mutex;

use quill_eval::{FunctionDef, FunctionUnit, HostError, Param, Value};

type Counters = Mutex<HashMap<String, i64>>;

pub struct CounterUnit;

impl FunctionUnit for CounterUnit {
    fn name(&self) -> &str {
        "counter"
    }

    fn functions(&self) -> Vec<FunctionDef> {
        vec![
            // Increments on every call; shared by all evaluations in a context.
            FunctionDef::new("counter", |args| {
                let name = args.text(0)?;
                let counters = args.resources()?.get_or_init(Counters::default)?;
                let mut counters = counters
                    .lock()
                    .map_err(|_| HostError::failed("counter state is poisoned"))?;
                let count = counters.entry(name.to_string()).or_insert(0);
                *count += 1;
                Ok(Value::from(*count))
            })
            .param(Param::text("name"))
            .param(Param::resources("resources")),
        ]
    }
}
