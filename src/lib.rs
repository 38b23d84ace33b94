//! Quill: an embeddable text-template expression language.
//!
//! Templates mix literal text with `${name}` symbol references (optionally
//! `${name-default}`) and `$( expr )` computed sub-expressions:
//!
//! ```
//! use quill::{Resolver, Value};
//!
//! let compiled = quill::compile("Hello ${user-world}, $(1 + 2) new messages").unwrap();
//! let resolver = Resolver::from_map([("user", "Ada")]);
//! assert_eq!(
//!     compiled.evaluate(&resolver).unwrap(),
//!     Value::text("Hello Ada, 3 new messages")
//! );
//! ```

pub use quill_eval::*;
pub use quill_std::{CounterUnit, DateUnit, IoUnit, LogicUnit, MathUnit, STANDARD_UNITS, TextUnit, register_standard};

/// A builder with every standard unit registered.
pub fn standard_builder() -> ContextBuilder {
    let mut builder = Context::builder();
    if let Err(err) = register_standard(&mut builder) {
        // The standard units never collide on a fresh builder.
        tracing::error!(target: LOG_TARGET, error = %err, "standard units failed to register");
    }
    builder
}

/// A context with default settings and every standard unit registered.
pub fn standard_context() -> Context {
    standard_builder().build()
}

/// Compile `source` against a fresh standard context.
pub fn compile(source: &str) -> Result<CompiledExpression, CompileError> {
    standard_context().compile(source)
}
