//! Compiled expressions.

use std::fmt;
use std::sync::Arc;

use quill_syntax::Expr;

use crate::{Context, EvalError, Evaluator, Resolver, Value};

/// A parsed template bound to the context it was compiled with.
///
/// Immutable; any number of threads may evaluate it at once, each with its
/// own resolver.
#[derive(Clone)]
pub struct CompiledExpression {
    ast: Arc<Expr>,
    context: Context,
    source: Arc<str>,
}

impl CompiledExpression {
    pub(crate) fn new(ast: Expr, context: Context, source: &str) -> Self {
        Self {
            ast: Arc::new(ast),
            context,
            source: source.into(),
        }
    }

    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate against `resolver`. Each call starts from scratch.
    pub fn evaluate(&self, resolver: &Resolver) -> Result<Value, EvalError> {
        Evaluator::new(&self.context, resolver).evaluate(&self.ast)
    }

    /// Evaluate and convert the result to text.
    pub fn evaluate_text(&self, resolver: &Resolver) -> Result<String, EvalError> {
        self.evaluate(resolver).map(|value| value.to_text())
    }
}

impl fmt::Debug for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledExpression")
            .field("source", &self.source)
            .field("context", &self.context.id())
            .finish()
    }
}
