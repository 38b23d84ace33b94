//! Tree-walking evaluation.

use std::time::{Duration, Instant};

use quill_syntax::{BinOp, Expr, ExprKind, Ident, SymbolRef};
use tracing::{trace, warn};

use crate::binder::bind;
use crate::{Context, EvalError, HostError, LOG_TARGET, Resolver, Value, number, ops};

/// Evaluates expression trees against one resolver.
///
/// An evaluator lives for a single evaluation; its clock starts when it is
/// created and the context timeout is checked before and after every node.
pub struct Evaluator<'a> {
    context: &'a Context,
    resolver: &'a Resolver,
    started: Instant,
    limit: Option<Duration>,
}

impl<'a> Evaluator<'a> {
    pub fn new(context: &'a Context, resolver: &'a Resolver) -> Self {
        Self {
            context,
            resolver,
            started: Instant::now(),
            limit: context.config().timeout(),
        }
    }

    pub fn context(&self) -> &'a Context {
        self.context
    }

    pub fn resolver(&self) -> &'a Resolver {
        self.resolver
    }

    /// Time since this evaluation began.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Evaluate an expression.
    pub fn evaluate(&self, expr: &Expr) -> Result<Value, EvalError> {
        self.check_time()?;
        let value = self.eval_node(expr)?;
        self.check_time()?;
        Ok(value)
    }

    fn eval_node(&self, expr: &Expr) -> Result<Value, EvalError> {
        let precision = self.context.precision();

        match &expr.kind {
            ExprKind::Text(text) => Ok(Value::text(text.as_str())),
            ExprKind::Number(n) => Ok(Value::Number(number::round(n, precision))),
            ExprKind::Logic(b) => Ok(Value::Logic(*b)),
            ExprKind::Date(d) => Ok(Value::Date(*d)),

            ExprKind::Symbol(symbol) => self.eval_symbol(symbol),

            ExprKind::Call { name, args } => self.eval_call(expr, name, args),

            ExprKind::Unary { op, operand } => {
                let value = self.evaluate(operand)?;
                ops::unary(*op, &value, precision)
            }

            // Short-circuit operators
            ExprKind::Binary {
                op: BinOp::And,
                left,
                right,
            } => {
                if !self.evaluate(left)?.as_logic()? {
                    return Ok(Value::Logic(false));
                }
                Ok(Value::Logic(self.evaluate(right)?.as_logic()?))
            }
            ExprKind::Binary {
                op: BinOp::Or,
                left,
                right,
            } => {
                if self.evaluate(left)?.as_logic()? {
                    return Ok(Value::Logic(true));
                }
                Ok(Value::Logic(self.evaluate(right)?.as_logic()?))
            }

            ExprKind::Binary { op, left, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                ops::binary(*op, &left, &right, precision)
            }

            ExprKind::Sequence(parts) => {
                let mut text = String::new();
                for part in parts {
                    text.push_str(&self.evaluate(part)?.to_text());
                }
                Ok(Value::text(text))
            }
        }
    }

    /// Scopes, then the resolver default, then the reference's own default.
    fn eval_symbol(&self, symbol: &SymbolRef) -> Result<Value, EvalError> {
        let scope = symbol.scope.as_ref().map(|s| s.name.as_str());
        if let Some(value) = self.resolver.lookup(scope, &symbol.name.name) {
            return Ok(value);
        }

        match &symbol.default {
            Some(default) => {
                trace!(target: LOG_TARGET, symbol = %symbol.key(), "evaluating default");
                self.evaluate(default)
            }
            None => Err(EvalError::UnresolvedSymbol { key: symbol.key() }),
        }
    }

    fn eval_call(&self, call: &Expr, name: &Ident, args: &[Expr]) -> Result<Value, EvalError> {
        let function = self
            .context
            .registry()
            .get(&name.name)
            .ok_or_else(|| EvalError::UnknownFunction {
                name: name.name.clone(),
            })?;

        trace!(target: LOG_TARGET, function = %name.name, args = args.len(), "dispatching call");
        let bound = bind(function, args, self)?;

        let result = function.invoke(&bound).map_err(|err| match err {
            HostError::Failed(message) => EvalError::HostFunction {
                function: name.name.clone(),
                offset: call.span.offset(),
                message,
            },
            HostError::Eval(err) => err,
        })?;

        Ok(match result {
            Value::Number(n) => Value::Number(number::round(&n, self.context.precision())),
            other => other,
        })
    }

    fn check_time(&self) -> Result<(), EvalError> {
        let Some(limit) = self.limit else {
            return Ok(());
        };
        let elapsed = self.started.elapsed();
        if elapsed > limit {
            let limit_ms = limit.as_millis().try_into().unwrap_or(u64::MAX);
            warn!(
                target: LOG_TARGET,
                elapsed_ms = elapsed.as_millis() as u64,
                limit_ms,
                "evaluation timed out"
            );
            return Err(EvalError::Timeout { limit_ms });
        }
        Ok(())
    }
}
