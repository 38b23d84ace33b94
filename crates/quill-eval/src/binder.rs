//! Binding call-site arguments to declared parameters.

use std::fmt;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset};
use quill_syntax::Expr;

use crate::registry::{Function, ParamRole, ParamType};
use crate::{Context, EvalError, Evaluator, HostError, Resources, Value};

/// A deferred argument. Every call to [`Thunk::evaluate`] evaluates the
/// argument again; nothing is memoized.
#[derive(Clone)]
pub struct Thunk<'a> {
    inner: ThunkInner<'a>,
}

#[derive(Clone)]
enum ThunkInner<'a> {
    Expr {
        expr: &'a Expr,
        evaluator: &'a Evaluator<'a>,
    },
    Constant(Value),
}

impl<'a> Thunk<'a> {
    pub(crate) fn new(expr: &'a Expr, evaluator: &'a Evaluator<'a>) -> Self {
        Thunk {
            inner: ThunkInner::Expr { expr, evaluator },
        }
    }

    /// A thunk that always yields `value`.
    pub fn constant(value: Value) -> Self {
        Thunk {
            inner: ThunkInner::Constant(value),
        }
    }

    pub fn evaluate(&self) -> Result<Value, EvalError> {
        match &self.inner {
            ThunkInner::Expr { expr, evaluator } => evaluator.evaluate(expr),
            ThunkInner::Constant(value) => Ok(value.clone()),
        }
    }
}

impl fmt::Debug for Thunk<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            ThunkInner::Expr { expr, .. } => f.debug_tuple("Thunk").field(&expr.span).finish(),
            ThunkInner::Constant(value) => f.debug_tuple("Thunk").field(value).finish(),
        }
    }
}

/// One bound argument, in the representation its parameter asked for.
#[derive(Debug, Clone)]
pub enum Arg<'a> {
    Text(Arc<str>),
    Number(BigDecimal),
    Int(i32),
    Long(i64),
    Logic(bool),
    Date(DateTime<FixedOffset>),
    /// An `any` parameter.
    Value(Value),
    /// Everything collected by a variadic parameter.
    Variadic(Vec<Arg<'a>>),
    Lazy(Thunk<'a>),
    Context(&'a Context),
    Resources(Resources<'a>),
}

impl<'a> Arg<'a> {
    pub(crate) fn constant(value: Value) -> Self {
        Arg::Lazy(Thunk::constant(value))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Arg::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&BigDecimal> {
        match self {
            Arg::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Arg::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Arg::Long(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_logic(&self) -> Option<bool> {
        match self {
            Arg::Logic(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            Arg::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_thunk(&self) -> Option<&Thunk<'a>> {
        match self {
            Arg::Lazy(thunk) => Some(thunk),
            _ => None,
        }
    }

    /// Back to a runtime value, for any scalar argument.
    pub fn to_value(&self) -> Option<Value> {
        Some(match self {
            Arg::Text(s) => Value::Text(s.clone()),
            Arg::Number(n) => Value::Number(n.clone()),
            Arg::Int(n) => Value::from(*n),
            Arg::Long(n) => Value::from(*n),
            Arg::Logic(b) => Value::Logic(*b),
            Arg::Date(d) => Value::Date(*d),
            Arg::Value(v) => v.clone(),
            Arg::Variadic(_) | Arg::Lazy(_) | Arg::Context(_) | Arg::Resources(_) => return None,
        })
    }

    fn kind(&self) -> &'static str {
        match self {
            Arg::Text(_) => "text",
            Arg::Number(_) => "number",
            Arg::Int(_) => "int",
            Arg::Long(_) => "long",
            Arg::Logic(_) => "logic",
            Arg::Date(_) => "date",
            Arg::Value(_) => "any",
            Arg::Variadic(_) => "variadic",
            Arg::Lazy(_) => "lazy",
            Arg::Context(_) => "context",
            Arg::Resources(_) => "resources",
        }
    }
}

/// Arguments handed to a host function, indexed by declared parameter
/// position (injected parameters included).
#[derive(Debug)]
pub struct Args<'a> {
    function: &'a str,
    slots: Vec<Arg<'a>>,
}

impl<'a> Args<'a> {
    pub fn new(function: &'a str, slots: Vec<Arg<'a>>) -> Self {
        Self { function, slots }
    }

    /// Name of the function being called.
    pub fn function(&self) -> &str {
        self.function
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&Arg<'a>, HostError> {
        self.slots
            .get(index)
            .ok_or_else(|| HostError::failed(format!("`{}` has no parameter {}", self.function, index)))
    }

    fn typed<'s, T>(
        &'s self,
        index: usize,
        want: &str,
        pick: impl FnOnce(&'s Arg<'a>) -> Option<T>,
    ) -> Result<T, HostError> {
        let arg = self.get(index)?;
        let kind = arg.kind();
        pick(arg).ok_or_else(|| {
            HostError::failed(format!(
                "parameter {} of `{}` is {}, not {}",
                index, self.function, kind, want
            ))
        })
    }

    pub fn text(&self, index: usize) -> Result<&str, HostError> {
        self.typed(index, "text", Arg::as_text)
    }

    pub fn number(&self, index: usize) -> Result<&BigDecimal, HostError> {
        self.typed(index, "number", Arg::as_number)
    }

    pub fn int(&self, index: usize) -> Result<i32, HostError> {
        self.typed(index, "int", Arg::as_int)
    }

    pub fn long(&self, index: usize) -> Result<i64, HostError> {
        self.typed(index, "long", Arg::as_long)
    }

    pub fn logic(&self, index: usize) -> Result<bool, HostError> {
        self.typed(index, "logic", Arg::as_logic)
    }

    pub fn date(&self, index: usize) -> Result<DateTime<FixedOffset>, HostError> {
        self.typed(index, "date", Arg::as_date)
    }

    /// Any scalar argument as a value.
    pub fn value(&self, index: usize) -> Result<Value, HostError> {
        self.typed(index, "a value", Arg::to_value)
    }

    pub fn thunk(&self, index: usize) -> Result<&Thunk<'a>, HostError> {
        self.typed(index, "lazy", Arg::as_thunk)
    }

    /// The arguments gathered by the variadic parameter at `index`.
    pub fn rest(&self, index: usize) -> Result<&[Arg<'a>], HostError> {
        self.typed(index, "variadic", |arg| match arg {
            Arg::Variadic(items) => Some(items.as_slice()),
            _ => None,
        })
    }

    /// The active context, if a context parameter was declared.
    pub fn context(&self) -> Result<&'a Context, HostError> {
        self.slots
            .iter()
            .find_map(|arg| match arg {
                Arg::Context(context) => Some(*context),
                _ => None,
            })
            .ok_or_else(|| HostError::failed(format!("`{}` declares no context parameter", self.function)))
    }

    /// The unit's resources, if a resources parameter was declared.
    pub fn resources(&self) -> Result<Resources<'a>, HostError> {
        self.slots
            .iter()
            .find_map(|arg| match arg {
                Arg::Resources(resources) => Some(*resources),
                _ => None,
            })
            .ok_or_else(|| HostError::failed(format!("`{}` declares no resources parameter", self.function)))
    }
}

/// Match call-site arguments to `function`'s parameters.
///
/// Value arguments are evaluated eagerly, left to right, and converted to
/// their parameter type; lazy ones are wrapped unevaluated.
pub(crate) fn bind<'a>(
    function: &'a Function,
    args: &'a [Expr],
    evaluator: &'a Evaluator<'a>,
) -> Result<Args<'a>, EvalError> {
    let name = function.name();
    let fixed = function.fixed_arity();
    if args.len() > fixed && !function.is_variadic() {
        return Err(EvalError::binding(
            name,
            format!("expected at most {} arguments, got {}", fixed, args.len()),
        ));
    }

    let mut next = args.iter();
    let mut slots = Vec::with_capacity(function.params().len());

    for (index, param) in function.params().iter().enumerate() {
        let slot = match param.role() {
            ParamRole::Context => Arg::Context(evaluator.context()),
            ParamRole::Resources => Arg::Resources(evaluator.context().resources(function.unit())),
            role if param.is_variadic() => {
                let rest = next
                    .by_ref()
                    .map(|arg| bind_one(name, param.name(), role, arg, evaluator))
                    .collect::<Result<Vec<_>, _>>()?;
                Arg::Variadic(rest)
            }
            role => match next.next() {
                Some(arg) => bind_one(name, param.name(), role, arg, evaluator)?,
                None => function.default_arg(index).cloned().ok_or_else(|| {
                    EvalError::binding(name, format!("missing argument `{}`", param.name()))
                })?,
            },
        };
        slots.push(slot);
    }

    Ok(Args::new(name, slots))
}

fn bind_one<'a>(
    function: &str,
    param: &str,
    role: ParamRole,
    arg: &'a Expr,
    evaluator: &'a Evaluator<'a>,
) -> Result<Arg<'a>, EvalError> {
    let ty = match role {
        ParamRole::Lazy => return Ok(Arg::Lazy(Thunk::new(arg, evaluator))),
        ParamRole::Value(ty) => ty,
        ParamRole::Context | ParamRole::Resources => ParamType::Any,
    };
    let value = evaluator.evaluate(arg)?;
    ty.convert(value)
        .map_err(|err| EvalError::binding(function, format!("argument `{}`: {}", param, err)))
}
