//! Function units, descriptors and the registry.
//!
//! Host code groups functions into [`FunctionUnit`]s and registers them on a
//! context builder. Registration validates every parameter list and parses
//! declared defaults once, so call sites never re-parse them.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::binder::{Arg, Args};
use crate::{HostError, LOG_TARGET, RegistrationError, Value};

/// Signature of a host function body.
pub type HostFn = Arc<dyn Fn(&Args<'_>) -> Result<Value, HostError> + Send + Sync>;

/// A group of functions registered together.
pub trait FunctionUnit: Send + Sync + 'static {
    /// Unique unit name.
    fn name(&self) -> &str;

    /// The functions this unit exposes.
    fn functions(&self) -> Vec<FunctionDef>;
}

/// Identity of a registered unit within its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnitId(pub(crate) u32);

/// Representation a value parameter is converted to before the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Text,
    /// Arbitrary precision decimal.
    Number,
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    Long,
    Logic,
    Date,
    /// The value as computed, unconverted.
    Any,
}

impl ParamType {
    pub fn name(self) -> &'static str {
        match self {
            ParamType::Text => "text",
            ParamType::Number => "number",
            ParamType::Int => "int",
            ParamType::Long => "long",
            ParamType::Logic => "logic",
            ParamType::Date => "date",
            ParamType::Any => "any",
        }
    }

    pub(crate) fn convert(self, value: Value) -> Result<Arg<'static>, crate::ConversionError> {
        Ok(match self {
            ParamType::Text => match value {
                Value::Text(text) => Arg::Text(text),
                other => Arg::Text(other.to_text().into()),
            },
            ParamType::Number => Arg::Number(value.as_number()?),
            ParamType::Int => Arg::Int(value.as_int()?),
            ParamType::Long => Arg::Long(value.as_long()?),
            ParamType::Logic => Arg::Logic(value.as_logic()?),
            ParamType::Date => Arg::Date(value.as_date()?),
            ParamType::Any => Arg::Value(value),
        })
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a parameter receives its argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamRole {
    /// An evaluated call argument converted to the given type.
    Value(ParamType),
    /// The unevaluated argument, as a [`Thunk`](crate::Thunk).
    Lazy,
    /// The active context; takes no call argument.
    Context,
    /// The unit's resource accessor; takes no call argument.
    Resources,
}

impl ParamRole {
    /// Whether the parameter consumes a call-site argument.
    pub fn is_positional(self) -> bool {
        matches!(self, ParamRole::Value(_) | ParamRole::Lazy)
    }
}

/// A declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    name: String,
    role: ParamRole,
    default: Option<String>,
    variadic: bool,
}

impl Param {
    pub fn new(name: impl Into<String>, role: ParamRole) -> Self {
        Self {
            name: name.into(),
            role,
            default: None,
            variadic: false,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ParamRole::Value(ParamType::Text))
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, ParamRole::Value(ParamType::Number))
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, ParamRole::Value(ParamType::Int))
    }

    pub fn long(name: impl Into<String>) -> Self {
        Self::new(name, ParamRole::Value(ParamType::Long))
    }

    pub fn logic(name: impl Into<String>) -> Self {
        Self::new(name, ParamRole::Value(ParamType::Logic))
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, ParamRole::Value(ParamType::Date))
    }

    pub fn any(name: impl Into<String>) -> Self {
        Self::new(name, ParamRole::Value(ParamType::Any))
    }

    pub fn lazy(name: impl Into<String>) -> Self {
        Self::new(name, ParamRole::Lazy)
    }

    pub fn context(name: impl Into<String>) -> Self {
        Self::new(name, ParamRole::Context)
    }

    pub fn resources(name: impl Into<String>) -> Self {
        Self::new(name, ParamRole::Resources)
    }

    /// Literal used when the call site omits this argument.
    pub fn default(mut self, literal: impl Into<String>) -> Self {
        self.default = Some(literal.into());
        self
    }

    /// Collect this and all further call arguments.
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> ParamRole {
        self.role
    }

    pub fn default_literal(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }
}

/// A function as declared by its unit.
#[derive(Clone)]
pub struct FunctionDef {
    name: String,
    params: Vec<Param>,
    body: HostFn,
}

impl FunctionDef {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Args<'_>) -> Result<Value, HostError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            params: Vec::new(),
            body: Arc::new(body),
        }
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for FunctionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDef")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

/// A validated, registered function.
pub struct Function {
    name: String,
    unit: UnitId,
    params: Vec<Param>,
    /// Parsed defaults, indexed like `params`.
    defaults: Vec<Option<Arg<'static>>>,
    body: HostFn,
}

impl Function {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> UnitId {
        self.unit
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub(crate) fn default_arg(&self, index: usize) -> Option<&Arg<'static>> {
        self.defaults.get(index).and_then(Option::as_ref)
    }

    /// Number of call-site arguments accepted without a variadic slot.
    pub fn fixed_arity(&self) -> usize {
        self.params
            .iter()
            .filter(|p| p.role.is_positional() && !p.variadic)
            .count()
    }

    pub fn is_variadic(&self) -> bool {
        self.params.iter().any(|p| p.variadic)
    }

    pub(crate) fn invoke(&self, args: &Args<'_>) -> Result<Value, HostError> {
        (self.body)(args)
    }

    /// A readable signature such as `round(x: number, places: int = "0")`.
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| {
                let ty = match p.role {
                    ParamRole::Value(ty) => ty.name(),
                    ParamRole::Lazy => "lazy",
                    ParamRole::Context => "context",
                    ParamRole::Resources => "resources",
                };
                let mut out = format!("{}: {}", p.name, ty);
                if p.variadic {
                    out.push_str("...");
                }
                if let Some(default) = &p.default {
                    out.push_str(&format!(" = {:?}", default));
                }
                out
            })
            .collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("signature", &self.signature())
            .field("unit", &self.unit)
            .finish()
    }
}

#[derive(Debug, Clone)]
struct UnitEntry {
    id: UnitId,
    name: String,
}

/// All functions known to a context.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    functions: HashMap<String, Arc<Function>>,
    units: Vec<UnitEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every function of `unit`, or none of them.
    pub fn register<U: FunctionUnit + ?Sized>(&mut self, unit: &U) -> Result<UnitId, RegistrationError> {
        let result = self.try_register(unit);
        match &result {
            Ok(id) => debug!(target: LOG_TARGET, unit = unit.name(), id = id.0, "registered function unit"),
            Err(err) => warn!(target: LOG_TARGET, unit = unit.name(), error = %err, "rejected function unit"),
        }
        result
    }

    fn try_register<U: FunctionUnit + ?Sized>(&mut self, unit: &U) -> Result<UnitId, RegistrationError> {
        let unit_name = unit.name().to_string();
        if self.units.iter().any(|u| u.name == unit_name) {
            return Err(RegistrationError::DuplicateUnit { unit: unit_name });
        }

        let id = UnitId(self.units.len() as u32);
        let mut staged: HashMap<String, Arc<Function>> = HashMap::new();
        for def in unit.functions() {
            let function = validate(def, id)?;
            if self.functions.contains_key(&function.name) || staged.contains_key(&function.name) {
                return Err(RegistrationError::DuplicateFunction {
                    name: function.name,
                });
            }
            staged.insert(function.name.clone(), Arc::new(function));
        }

        self.functions.extend(staged);
        self.units.push(UnitEntry { id, name: unit_name });
        Ok(id)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Function>> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Registered functions sorted by name.
    pub fn functions(&self) -> Vec<&Function> {
        let mut functions: Vec<&Function> = self.functions.values().map(Arc::as_ref).collect();
        functions.sort_by(|a, b| a.name.cmp(&b.name));
        functions
    }

    /// Names of registered units in registration order.
    pub fn units(&self) -> impl Iterator<Item = (UnitId, &str)> {
        self.units.iter().map(|u| (u.id, u.name.as_str()))
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

fn validate(def: FunctionDef, unit: UnitId) -> Result<Function, RegistrationError> {
    let FunctionDef { name, params, body } = def;
    if !is_valid_name(&name) {
        return Err(RegistrationError::InvalidName { name });
    }

    let invalid = |param: &Param, message: &str| RegistrationError::BadDefault {
        function: name.clone(),
        param: param.name.clone(),
        message: message.to_string(),
    };

    let mut seen = HashSet::new();
    let mut variadic_seen = false;
    let mut defaults = Vec::with_capacity(params.len());

    for param in &params {
        if !seen.insert(param.name.as_str()) {
            return Err(invalid(param, "parameter name is declared twice"));
        }
        if param.role.is_positional() && variadic_seen {
            return Err(RegistrationError::VariadicNotLast {
                function: name.clone(),
                param: param.name.clone(),
            });
        }
        if param.variadic {
            if !param.role.is_positional() {
                return Err(invalid(param, "injected parameters cannot be variadic"));
            }
            if param.default.is_some() {
                return Err(invalid(param, "variadic parameters take no default"));
            }
            variadic_seen = true;
        }

        let default = match (&param.default, param.role) {
            (None, _) => None,
            (Some(literal), ParamRole::Value(ty)) => Some(
                ty.convert(Value::text(literal.as_str()))
                    .map_err(|err| invalid(param, &err.to_string()))?,
            ),
            (Some(literal), ParamRole::Lazy) => Some(Arg::constant(Value::text(literal.as_str()))),
            (Some(_), ParamRole::Context | ParamRole::Resources) => {
                return Err(invalid(param, "injected parameters take no default"));
            }
        };
        defaults.push(default);
    }

    Ok(Function {
        name,
        unit,
        params,
        defaults,
        body,
    })
}
