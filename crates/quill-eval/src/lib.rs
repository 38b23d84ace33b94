//! Runtime for Quill templates.
//!
//! A [`Context`] holds settings and registered host functions. Compiling
//! source against it yields a [`CompiledExpression`], which evaluates to a
//! [`Value`] against any [`Resolver`] of named symbols.

mod binder;
mod compiled;
mod context;
mod error;
mod eval;
pub mod logging;
pub mod number;
mod ops;
mod registry;
mod resolver;
mod resources;
mod value;

pub use binder::{Arg, Args, Thunk};
pub use compiled::CompiledExpression;
pub use context::{Context, ContextBuilder, ContextConfig};
pub use error::{CompileError, ConversionError, EvalError, HostError, RegistrationError};
pub use eval::Evaluator;
pub use logging::{LOG_TARGET, LogConfig};
pub use ops::{compare, equals};
pub use registry::{Function, FunctionDef, FunctionUnit, HostFn, Param, ParamRole, ParamType, Registry, UnitId};
pub use resolver::{Resolver, ResolverBuilder, Scope, ScopeSource, SymbolCallback};
pub use resources::{ContextId, ResourceCache, Resources};
pub use value::{Value, ValueType};
