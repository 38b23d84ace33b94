//! Shared configuration, function registry and resource cache.

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::registry::{FunctionUnit, Registry, UnitId};
use crate::resources::{ContextId, ResourceCache, Resources};
use crate::{CompileError, CompiledExpression, EvalError, HostError, LOG_TARGET, RegistrationError};

/// Context settings. Every field has a default, so partial JSON or TOML
/// documents deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Significant digits kept by every numeric result.
    pub precision: u32,
    /// Wall-clock budget per evaluation in milliseconds; 0 disables it.
    pub timeout_ms: u64,
    /// Longest accepted source, in bytes.
    pub max_source_length: usize,
    /// Most bytes a host function may read through [`Context::read_limited`].
    pub io_quota: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            precision: 16,
            timeout_ms: 10_000,
            max_source_length: 1024,
            io_quota: 1024 * 1024,
        }
    }
}

impl ContextConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// The timeout, or `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

struct ContextInner {
    id: ContextId,
    config: ContextConfig,
    registry: Registry,
    resources: ResourceCache,
}

/// Immutable evaluation environment shared by compiled expressions.
///
/// Cloning is cheap; clones share the registry and the resource cache.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    /// A context with default settings and no functions.
    pub fn new() -> Self {
        ContextBuilder::new().build()
    }

    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    pub fn id(&self) -> ContextId {
        self.inner.id
    }

    pub fn config(&self) -> &ContextConfig {
        &self.inner.config
    }

    pub fn precision(&self) -> u32 {
        self.inner.config.precision
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// The resource accessor for one registered unit.
    pub fn resources(&self, unit: UnitId) -> Resources<'_> {
        self.inner.resources.scoped(unit, self.inner.id)
    }

    /// Compile template source against this context.
    ///
    /// The length check runs before any tokenizing.
    pub fn compile(&self, source: &str) -> Result<CompiledExpression, CompileError> {
        let limit = self.inner.config.max_source_length;
        if source.len() > limit {
            debug!(target: LOG_TARGET, length = source.len(), limit, "source rejected by length");
            return Err(CompileError::SizeLimitExceeded {
                length: source.len(),
                limit,
            });
        }

        let (ast, diagnostics) = quill_parser::parse_template(source);
        if diagnostics.iter().any(|d| d.is_error()) {
            debug!(target: LOG_TARGET, errors = diagnostics.len(), "compile failed");
            return Err(CompileError::Syntax(diagnostics));
        }

        debug!(target: LOG_TARGET, nodes = ast.node_count(), "compiled expression");
        Ok(CompiledExpression::new(ast, self.clone(), source))
    }

    /// Read all of `reader`, failing once more than the I/O quota arrives.
    pub fn read_limited(&self, reader: impl Read) -> Result<Vec<u8>, HostError> {
        let limit = self.inner.config.io_quota;
        let mut buffer = Vec::new();
        reader
            .take(limit as u64 + 1)
            .read_to_end(&mut buffer)
            .map_err(|err| HostError::failed(err.to_string()))?;
        if buffer.len() > limit {
            return Err(EvalError::SizeLimitExceeded { limit }.into());
        }
        Ok(buffer)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.inner.id)
            .field("config", &self.inner.config)
            .field("functions", &self.inner.registry.len())
            .finish()
    }
}

/// Builder for [`Context`].
#[derive(Debug, Default)]
pub struct ContextBuilder {
    config: ContextConfig,
    registry: Registry,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all settings at once.
    pub fn config(mut self, config: ContextConfig) -> Self {
        self.config = config;
        self
    }

    /// Significant digits; values below 1 are raised to 1.
    pub fn precision(mut self, digits: u32) -> Self {
        self.config.precision = digits;
        self
    }

    /// Evaluation time limit; zero disables the check.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = timeout.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }

    pub fn max_source_length(mut self, bytes: usize) -> Self {
        self.config.max_source_length = bytes;
        self
    }

    pub fn io_quota(mut self, bytes: usize) -> Self {
        self.config.io_quota = bytes;
        self
    }

    /// Register a function unit. A failing unit is not registered at all
    /// and the builder stays usable.
    pub fn register<U: FunctionUnit>(&mut self, unit: U) -> Result<UnitId, RegistrationError> {
        self.registry.register(&unit)
    }

    /// Chaining form of [`register`](Self::register).
    pub fn with_unit<U: FunctionUnit>(mut self, unit: U) -> Result<Self, RegistrationError> {
        self.register(unit)?;
        Ok(self)
    }

    pub fn build(self) -> Context {
        let mut config = self.config;
        config.precision = config.precision.max(1);
        let context = Context {
            inner: Arc::new(ContextInner {
                id: ContextId::fresh(),
                config,
                registry: self.registry,
                resources: ResourceCache::new(),
            }),
        };
        debug!(
            target: LOG_TARGET,
            id = ?context.id(),
            functions = context.registry().len(),
            precision = context.precision(),
            "built context"
        );
        context
    }
}
