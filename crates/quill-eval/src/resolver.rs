//! Symbol resolution: an ordered chain of named value sources.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::{LOG_TARGET, Value};

/// A host lookup consulted by name. Must return the same value for the same
/// key every time, since it may be asked more than once per evaluation.
pub type SymbolCallback = Arc<dyn Fn(&str) -> Option<Value> + Send + Sync>;

/// Where a scope gets its values.
#[derive(Clone)]
pub enum ScopeSource {
    /// A fixed map supplied by the host.
    Static(HashMap<String, Value>),
    /// Process environment variables, captured when the scope was added.
    Environment(HashMap<String, Value>),
    /// Host properties, captured when the scope was added.
    Properties(HashMap<String, Value>),
    Callback(SymbolCallback),
}

impl ScopeSource {
    fn lookup(&self, name: &str) -> Option<Value> {
        match self {
            ScopeSource::Static(map) | ScopeSource::Environment(map) | ScopeSource::Properties(map) => {
                map.get(name).cloned()
            }
            ScopeSource::Callback(callback) => callback(name),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ScopeSource::Static(_) => "static",
            ScopeSource::Environment(_) => "environment",
            ScopeSource::Properties(_) => "properties",
            ScopeSource::Callback(_) => "callback",
        }
    }
}

impl fmt::Debug for ScopeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeSource::Static(map) | ScopeSource::Environment(map) | ScopeSource::Properties(map) => f
                .debug_struct(self.kind())
                .field("len", &map.len())
                .finish(),
            ScopeSource::Callback(_) => f.write_str("callback"),
        }
    }
}

/// A named value source.
#[derive(Debug, Clone)]
pub struct Scope {
    pub name: String,
    pub source: ScopeSource,
}

/// Resolves symbol references during evaluation.
///
/// Unqualified names search scopes in the order they were added; a name
/// written `scope:name` only consults scopes called `scope`.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    scopes: Vec<Scope>,
    default: Option<Value>,
}

impl Resolver {
    /// A resolver with no scopes.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::default()
    }

    /// A resolver with one static scope named `default`.
    pub fn from_map<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self::builder().map("default", values).build()
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    /// The value returned for any name no scope knows.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Look a name up in the scopes only, ignoring the resolver default.
    pub fn find(&self, scope: Option<&str>, name: &str) -> Option<Value> {
        let found = self
            .scopes
            .iter()
            .filter(|s| scope.is_none_or(|wanted| s.name == wanted))
            .find_map(|s| s.source.lookup(name).map(|value| (s, value)));

        let (from, value) = found?;
        trace!(target: LOG_TARGET, symbol = name, scope = %from.name, kind = from.source.kind(), "symbol resolved");
        Some(value)
    }

    /// Look a name up in the scopes, then fall back to the resolver default.
    pub fn lookup(&self, scope: Option<&str>, name: &str) -> Option<Value> {
        self.find(scope, name).or_else(|| self.default.clone())
    }
}

/// Builds a [`Resolver`] one scope at a time.
#[derive(Debug, Default)]
pub struct ResolverBuilder {
    scopes: Vec<Scope>,
    default: Option<Value>,
}

impl ResolverBuilder {
    /// Add a scope with an explicit source.
    pub fn scope(mut self, name: impl Into<String>, source: ScopeSource) -> Self {
        self.scopes.push(Scope {
            name: name.into(),
            source,
        });
        self
    }

    /// Add a static map scope.
    pub fn map<K, V>(self, name: impl Into<String>, values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let map = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.scope(name, ScopeSource::Static(map))
    }

    /// Add a snapshot of the process environment.
    pub fn environment(self, name: impl Into<String>) -> Self {
        let map = std::env::vars().map(|(k, v)| (k, Value::text(v))).collect();
        self.scope(name, ScopeSource::Environment(map))
    }

    /// Add a snapshot of host properties; every value is text.
    pub fn properties<K, V>(self, name: impl Into<String>, properties: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: AsRef<str>,
    {
        let map = properties
            .into_iter()
            .map(|(k, v)| (k.into(), Value::text(v.as_ref())))
            .collect();
        self.scope(name, ScopeSource::Properties(map))
    }

    /// Add a scope answered by a host callback.
    pub fn callback(
        self,
        name: impl Into<String>,
        callback: impl Fn(&str) -> Option<Value> + Send + Sync + 'static,
    ) -> Self {
        self.scope(name, ScopeSource::Callback(Arc::new(callback)))
    }

    /// Value for names that no scope knows.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn build(self) -> Resolver {
        Resolver {
            scopes: self.scopes,
            default: self.default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_scope_wins() {
        let resolver = Resolver::builder()
            .map("a", [("x", 1)])
            .map("b", [("x", 2), ("y", 3)])
            .build();
        assert_eq!(resolver.lookup(None, "x"), Some(Value::from(1)));
        assert_eq!(resolver.lookup(None, "y"), Some(Value::from(3)));
    }

    #[test]
    fn qualified_names_route_to_one_scope() {
        let resolver = Resolver::builder()
            .map("a", [("x", 1)])
            .map("b", [("x", 2)])
            .build();
        assert_eq!(resolver.lookup(Some("b"), "x"), Some(Value::from(2)));
        assert_eq!(resolver.lookup(Some("c"), "x"), None);
    }

    #[test]
    fn default_applies_after_scopes() {
        let resolver = Resolver::builder()
            .map("a", [("x", 1)])
            .default_value("fallback")
            .build();
        assert_eq!(resolver.find(None, "missing"), None);
        assert_eq!(resolver.lookup(None, "missing"), Some(Value::text("fallback")));
    }

    #[test]
    fn callback_and_properties() {
        let resolver = Resolver::builder()
            .properties("props", [("app.name", "quill")])
            .callback("upper", |name| Some(Value::text(name.to_uppercase())))
            .build();
        assert_eq!(resolver.lookup(None, "app.name"), Some(Value::text("quill")));
        assert_eq!(resolver.lookup(Some("upper"), "abc"), Some(Value::text("ABC")));
    }
}
