//! Error types for compiling, registering and evaluating.

use quill_diagnostic::Diagnostic;
use thiserror::Error;

/// A value could not be represented as the requested type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert `{value}` to {target}")]
pub struct ConversionError {
    /// Text form of the offending value.
    pub value: String,
    pub target: &'static str,
}

impl ConversionError {
    pub fn new(value: impl Into<String>, target: &'static str) -> Self {
        Self {
            value: value.into(),
            target,
        }
    }
}

/// Errors raised while evaluating a compiled expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("unresolved symbol `{key}`")]
    UnresolvedSymbol { key: String },

    #[error("unknown function `{name}`")]
    UnknownFunction { name: String },

    #[error("cannot call `{function}`: {message}")]
    ArgumentBinding { function: String, message: String },

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    #[error("evaluation exceeded its {limit_ms} ms time limit")]
    Timeout { limit_ms: u64 },

    #[error("input exceeded the {limit} byte I/O quota")]
    SizeLimitExceeded { limit: usize },

    #[error("function `{function}` failed at offset {offset}: {message}")]
    HostFunction {
        function: String,
        offset: usize,
        message: String,
    },
}

impl EvalError {
    pub fn arithmetic(message: impl Into<String>) -> Self {
        EvalError::Arithmetic(message.into())
    }

    pub(crate) fn binding(function: &str, message: impl Into<String>) -> Self {
        EvalError::ArgumentBinding {
            function: function.to_string(),
            message: message.into(),
        }
    }
}

/// What a host function body returns on failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// A failure of the host code itself; reported with call-site context.
    #[error("{0}")]
    Failed(String),

    /// An engine error surfaced inside the body, passed through unchanged.
    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl HostError {
    pub fn failed(message: impl Into<String>) -> Self {
        HostError::Failed(message.into())
    }
}

impl From<ConversionError> for HostError {
    fn from(err: ConversionError) -> Self {
        HostError::Eval(EvalError::Conversion(err))
    }
}

/// Errors raised while registering a function unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("function `{name}` is already registered")]
    DuplicateFunction { name: String },

    #[error("unit `{unit}` is already registered")]
    DuplicateUnit { unit: String },

    #[error("invalid function name `{name}`")]
    InvalidName { name: String },

    #[error("bad default for parameter `{param}` of `{function}`: {message}")]
    BadDefault {
        function: String,
        param: String,
        message: String,
    },

    #[error("variadic parameter `{param}` of `{function}` must be the last value parameter")]
    VariadicNotLast { function: String, param: String },
}

/// Errors raised by `compile`.
#[derive(Debug, Clone, Error)]
pub enum CompileError {
    #[error("source is {length} bytes, over the {limit} byte limit")]
    SizeLimitExceeded { length: usize, limit: usize },

    #[error("syntax error: {}", first_message(.0))]
    Syntax(Vec<Diagnostic>),
}

fn first_message(diagnostics: &[Diagnostic]) -> &str {
    diagnostics
        .first()
        .map(|d| d.message.as_str())
        .unwrap_or("invalid template")
}

impl CompileError {
    /// Syntax diagnostics, empty for a size-limit failure.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CompileError::Syntax(diagnostics) => diagnostics,
            CompileError::SizeLimitExceeded { .. } => &[],
        }
    }

    /// Print every diagnostic to stderr.
    pub fn emit(&self, source: &str, filename: &str) -> std::io::Result<()> {
        for diagnostic in self.diagnostics() {
            quill_diagnostic::emit(source, filename, diagnostic)?;
        }
        Ok(())
    }

    /// Render every diagnostic as plain text.
    pub fn render(&self, source: &str, filename: &str) -> String {
        match self {
            CompileError::SizeLimitExceeded { .. } => self.to_string(),
            CompileError::Syntax(diagnostics) => diagnostics
                .iter()
                .map(|d| quill_diagnostic::render(source, filename, d))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_error_wraps_engine_errors() {
        let err: HostError = ConversionError::new("abc", "number").into();
        assert_eq!(
            err,
            HostError::Eval(EvalError::Conversion(ConversionError::new("abc", "number")))
        );
        assert_eq!(err.to_string(), "cannot convert `abc` to number");
    }

    #[test]
    fn size_limit_message() {
        let err = CompileError::SizeLimitExceeded {
            length: 2048,
            limit: 1024,
        };
        assert!(err.diagnostics().is_empty());
        assert_eq!(err.render("", "inline"), "source is 2048 bytes, over the 1024 byte limit");
    }
}
