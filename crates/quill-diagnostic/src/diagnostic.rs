//! Diagnostic types and builders.

use crate::ErrorCode;
use quill_common::Span;

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// Which compile stage produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Lexer,
    Parser,
}

/// A labeled span within a diagnostic.
#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

impl Label {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

/// A diagnostic message with optional labels, notes, and help.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub code: Option<ErrorCode>,
    pub message: String,
    pub span: Span,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            code: None,
            message: message.into(),
            span,
            labels: vec![],
            notes: vec![],
            help: None,
        }
    }

    /// Attach a code, and its canned suggestion as help when one exists.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        if self.help.is_none() {
            self.help = code.suggestion().map(str::to_owned);
        }
        self
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_brings_its_suggestion() {
        let diag = Diagnostic::error(DiagnosticKind::Lexer, Span::point(3), "open")
            .with_code(ErrorCode::UnterminatedInterpolation);
        assert!(diag.help.as_deref().is_some_and(|h| h.contains("$$")));
        assert!(diag.is_error());
    }

    #[test]
    fn explicit_help_wins() {
        let diag = Diagnostic::error(DiagnosticKind::Parser, Span::point(0), "bad")
            .with_help("try again")
            .with_code(ErrorCode::UnclosedDelimiter);
        assert_eq!(diag.help.as_deref(), Some("try again"));
    }
}
