//! Parser for Quill templates.
//!
//! Turns a token stream into a [`quill_syntax::Expr`] tree. Parsing never
//! stops at the first problem: every diagnostic found in the source is
//! returned alongside a best-effort tree.

mod parser;

pub use parser::{MAX_NESTING, Parser};

use quill_diagnostic::Diagnostic;
use quill_lexer::Lexer;
use quill_syntax::Expr;

/// Lex and parse template source.
pub fn parse_template(source: &str) -> (Expr, Vec<Diagnostic>) {
    let (tokens, mut diagnostics) = Lexer::new(source).tokenize();
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_template();
    diagnostics.extend(parser.diagnostics());
    (expr, diagnostics)
}
