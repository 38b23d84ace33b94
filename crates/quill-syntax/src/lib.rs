//! AST definitions for Quill.
//!
//! A compiled template is a single [`Expr`]: either one computed
//! sub-expression, or a [`ExprKind::Sequence`] of literal text, symbol
//! references and sub-expressions.

mod expr;

pub use expr::*;
