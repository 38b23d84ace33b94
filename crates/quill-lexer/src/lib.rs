//! Lexical analysis for Quill.
//! Quill 词法分析模块。
//!
//! The lexer turns template source into a flat token stream. Literal text
//! and interpolations (`${...}`, `$(...)`) are told apart with a mode stack,
//! so interpolations nest to any depth.

mod lexer;
pub mod literal;
mod token;

pub use lexer::Lexer;
pub use token::{Token, TokenKind};
