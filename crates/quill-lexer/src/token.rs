//! Token definitions for Quill.

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset};
use quill_common::Span;

/// A token with its kind and span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Template level
    /// A run of literal text, escapes already applied
    Text(String),
    /// `${` opening a symbol reference
    SymbolStart,
    /// `$(` opening a computed sub-expression
    ExprStart,
    /// `-` inside `${...}`, the rest up to `}` is the default template
    DefaultStart,
    /// `}` or `)` closing the innermost interpolation
    InterpolationEnd,

    // Literals
    Number(BigDecimal),
    Str(String),
    Date(DateTime<FixedOffset>),

    Ident(String),

    // Keywords
    True,
    False,
    And,
    Or,
    Not,

    // Delimiters
    LParen, // (
    RParen, // )
    Comma,  // ,
    Colon,  // :

    // Operators
    Plus,     // +
    Minus,    // -
    Star,     // *
    Slash,    // /
    Percent,  // %
    Caret,    // ^
    PlusPlus, // ++
    EqEq,     // ==
    BangEq,   // !=
    Lt,       // <
    LtEq,     // <=
    Gt,       // >
    GtEq,     // >=
    AndAnd,   // &&
    OrOr,     // ||
    Bang,     // !

    // Special
    Eof,
    Error,
}

impl TokenKind {
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::True | TokenKind::False | TokenKind::And | TokenKind::Or | TokenKind::Not
        )
    }

    /// Returns the keyword for an identifier, if any.
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        match s {
            "true" => Some(TokenKind::True),
            "false" => Some(TokenKind::False),
            "and" => Some(TokenKind::And),
            "or" => Some(TokenKind::Or),
            "not" => Some(TokenKind::Not),
            _ => None,
        }
    }

    /// Short human-readable name used in parser messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Text(_) => "literal text".to_string(),
            TokenKind::SymbolStart => "`${`".to_string(),
            TokenKind::ExprStart => "`$(`".to_string(),
            TokenKind::DefaultStart => "default separator `-`".to_string(),
            TokenKind::InterpolationEnd => "end of interpolation".to_string(),
            TokenKind::Number(n) => format!("number `{n}`"),
            TokenKind::Str(_) => "text literal".to_string(),
            TokenKind::Date(_) => "date literal".to_string(),
            TokenKind::Ident(name) => format!("identifier `{name}`"),
            TokenKind::True => "`true`".to_string(),
            TokenKind::False => "`false`".to_string(),
            TokenKind::And => "`and`".to_string(),
            TokenKind::Or => "`or`".to_string(),
            TokenKind::Not => "`not`".to_string(),
            TokenKind::LParen => "`(`".to_string(),
            TokenKind::RParen => "`)`".to_string(),
            TokenKind::Comma => "`,`".to_string(),
            TokenKind::Colon => "`:`".to_string(),
            TokenKind::Plus => "`+`".to_string(),
            TokenKind::Minus => "`-`".to_string(),
            TokenKind::Star => "`*`".to_string(),
            TokenKind::Slash => "`/`".to_string(),
            TokenKind::Percent => "`%`".to_string(),
            TokenKind::Caret => "`^`".to_string(),
            TokenKind::PlusPlus => "`++`".to_string(),
            TokenKind::EqEq => "`==`".to_string(),
            TokenKind::BangEq => "`!=`".to_string(),
            TokenKind::Lt => "`<`".to_string(),
            TokenKind::LtEq => "`<=`".to_string(),
            TokenKind::Gt => "`>`".to_string(),
            TokenKind::GtEq => "`>=`".to_string(),
            TokenKind::AndAnd => "`&&`".to_string(),
            TokenKind::OrOr => "`||`".to_string(),
            TokenKind::Bang => "`!`".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Error => "invalid token".to_string(),
        }
    }
}
