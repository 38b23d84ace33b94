//! Error codes for Quill diagnostics.

/// Error codes for categorizing compile-time diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Lexer errors (Q0001 - Q0099)
    UnexpectedCharacter,
    UnterminatedString,
    UnterminatedInterpolation,
    InvalidEscape,
    InvalidNumber,
    InvalidDate,

    // Parser errors (Q0100 - Q0199)
    UnexpectedToken,
    ExpectedExpression,
    ExpectedIdentifier,
    UnclosedDelimiter,
    NestingTooDeep,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            // Lexer
            ErrorCode::UnexpectedCharacter => "Q0001",
            ErrorCode::UnterminatedString => "Q0002",
            ErrorCode::UnterminatedInterpolation => "Q0003",
            ErrorCode::InvalidEscape => "Q0004",
            ErrorCode::InvalidNumber => "Q0005",
            ErrorCode::InvalidDate => "Q0006",

            // Parser
            ErrorCode::UnexpectedToken => "Q0100",
            ErrorCode::ExpectedExpression => "Q0101",
            ErrorCode::ExpectedIdentifier => "Q0102",
            ErrorCode::UnclosedDelimiter => "Q0103",
            ErrorCode::NestingTooDeep => "Q0104",
        }
    }

    /// Get a human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::UnexpectedCharacter => "unexpected character in expression",
            ErrorCode::UnterminatedString => "text literal is not terminated",
            ErrorCode::UnterminatedInterpolation => "interpolation is not closed",
            ErrorCode::InvalidEscape => "invalid escape sequence in text literal",
            ErrorCode::InvalidNumber => "invalid number literal",
            ErrorCode::InvalidDate => "invalid date literal",

            ErrorCode::UnexpectedToken => "unexpected token",
            ErrorCode::ExpectedExpression => "expected an expression",
            ErrorCode::ExpectedIdentifier => "expected a symbol or function name",
            ErrorCode::UnclosedDelimiter => "unclosed delimiter",
            ErrorCode::NestingTooDeep => "expression is nested too deeply",
        }
    }

    /// Get a suggested fix for the error, if available.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            ErrorCode::UnterminatedString => Some("add the closing quote"),
            ErrorCode::UnterminatedInterpolation => {
                Some("close `${` with `}` and `$(` with `)`, or write `$$` for a literal `$`")
            }
            ErrorCode::UnclosedDelimiter => Some("add the matching closing parenthesis"),
            ErrorCode::InvalidDate => Some("dates are written `@2024-01-31` or `@2024-01-31T08:00:00Z`"),
            _ => None,
        }
    }
}
