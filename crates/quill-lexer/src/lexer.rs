//! The Quill lexer.
//! Quill 词法分析器。

use crate::literal;
use crate::token::{Token, TokenKind};
use quill_common::Span;
use quill_diagnostic::{Diagnostic, DiagnosticKind, ErrorCode, Label};

/// Mode for the lexer state machine.
/// 词法分析器状态机的模式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexerMode {
    /// Literal text. In a default template, `depth` counts unbalanced `{`
    /// so that only the matching `}` closes the symbol reference.
    Template { default: bool, depth: u32 },
    /// Inside `${ ... }`, before the default separator.
    /// 在符号引用 `${ ... }` 内部，默认值分隔符之前。
    Symbol { start: usize },
    /// Inside `$( ... )`, counting parenthesis depth.
    /// 在表达式 `$( ... )` 内部，计算圆括号深度。
    Expression { start: usize, depth: u32 },
}

/// The Quill lexer.
/// Quill 词法分析器。
///
/// Converts template source into a sequence of tokens.
/// 将模板源码转换为 token 序列。
pub struct Lexer<'src> {
    chars: std::iter::Peekable<std::str::CharIndices<'src>>,
    /// Byte offset of the next character
    pos: usize,
    diagnostics: Vec<Diagnostic>,
    /// Nested contexts; the bottom entry is always the top-level template
    mode_stack: Vec<LexerMode>,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given template source.
    /// 为给定的模板源码创建新的词法分析器。
    pub fn new(source: &'src str) -> Self {
        Self {
            chars: source.char_indices().peekable(),
            pos: 0,
            diagnostics: Vec::new(),
            mode_stack: vec![LexerMode::Template {
                default: false,
                depth: 0,
            }],
        }
    }

    fn current_mode(&self) -> LexerMode {
        *self.mode_stack.last().unwrap_or(&LexerMode::Template {
            default: false,
            depth: 0,
        })
    }

    fn push_mode(&mut self, mode: LexerMode) {
        self.mode_stack.push(mode);
    }

    fn pop_mode(&mut self) {
        if self.mode_stack.len() > 1 {
            self.mode_stack.pop();
        }
    }

    /// Overwrite the innermost mode (used to update depth counters).
    fn replace_mode(&mut self, mode: LexerMode) {
        if let Some(top) = self.mode_stack.last_mut() {
            *top = mode;
        }
    }

    /// Tokenize the entire source and return tokens and diagnostics.
    /// 对整个源码进行词法分析，返回 token 和诊断信息。
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        (tokens, self.diagnostics)
    }

    fn next_token(&mut self) -> Token {
        match self.current_mode() {
            LexerMode::Template { default, depth } => self.template_part(default, depth),
            LexerMode::Symbol { .. } => self.symbol_token(),
            LexerMode::Expression { start, depth } => {
                let token = self.expression_token();
                match token.kind {
                    TokenKind::LParen => {
                        self.replace_mode(LexerMode::Expression {
                            start,
                            depth: depth + 1,
                        });
                    }
                    TokenKind::RParen => {
                        if depth == 0 {
                            self.pop_mode();
                            return Token::new(TokenKind::InterpolationEnd, token.span);
                        }
                        self.replace_mode(LexerMode::Expression {
                            start,
                            depth: depth - 1,
                        });
                    }
                    _ => {}
                }
                token
            }
        }
    }

    /// Scan literal text up to the next interpolation, the end of a default
    /// template, or the end of input.
    fn template_part(&mut self, default: bool, mut depth: u32) -> Token {
        let start = self.pos;
        let mut value = String::new();

        loop {
            match self.peek_char() {
                None => {
                    if !value.is_empty() {
                        return Token::new(TokenKind::Text(value), Span::from_usize(start, self.pos));
                    }
                    return self.end_of_input();
                }
                Some('$') => match self.peek_nth(1) {
                    Some('$') => {
                        // `$$` escapes a single `$`
                        self.advance();
                        self.advance();
                        value.push('$');
                    }
                    Some(open @ ('{' | '(')) => {
                        if !value.is_empty() {
                            self.replace_mode(LexerMode::Template { default, depth });
                            return Token::new(TokenKind::Text(value), Span::from_usize(start, self.pos));
                        }
                        self.replace_mode(LexerMode::Template { default, depth });
                        return self.open_interpolation(open);
                    }
                    _ => {
                        self.advance();
                        value.push('$');
                    }
                },
                Some('{') if default => {
                    self.advance();
                    depth += 1;
                    value.push('{');
                }
                Some('}') if default => {
                    if depth > 0 {
                        self.advance();
                        depth -= 1;
                        value.push('}');
                        continue;
                    }
                    if !value.is_empty() {
                        self.replace_mode(LexerMode::Template { default, depth });
                        return Token::new(TokenKind::Text(value), Span::from_usize(start, self.pos));
                    }
                    // The `}` closes both the default template and its symbol reference.
                    let brace = self.pos;
                    self.advance();
                    self.pop_mode();
                    self.pop_mode();
                    return Token::new(TokenKind::InterpolationEnd, Span::from_usize(brace, self.pos));
                }
                Some(ch) => {
                    self.advance();
                    value.push(ch);
                }
            }
        }
    }

    /// Consume `$` plus `{` or `(` and enter the matching mode.
    fn open_interpolation(&mut self, open: char) -> Token {
        let start = self.pos;
        self.advance();
        self.advance();
        let kind = if open == '{' {
            self.push_mode(LexerMode::Symbol { start });
            TokenKind::SymbolStart
        } else {
            self.push_mode(LexerMode::Expression { start, depth: 0 });
            TokenKind::ExprStart
        };
        Token::new(kind, Span::from_usize(start, self.pos))
    }

    /// Produce `Eof`, reporting any interpolation still open.
    fn end_of_input(&mut self) -> Token {
        let opened_at = self.mode_stack.iter().find_map(|mode| match mode {
            LexerMode::Symbol { start } | LexerMode::Expression { start, .. } => Some(*start),
            LexerMode::Template { .. } => None,
        });

        if let Some(open) = opened_at {
            let span = Span::from_usize(open, self.pos);
            self.diagnostics.push(
                Diagnostic::error(DiagnosticKind::Lexer, span, "unterminated interpolation")
                    .with_code(ErrorCode::UnterminatedInterpolation)
                    .with_label(Label::new(Span::from_usize(open, open + 2), "opened here")),
            );
            self.mode_stack.truncate(1);
        }

        Token::new(TokenKind::Eof, Span::point(self.pos))
    }

    /// Next token inside `${ ... }`: a name, a scope qualifier, the default
    /// separator or the closing brace.
    fn symbol_token(&mut self) -> Token {
        self.skip_whitespace();
        let start = self.pos;

        let Some((_, ch)) = self.advance() else {
            return self.end_of_input();
        };

        let kind = match ch {
            '}' => {
                self.pop_mode();
                TokenKind::InterpolationEnd
            }
            ':' => TokenKind::Colon,
            '-' => {
                self.push_mode(LexerMode::Template {
                    default: true,
                    depth: 0,
                });
                TokenKind::DefaultStart
            }
            c if Self::is_name_char(c) => {
                let mut name = String::from(c);
                while let Some(next) = self.peek_char() {
                    if !Self::is_name_char(next) {
                        break;
                    }
                    name.push(next);
                    self.advance();
                }
                TokenKind::Ident(name)
            }
            _ => {
                self.error_unexpected_char(ch, start);
                TokenKind::Error
            }
        };

        Token::new(kind, Span::from_usize(start, self.pos))
    }

    /// Next token inside `$( ... )`.
    fn expression_token(&mut self) -> Token {
        self.skip_whitespace();
        let start = self.pos;

        let Some((_, ch)) = self.advance() else {
            return self.end_of_input();
        };

        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '^' => TokenKind::Caret,
            '-' => TokenKind::Minus,

            '+' => {
                if self.peek_char() == Some('+') {
                    self.advance();
                    TokenKind::PlusPlus
                } else {
                    TokenKind::Plus
                }
            }

            '=' => {
                if self.peek_char() == Some('=') {
                    self.advance();
                    TokenKind::EqEq
                } else {
                    self.error_unexpected_char(ch, start);
                    TokenKind::Error
                }
            }

            '!' => {
                if self.peek_char() == Some('=') {
                    self.advance();
                    TokenKind::BangEq
                } else {
                    TokenKind::Bang
                }
            }

            '<' => {
                if self.peek_char() == Some('=') {
                    self.advance();
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }

            '>' => {
                if self.peek_char() == Some('=') {
                    self.advance();
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }

            '&' => {
                if self.peek_char() == Some('&') {
                    self.advance();
                    TokenKind::AndAnd
                } else {
                    self.error_unexpected_char(ch, start);
                    TokenKind::Error
                }
            }

            '|' => {
                if self.peek_char() == Some('|') {
                    self.advance();
                    TokenKind::OrOr
                } else {
                    self.error_unexpected_char(ch, start);
                    TokenKind::Error
                }
            }

            // Nested interpolation
            '$' => match self.peek_char() {
                Some('{') => {
                    self.advance();
                    self.push_mode(LexerMode::Symbol { start });
                    TokenKind::SymbolStart
                }
                Some('(') => {
                    self.advance();
                    self.push_mode(LexerMode::Expression { start, depth: 0 });
                    TokenKind::ExprStart
                }
                _ => {
                    self.error_unexpected_char(ch, start);
                    TokenKind::Error
                }
            },

            '\'' | '"' => self.string_literal(ch, start),

            '@' => self.date_literal(start),

            '0'..='9' => self.number(ch, start),

            'a'..='z' | 'A'..='Z' | '_' => self.identifier(ch),

            _ => {
                self.error_unexpected_char(ch, start);
                TokenKind::Error
            }
        };

        Token::new(kind, Span::from_usize(start, self.pos))
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let result = self.chars.next();
        if let Some((pos, ch)) = result {
            self.pos = pos + ch.len_utf8();
        }
        result
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.chars.clone().nth(n).map(|(_, ch)| ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Quoted text. Bracket characters inside the quotes are plain text.
    /// 引号文本，其中的括号字符不计入深度。
    fn string_literal(&mut self, quote: char, start: usize) -> TokenKind {
        let mut value = String::new();

        loop {
            match self.advance() {
                Some((_, ch)) if ch == quote => break,
                Some((_, '\\')) => {
                    if let Some(escaped) = self.escape_char() {
                        value.push(escaped);
                    }
                }
                Some((_, ch)) => value.push(ch),
                None => {
                    let span = Span::from_usize(start, self.pos);
                    self.diagnostics.push(
                        Diagnostic::error(DiagnosticKind::Lexer, span, "unterminated text literal")
                            .with_code(ErrorCode::UnterminatedString)
                            .with_label(Label::new(Span::from_usize(start, start + 1), "opened here")),
                    );
                    return TokenKind::Error;
                }
            }
        }

        TokenKind::Str(value)
    }

    fn escape_char(&mut self) -> Option<char> {
        match self.advance() {
            Some((_, 'n')) => Some('\n'),
            Some((_, 'r')) => Some('\r'),
            Some((_, 't')) => Some('\t'),
            Some((_, '\\')) => Some('\\'),
            Some((_, '"')) => Some('"'),
            Some((_, '\'')) => Some('\''),
            Some((_, '$')) => Some('$'),
            Some((pos, ch)) => {
                let span = Span::from_usize(pos, self.pos);
                self.diagnostics.push(
                    Diagnostic::error(
                        DiagnosticKind::Lexer,
                        span,
                        format!("invalid escape sequence: \\{}", ch),
                    )
                    .with_code(ErrorCode::InvalidEscape),
                );
                None
            }
            None => None,
        }
    }

    /// `@` followed by an ISO-8601 date or date-time.
    fn date_literal(&mut self, start: usize) -> TokenKind {
        let mut text = String::new();
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | ':' | '+' | '.') {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match literal::parse_date(&text) {
            Some(date) => TokenKind::Date(date),
            None => {
                let span = Span::from_usize(start, self.pos);
                self.diagnostics.push(
                    Diagnostic::error(
                        DiagnosticKind::Lexer,
                        span,
                        format!("invalid date literal: @{}", text),
                    )
                    .with_code(ErrorCode::InvalidDate)
                    .with_label(Label::new(span, "not an ISO-8601 date")),
                );
                TokenKind::Error
            }
        }
    }

    /// Decimal number literal: digits, optional fraction, optional exponent.
    fn number(&mut self, first: char, start: usize) -> TokenKind {
        let mut text = String::from(first);
        self.take_digits(&mut text);

        // A fraction needs a digit after the dot
        if self.peek_char() == Some('.') && self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            text.push('.');
            self.take_digits(&mut text);
        }

        if let Some(e @ ('e' | 'E')) = self.peek_char() {
            let signed = matches!(self.peek_nth(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_nth(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
                text.push(e);
                if signed {
                    if let Some((_, sign)) = self.advance() {
                        text.push(sign);
                    }
                }
                self.take_digits(&mut text);
            }
        }

        match literal::parse_number(&text) {
            Some(value) => TokenKind::Number(value),
            None => {
                let span = Span::from_usize(start, self.pos);
                self.diagnostics.push(
                    Diagnostic::error(
                        DiagnosticKind::Lexer,
                        span,
                        format!("invalid number literal: {}", text),
                    )
                    .with_code(ErrorCode::InvalidNumber),
                );
                TokenKind::Error
            }
        }
    }

    fn take_digits(&mut self, into: &mut String) {
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_digit() {
                into.push(ch);
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Identifier, keyword, or dotted function name such as `math.max`.
    fn identifier(&mut self, first: char) -> TokenKind {
        let mut value = String::from(first);

        while let Some(ch) = self.peek_char() {
            if ch.is_alphanumeric() || ch == '_' || ch == '.' {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        TokenKind::keyword_from_str(&value).unwrap_or(TokenKind::Ident(value))
    }

    fn is_name_char(ch: char) -> bool {
        ch.is_alphanumeric() || ch == '_' || ch == '.'
    }

    fn error_unexpected_char(&mut self, ch: char, pos: usize) {
        let span = Span::from_usize(pos, self.pos);
        self.diagnostics.push(
            Diagnostic::error(
                DiagnosticKind::Lexer,
                span,
                format!("unexpected character: '{}'", ch),
            )
            .with_code(ErrorCode::UnexpectedCharacter)
            .with_label(Label::new(span, "unexpected character here")),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, diagnostics) = Lexer::new(source).tokenize();
        assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
        tokens.into_iter().map(|t| t.kind).collect()
    }

    fn text(s: &str) -> TokenKind {
        TokenKind::Text(s.to_string())
    }

    fn ident(s: &str) -> TokenKind {
        TokenKind::Ident(s.to_string())
    }

    #[test]
    fn plain_text_is_one_run() {
        assert_eq!(kinds("/path/to/my.file"), vec![text("/path/to/my.file"), TokenKind::Eof]);
    }

    #[test]
    fn dollar_escape_and_lone_dollar() {
        assert_eq!(kinds("cost $$5 or $ 6"), vec![text("cost $5 or $ 6"), TokenKind::Eof]);
    }

    #[test]
    fn symbol_with_default() {
        assert_eq!(
            kinds("a${name-42}b"),
            vec![
                text("a"),
                TokenKind::SymbolStart,
                ident("name"),
                TokenKind::DefaultStart,
                text("42"),
                TokenKind::InterpolationEnd,
                text("b"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn default_keeps_balanced_braces() {
        assert_eq!(
            kinds("${x-{a}}"),
            vec![
                TokenKind::SymbolStart,
                ident("x"),
                TokenKind::DefaultStart,
                text("{a}"),
                TokenKind::InterpolationEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn expression_paren_depth() {
        assert_eq!(
            kinds("$( (1) )!"),
            vec![
                TokenKind::ExprStart,
                TokenKind::LParen,
                TokenKind::Number(1.into()),
                TokenKind::RParen,
                TokenKind::InterpolationEnd,
                text("!"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn quotes_hide_brackets() {
        assert_eq!(
            kinds("$( ')' ++ \"(\" )"),
            vec![
                TokenKind::ExprStart,
                TokenKind::Str(")".to_string()),
                TokenKind::PlusPlus,
                TokenKind::Str("(".to_string()),
                TokenKind::InterpolationEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn nested_interpolation_in_default() {
        assert_eq!(
            kinds("${a-$( f(1) )}"),
            vec![
                TokenKind::SymbolStart,
                ident("a"),
                TokenKind::DefaultStart,
                TokenKind::ExprStart,
                ident("f"),
                TokenKind::LParen,
                TokenKind::Number(1.into()),
                TokenKind::RParen,
                TokenKind::InterpolationEnd,
                TokenKind::InterpolationEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn scope_qualifier() {
        assert_eq!(
            kinds("${env:HOME}"),
            vec![
                TokenKind::SymbolStart,
                ident("env"),
                TokenKind::Colon,
                ident("HOME"),
                TokenKind::InterpolationEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keywords_and_operators() {
        assert_eq!(
            kinds("$(not a and b >= 2 || c != d)"),
            vec![
                TokenKind::ExprStart,
                TokenKind::Not,
                ident("a"),
                TokenKind::And,
                ident("b"),
                TokenKind::GtEq,
                TokenKind::Number(2.into()),
                TokenKind::OrOr,
                ident("c"),
                TokenKind::BangEq,
                ident("d"),
                TokenKind::InterpolationEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn date_literal() {
        let tokens = kinds("$(@2024-02-29T12:00:00Z)");
        match &tokens[1] {
            TokenKind::Date(date) => assert_eq!(date.timestamp(), 1_709_208_000),
            other => panic!("expected date, got {other:?}"),
        }
    }

    #[test]
    fn unterminated_interpolation_is_reported() {
        let (tokens, diagnostics) = Lexer::new("hello ${name").tokenize();
        assert_eq!(tokens.last().map(|t| &t.kind), Some(&TokenKind::Eof));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, Some(ErrorCode::UnterminatedInterpolation));
        assert_eq!(diagnostics[0].span.offset(), 6);
    }

    #[test]
    fn unterminated_string_is_reported() {
        let (_, diagnostics) = Lexer::new("$( 'abc )").tokenize();
        assert!(diagnostics.iter().any(|d| d.code == Some(ErrorCode::UnterminatedString)));
    }

    #[test]
    fn spans_are_byte_offsets() {
        let (tokens, _) = Lexer::new("ab$(x)").tokenize();
        assert_eq!(tokens[0].span.range(), 0..2);
        assert_eq!(tokens[1].span.range(), 2..4);
        assert_eq!(tokens[2].span.range(), 4..5);
        assert_eq!(tokens[3].span.range(), 5..6);
    }
}
