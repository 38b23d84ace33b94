//! The Quill parser.

use quill_common::Span;
use quill_diagnostic::{Diagnostic, DiagnosticKind, ErrorCode, Label};
use quill_lexer::{Token, TokenKind, literal};
use quill_syntax::*;

/// Deepest nesting of groups, calls, unary operators, interpolations and
/// chained binary operands the parser accepts before giving up on the source.
pub const MAX_NESTING: usize = 128;

/// The Quill parser.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
    depth: usize,
    /// Set once nesting overflows; parsing stops at end of input.
    abandoned: bool,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            diagnostics: Vec::new(),
            depth: 0,
            abandoned: false,
        }
    }

    pub fn diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Parse a complete template.
    ///
    /// A template made of exactly one `$( ... )` or `${ ... }` is that node,
    /// so its native value type survives evaluation. Anything else is a
    /// sequence.
    pub fn parse_template(&mut self) -> Expr {
        self.parse_template_parts(false)
    }

    fn parse_template_parts(&mut self, in_default: bool) -> Expr {
        let start = self.current_span();
        let mut parts = Vec::new();
        let mut interpolated = Vec::new();

        loop {
            match self.current_kind().clone() {
                TokenKind::Eof => break,
                TokenKind::InterpolationEnd if in_default => break,
                TokenKind::Text(text) => {
                    let span = self.current_span();
                    self.advance();
                    parts.push(Expr::new(ExprKind::Text(text), span));
                    interpolated.push(false);
                }
                TokenKind::SymbolStart => {
                    let symbol = self.nested(Self::parse_symbol);
                    parts.push(symbol);
                    interpolated.push(true);
                }
                TokenKind::ExprStart => {
                    let expr = self.nested(Self::parse_interpolated_expr);
                    parts.push(expr);
                    interpolated.push(true);
                }
                TokenKind::Error => self.advance(),
                other => {
                    self.error(
                        &format!("unexpected {} in template text", other.describe()),
                        ErrorCode::UnexpectedToken,
                    );
                    self.advance();
                }
            }
        }

        if parts.len() == 1 && interpolated[0] {
            return parts.remove(0);
        }
        if in_default && parts.len() == 1 {
            if let Some(kind) = typed_default(&parts[0].kind) {
                return Expr::new(kind, parts[0].span);
            }
        }

        let span = match (parts.first(), parts.last()) {
            (Some(first), Some(last)) => first.span.merge(last.span),
            _ => Span::new(start.start, start.start),
        };
        Expr::new(ExprKind::Sequence(parts), span)
    }

    /// `${ [scope:] name [- default] }`
    fn parse_symbol(&mut self) -> Expr {
        let start = self.current_span();
        self.advance(); // ${

        let Some(first) = self.expect_ident("expected a symbol name after `${`") else {
            self.skip_interpolation();
            return Expr::new(ExprKind::Text(String::new()), start.merge(self.previous_span()));
        };

        let (scope, name) = if self.eat(TokenKind::Colon) {
            match self.expect_ident("expected a symbol name after the scope qualifier") {
                Some(name) => (Some(first), name),
                None => {
                    self.skip_interpolation();
                    return Expr::new(ExprKind::Text(String::new()), start.merge(self.previous_span()));
                }
            }
        } else {
            (None, first)
        };

        let default = if self.eat(TokenKind::DefaultStart) {
            Some(Box::new(self.parse_template_parts(true)))
        } else {
            None
        };

        self.expect_interpolation_end("`}`");
        let span = start.merge(self.previous_span());
        Expr::new(
            ExprKind::Symbol(SymbolRef {
                scope,
                name,
                default,
            }),
            span,
        )
    }

    /// `$( expr )`
    fn parse_interpolated_expr(&mut self) -> Expr {
        let start = self.current_span();
        self.advance(); // $(

        if self.check(TokenKind::InterpolationEnd) {
            self.error("empty `$( )` expression", ErrorCode::ExpectedExpression);
            self.advance();
            return Expr::new(ExprKind::Text(String::new()), start.merge(self.previous_span()));
        }

        let expr = self.parse_expr();
        if !self.check(TokenKind::InterpolationEnd) && !self.at_end() {
            self.error(
                &format!("expected `)`, found {}", self.current_kind().describe()),
                ErrorCode::UnexpectedToken,
            );
            self.skip_interpolation();
            return expr;
        }
        self.expect_interpolation_end("`)`");
        expr
    }

    // ========== Expression Parsing ==========

    fn parse_expr(&mut self) -> Expr {
        self.nested(Self::parse_or_expr)
    }

    fn parse_or_expr(&mut self) -> Expr {
        let mut left = self.parse_and_expr();
        let mut folds = 0;

        while self.eat(TokenKind::OrOr) || self.eat(TokenKind::Or) {
            if !self.deepen(&mut folds) {
                break;
            }
            let right = self.parse_and_expr();
            left = Self::binary(BinOp::Or, left, right);
        }

        self.depth -= folds;
        left
    }

    fn parse_and_expr(&mut self) -> Expr {
        let mut left = self.parse_comparison_expr();
        let mut folds = 0;

        while self.eat(TokenKind::AndAnd) || self.eat(TokenKind::And) {
            if !self.deepen(&mut folds) {
                break;
            }
            let right = self.parse_comparison_expr();
            left = Self::binary(BinOp::And, left, right);
        }

        self.depth -= folds;
        left
    }

    fn parse_comparison_expr(&mut self) -> Expr {
        let mut left = self.parse_concat_expr();
        let mut folds = 0;

        loop {
            let op = match self.current_kind() {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::BangEq => BinOp::Ne,
                TokenKind::Lt => BinOp::Lt,
                TokenKind::LtEq => BinOp::Le,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::GtEq => BinOp::Ge,
                _ => break,
            };
            self.advance();
            if !self.deepen(&mut folds) {
                break;
            }
            let right = self.parse_concat_expr();
            left = Self::binary(op, left, right);
        }

        self.depth -= folds;
        left
    }

    fn parse_concat_expr(&mut self) -> Expr {
        let mut left = self.parse_additive_expr();
        let mut folds = 0;

        while self.eat(TokenKind::PlusPlus) {
            if !self.deepen(&mut folds) {
                break;
            }
            let right = self.parse_additive_expr();
            left = Self::binary(BinOp::Concat, left, right);
        }

        self.depth -= folds;
        left
    }

    fn parse_additive_expr(&mut self) -> Expr {
        let mut left = self.parse_multiplicative_expr();
        let mut folds = 0;

        loop {
            let op = match self.current_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            if !self.deepen(&mut folds) {
                break;
            }
            let right = self.parse_multiplicative_expr();
            left = Self::binary(op, left, right);
        }

        self.depth -= folds;
        left
    }

    fn parse_multiplicative_expr(&mut self) -> Expr {
        let mut left = self.parse_power_expr();
        let mut folds = 0;

        loop {
            let op = match self.current_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Rem,
                _ => break,
            };
            self.advance();
            if !self.deepen(&mut folds) {
                break;
            }
            let right = self.parse_power_expr();
            left = Self::binary(op, left, right);
        }

        self.depth -= folds;
        left
    }

    fn parse_power_expr(&mut self) -> Expr {
        let left = self.parse_unary_expr();

        if self.eat(TokenKind::Caret) {
            let right = self.nested(Self::parse_power_expr); // Right associative
            Self::binary(BinOp::Pow, left, right)
        } else {
            left
        }
    }

    fn parse_unary_expr(&mut self) -> Expr {
        let start = self.current_span();

        let op = match self.current_kind() {
            TokenKind::Bang | TokenKind::Not => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            _ => return self.parse_primary_expr(),
        };
        self.advance();

        let operand = self.nested(Self::parse_unary_expr);
        let span = start.merge(operand.span);
        Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        )
    }

    fn parse_primary_expr(&mut self) -> Expr {
        let start = self.current_span();

        match self.current_kind().clone() {
            TokenKind::Number(n) => {
                self.advance();
                Expr::new(ExprKind::Number(n), start)
            }
            TokenKind::Str(s) => {
                self.advance();
                Expr::new(ExprKind::Text(s), start)
            }
            TokenKind::Date(d) => {
                self.advance();
                Expr::new(ExprKind::Date(d), start)
            }
            TokenKind::True => {
                self.advance();
                Expr::new(ExprKind::Logic(true), start)
            }
            TokenKind::False => {
                self.advance();
                Expr::new(ExprKind::Logic(false), start)
            }
            TokenKind::Ident(name) => {
                self.advance();
                self.parse_name_expr(Ident::new(name, start))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr();
                if !self.eat(TokenKind::RParen) {
                    self.error_with_label(
                        "expected `)` to close the group",
                        ErrorCode::UnclosedDelimiter,
                        Label::new(start, "group opened here"),
                    );
                }
                inner
            }
            TokenKind::SymbolStart => self.nested(Self::parse_symbol),
            TokenKind::ExprStart => self.nested(Self::parse_interpolated_expr),
            TokenKind::Error => {
                self.advance();
                Expr::new(ExprKind::Text(String::new()), start)
            }
            other => {
                self.error(
                    &format!("expected an expression, found {}", other.describe()),
                    ErrorCode::ExpectedExpression,
                );
                if !matches!(
                    other,
                    TokenKind::Eof | TokenKind::InterpolationEnd | TokenKind::RParen | TokenKind::Comma
                ) {
                    self.advance();
                }
                Expr::new(ExprKind::Text(String::new()), start)
            }
        }
    }

    /// After an identifier: a call, a scope-qualified symbol, or a plain symbol.
    fn parse_name_expr(&mut self, first: Ident) -> Expr {
        if self.eat(TokenKind::Colon) {
            let Some(name) = self.expect_ident("expected a symbol name after the scope qualifier") else {
                return Expr::new(ExprKind::Text(String::new()), first.span);
            };
            if self.check(TokenKind::LParen) {
                self.error(
                    "function names cannot carry a scope qualifier",
                    ErrorCode::UnexpectedToken,
                );
            }
            let span = first.span.merge(name.span);
            return Expr::new(
                ExprKind::Symbol(SymbolRef {
                    scope: Some(first),
                    name,
                    default: None,
                }),
                span,
            );
        }

        if self.check(TokenKind::LParen) {
            let open = self.current_span();
            self.advance();
            let args = self.parse_args();
            if !self.eat(TokenKind::RParen) {
                self.error_with_label(
                    &format!("expected `)` to close the call to `{}`", first.name),
                    ErrorCode::UnclosedDelimiter,
                    Label::new(open, "argument list opened here"),
                );
            }
            let span = first.span.merge(self.previous_span());
            return Expr::new(ExprKind::Call { name: first, args }, span);
        }

        let span = first.span;
        Expr::new(
            ExprKind::Symbol(SymbolRef {
                scope: None,
                name: first,
                default: None,
            }),
            span,
        )
    }

    fn parse_args(&mut self) -> Vec<Expr> {
        let mut args = Vec::new();

        if self.check(TokenKind::RParen) {
            return args;
        }

        loop {
            args.push(self.parse_expr());
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        args
    }

    fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
        let span = left.span.merge(right.span);
        Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    // ========== Helpers ==========

    /// Run `parse` one nesting level deeper, abandoning the source past
    /// [`MAX_NESTING`].
    fn nested(&mut self, parse: impl FnOnce(&mut Self) -> Expr) -> Expr {
        let span = self.current_span();
        if !self.enter() {
            return Expr::new(ExprKind::Text(String::new()), span);
        }

        let expr = parse(self);
        self.depth -= 1;
        expr
    }

    /// Count one more folded binary operand against [`MAX_NESTING`]. Each
    /// fold makes the left-leaning tree one level deeper.
    fn deepen(&mut self, folds: &mut usize) -> bool {
        if !self.enter() {
            return false;
        }
        *folds += 1;
        true
    }

    /// Take one level of the nesting budget, abandoning the source when it
    /// is exhausted.
    fn enter(&mut self) -> bool {
        if self.abandoned {
            return false;
        }
        if self.depth >= MAX_NESTING {
            self.error(
                &format!("expression nests deeper than {} levels", MAX_NESTING),
                ErrorCode::NestingTooDeep,
            );
            self.abandoned = true;
            self.pos = self.tokens.len().saturating_sub(1);
            return false;
        }
        self.depth += 1;
        true
    }

    fn expect_ident(&mut self, message: &str) -> Option<Ident> {
        if let TokenKind::Ident(name) = self.current_kind().clone() {
            let span = self.current_span();
            self.advance();
            Some(Ident::new(name, span))
        } else {
            self.error(message, ErrorCode::ExpectedIdentifier);
            None
        }
    }

    fn expect_interpolation_end(&mut self, closer: &str) {
        if self.eat(TokenKind::InterpolationEnd) {
            return;
        }
        // Input that ends inside an interpolation was already reported by the lexer.
        if !self.at_end() {
            self.error(
                &format!("expected {}, found {}", closer, self.current_kind().describe()),
                ErrorCode::UnexpectedToken,
            );
            self.skip_interpolation();
        }
    }

    /// Skip to just past the end of the current interpolation, respecting nesting.
    fn skip_interpolation(&mut self) {
        let mut depth = 0usize;

        while !self.at_end() {
            match self.current_kind() {
                TokenKind::SymbolStart | TokenKind::ExprStart => depth += 1,
                TokenKind::InterpolationEnd => {
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.advance();
        }
    }

    fn current_kind(&self) -> &TokenKind {
        self.tokens
            .get(self.pos)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.span)
            .unwrap_or(Span::DUMMY)
    }

    fn previous_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            Span::DUMMY
        }
    }

    fn at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn check(&self, kind: TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(&kind)
    }

    fn advance(&mut self) {
        if !self.at_end() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&mut self, message: &str, code: ErrorCode) {
        let span = self.current_span();
        self.error_with_label(message, code, Label::new(span, "here"));
    }

    fn error_with_label(&mut self, message: &str, code: ErrorCode, label: Label) {
        if self.abandoned {
            return;
        }
        let span = self.current_span();
        self.diagnostics.push(
            Diagnostic::error(DiagnosticKind::Parser, span, message)
                .with_code(code)
                .with_label(label),
        );
    }
}

/// A default written as a single literal run keeps the type the same text
/// would have inside `$( )`: `42`, `true`, `@2024-01-31`.
fn typed_default(kind: &ExprKind) -> Option<ExprKind> {
    let ExprKind::Text(text) = kind else {
        return None;
    };
    if text.is_empty() || text.trim() != text {
        return None;
    }
    match text.as_str() {
        "true" => return Some(ExprKind::Logic(true)),
        "false" => return Some(ExprKind::Logic(false)),
        _ => {}
    }
    if let Some(date) = text.strip_prefix('@') {
        return literal::parse_date(date).map(ExprKind::Date);
    }
    literal::parse_number(text).map(ExprKind::Number)
}
