//! Expression AST nodes.
//! 表达式 AST 节点。

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset};
use quill_common::Span;

/// An identifier with its source location.
/// 带源码位置的标识符。
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// An expression.
/// 表达式。
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// The empty template.
    pub fn empty() -> Self {
        Self::new(ExprKind::Sequence(Vec::new()), Span::DUMMY)
    }

    /// Whether evaluation always produces text (a template sequence).
    pub fn is_sequence(&self) -> bool {
        matches!(self.kind, ExprKind::Sequence(_))
    }

    /// Number of nodes in this tree, counting defaults and arguments.
    pub fn node_count(&self) -> usize {
        1 + match &self.kind {
            ExprKind::Text(_) | ExprKind::Number(_) | ExprKind::Logic(_) | ExprKind::Date(_) => 0,
            ExprKind::Symbol(symbol) => symbol.default.as_ref().map_or(0, |d| d.node_count()),
            ExprKind::Call { args, .. } => args.iter().map(Expr::node_count).sum(),
            ExprKind::Unary { operand, .. } => operand.node_count(),
            ExprKind::Binary { left, right, .. } => left.node_count() + right.node_count(),
            ExprKind::Sequence(parts) => parts.iter().map(Expr::node_count).sum(),
        }
    }
}

/// Expression kind.
/// 表达式类型。
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Literal text, from template text or a quoted literal / 文本字面量
    Text(String),
    Number(BigDecimal),
    Logic(bool),
    Date(DateTime<FixedOffset>),

    /// `${scope:name-default}` or a bare identifier inside `$( )` / 符号引用
    Symbol(SymbolRef),

    /// `name(arg, ...)` / 函数调用
    Call { name: Ident, args: Vec<Expr> },

    Unary { op: UnaryOp, operand: Box<Expr> },

    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Template parts, concatenated as text / 模板片段序列
    Sequence(Vec<Expr>),
}

/// A reference to a named symbol.
/// 对具名符号的引用。
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolRef {
    /// Explicit scope qualifier (`scope:` prefix).
    pub scope: Option<Ident>,
    pub name: Ident,
    /// Fallback template, evaluated only when resolution misses.
    pub default: Option<Box<Expr>>,
}

impl SymbolRef {
    /// The lookup key as written, `scope:name` or `name`.
    pub fn key(&self) -> String {
        match &self.scope {
            Some(scope) => format!("{}:{}", scope.name, self.name.name),
            None => self.name.name.clone(),
        }
    }
}

/// Binary operators.
/// 二元运算符。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Pow => "^",
            BinOp::Concat => "++",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

/// Unary operators.
/// 一元运算符。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}
