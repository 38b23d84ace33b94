//! Integration tests for quill-parser crate.

use pretty_assertions::assert_eq;
use quill_diagnostic::ErrorCode;
use quill_parser::parse_template;
use quill_syntax::{BinOp, Expr, ExprKind, UnaryOp};

fn parse_ok(source: &str) -> Expr {
    let (expr, diags) = parse_template(source);
    assert!(diags.is_empty(), "unexpected diagnostics for {source:?}: {diags:?}");
    expr
}

fn error_codes(source: &str) -> Vec<ErrorCode> {
    let (_, diags) = parse_template(source);
    diags.into_iter().filter_map(|d| d.code).collect()
}

// ============================================================================
// Template Shape
// ============================================================================

#[test]
fn test_empty_source_is_empty_sequence() {
    let expr = parse_ok("");
    assert_eq!(expr.kind, ExprKind::Sequence(vec![]));
}

#[test]
fn test_plain_text() {
    let expr = parse_ok("/path/to/my.file");
    let ExprKind::Sequence(parts) = expr.kind else {
        panic!("expected a sequence");
    };
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].kind, ExprKind::Text("/path/to/my.file".to_string()));
}

#[test]
fn test_lone_symbol_keeps_its_node() {
    let expr = parse_ok("${name}");
    assert!(matches!(expr.kind, ExprKind::Symbol(_)));
}

#[test]
fn test_symbol_with_text_is_a_sequence() {
    let expr = parse_ok("<${name}>");
    assert!(expr.is_sequence());
}

#[test]
fn test_lone_expression_keeps_its_node() {
    let expr = parse_ok("$( 6 * 7 )");
    assert!(matches!(expr.kind, ExprKind::Binary { op: BinOp::Mul, .. }));
}

#[test]
fn test_expression_with_text_is_a_sequence() {
    let expr = parse_ok(">>> $( max(1,2,3) ) <<<");
    let ExprKind::Sequence(parts) = expr.kind else {
        panic!("expected a sequence");
    };
    assert_eq!(parts.len(), 3);
    let ExprKind::Call { name, args } = &parts[1].kind else {
        panic!("expected a call");
    };
    assert_eq!(name.name, "max");
    assert_eq!(args.len(), 3);
}

#[test]
fn test_two_expressions_are_a_sequence() {
    let expr = parse_ok("$(1)$(2)");
    assert!(expr.is_sequence());
}

// ============================================================================
// Symbols
// ============================================================================

#[test]
fn test_symbol_default_is_a_subtree() {
    let expr = parse_ok("${name-$(6 * 7)}");
    let ExprKind::Symbol(symbol) = &expr.kind else {
        panic!("expected a symbol");
    };
    assert_eq!(symbol.name.name, "name");
    let default = symbol.default.as_ref().expect("default");
    assert!(matches!(default.kind, ExprKind::Binary { op: BinOp::Mul, .. }));
}

#[test]
fn test_scoped_symbol() {
    let expr = parse_ok("${env:HOME}");
    let ExprKind::Symbol(symbol) = &expr.kind else {
        panic!("expected a symbol");
    };
    assert_eq!(symbol.key(), "env:HOME");
}

fn default_of(source: &str) -> ExprKind {
    let expr = parse_ok(source);
    let ExprKind::Symbol(symbol) = expr.kind else {
        panic!("expected a symbol");
    };
    symbol.default.expect("default").kind
}

#[test]
fn test_literal_defaults_are_typed() {
    assert!(matches!(default_of("${n-42}"), ExprKind::Number(_)));
    assert!(matches!(default_of("${n--1.5}"), ExprKind::Number(_)));
    assert_eq!(default_of("${n-true}"), ExprKind::Logic(true));
    assert!(matches!(default_of("${n-@2024-01-31}"), ExprKind::Date(_)));
}

#[test]
fn test_other_defaults_stay_text() {
    let ExprKind::Sequence(parts) = default_of("${n-Ada}") else {
        panic!("expected a sequence");
    };
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].kind, ExprKind::Text("Ada".to_string()));
    assert!(matches!(default_of("${n- 42}"), ExprKind::Sequence(_)));
}

#[test]
fn test_bare_identifier_is_a_symbol() {
    let expr = parse_ok("$(count + 1)");
    let ExprKind::Binary { left, .. } = expr.kind else {
        panic!("expected a binary expression");
    };
    assert!(matches!(&left.kind, ExprKind::Symbol(s) if s.default.is_none()));
}

// ============================================================================
// Precedence
// ============================================================================

#[test]
fn test_or_binds_loosest() {
    let expr = parse_ok("$(a || b && c)");
    let ExprKind::Binary { op, right, .. } = expr.kind else {
        panic!("expected a binary expression");
    };
    assert_eq!(op, BinOp::Or);
    assert!(matches!(right.kind, ExprKind::Binary { op: BinOp::And, .. }));
}

#[test]
fn test_comparison_below_concat() {
    let expr = parse_ok("$('a' ++ 'b' == 'ab')");
    let ExprKind::Binary { op, left, .. } = expr.kind else {
        panic!("expected a binary expression");
    };
    assert_eq!(op, BinOp::Eq);
    assert!(matches!(left.kind, ExprKind::Binary { op: BinOp::Concat, .. }));
}

#[test]
fn test_concat_below_additive() {
    let expr = parse_ok("$(1 + 2 ++ 3)");
    let ExprKind::Binary { op, left, .. } = expr.kind else {
        panic!("expected a binary expression");
    };
    assert_eq!(op, BinOp::Concat);
    assert!(matches!(left.kind, ExprKind::Binary { op: BinOp::Add, .. }));
}

#[test]
fn test_left_associative_subtraction() {
    let expr = parse_ok("$(10 - 4 - 3)");
    let ExprKind::Binary { op, left, .. } = expr.kind else {
        panic!("expected a binary expression");
    };
    assert_eq!(op, BinOp::Sub);
    assert!(matches!(left.kind, ExprKind::Binary { op: BinOp::Sub, .. }));
}

#[test]
fn test_unary_binds_tighter_than_power() {
    let expr = parse_ok("$(-2 ^ 2)");
    let ExprKind::Binary { op, left, .. } = expr.kind else {
        panic!("expected a binary expression");
    };
    assert_eq!(op, BinOp::Pow);
    assert!(matches!(left.kind, ExprKind::Unary { op: UnaryOp::Neg, .. }));
}

#[test]
fn test_not_keyword() {
    let expr = parse_ok("$(not true)");
    assert!(matches!(expr.kind, ExprKind::Unary { op: UnaryOp::Not, .. }));
}

#[test]
fn test_grouping() {
    let expr = parse_ok("$((1 + 2) * 3)");
    let ExprKind::Binary { op, left, .. } = expr.kind else {
        panic!("expected a binary expression");
    };
    assert_eq!(op, BinOp::Mul);
    assert!(matches!(left.kind, ExprKind::Binary { op: BinOp::Add, .. }));
}

#[test]
fn test_call_without_arguments() {
    let expr = parse_ok("$(now())");
    assert!(matches!(expr.kind, ExprKind::Call { ref args, .. } if args.is_empty()));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_missing_operand() {
    assert_eq!(error_codes("$(1 +)"), vec![ErrorCode::ExpectedExpression]);
}

#[test]
fn test_empty_expression() {
    assert_eq!(error_codes("a $() b"), vec![ErrorCode::ExpectedExpression]);
}

#[test]
fn test_unclosed_call() {
    assert_eq!(error_codes("$(max(1, 2)"), vec![ErrorCode::UnterminatedInterpolation]);
}

#[test]
fn test_scoped_function_name_rejected() {
    let codes = error_codes("$(math:max(1))");
    assert_eq!(codes.first(), Some(&ErrorCode::UnexpectedToken));
}

#[test]
fn test_errors_do_not_stop_parsing() {
    let codes = error_codes("$(1 +) and $(2 *)");
    assert_eq!(codes, vec![ErrorCode::ExpectedExpression, ErrorCode::ExpectedExpression]);
}

#[test]
fn test_nesting_limit() {
    let deep = format!("$({}1)", "-".repeat(quill_parser::MAX_NESTING * 2));
    assert_eq!(error_codes(&deep), vec![ErrorCode::NestingTooDeep]);
}

#[test]
fn test_operator_chain_counts_toward_nesting_limit() {
    for op in ["+", "*", "++", "==", "&&", "||"] {
        let chain = format!("$(1{})", format!(" {op} 1").repeat(quill_parser::MAX_NESTING * 4));
        assert_eq!(error_codes(&chain), vec![ErrorCode::NestingTooDeep], "chain of {op}");
    }
}

#[test]
fn test_mixed_operator_chain_counts_toward_nesting_limit() {
    let chain = format!("$(1{})", " + 2 * 3 - 4".repeat(quill_parser::MAX_NESTING));
    assert_eq!(error_codes(&chain), vec![ErrorCode::NestingTooDeep]);
}
