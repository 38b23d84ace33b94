//! Integration tests for quill-eval crate.

use std::time::Duration;

use bigdecimal::BigDecimal;
use pretty_assertions::assert_eq;
use quill::{CompileError, Context, EvalError, Resolver, Value, ValueType};

fn eval(source: &str) -> Result<Value, EvalError> {
    quill::compile(source).unwrap().evaluate(&Resolver::new())
}

fn eval_with(source: &str, resolver: &Resolver) -> Result<Value, EvalError> {
    quill::compile(source).unwrap().evaluate(resolver)
}

fn eval_text(source: &str) -> String {
    eval(source).unwrap().to_text()
}

fn num(text: &str) -> Value {
    Value::Number(text.parse::<BigDecimal>().unwrap())
}

// ============================================================================
// Templates
// ============================================================================

#[test]
fn test_literal_text_passes_through() {
    assert_eq!(eval("/path/to/my.file").unwrap(), Value::text("/path/to/my.file"));
}

#[test]
fn test_empty_template() {
    assert_eq!(eval("").unwrap(), Value::text(""));
}

#[test]
fn test_lone_expression_keeps_number_type() {
    let value = eval("$( 6 * 7 )").unwrap();
    assert_eq!(value.value_type(), ValueType::Number);
    assert_eq!(value, Value::from(42));
}

#[test]
fn test_expression_inside_text() {
    assert_eq!(eval_text(">>> $( max(1,2,3) ) <<<"), ">>> 3 <<<");
}

#[test]
fn test_lone_symbol_keeps_resolved_type() {
    let resolver = Resolver::from_map([("n", Value::from(7))]);
    let value = eval_with("${n}", &resolver).unwrap();
    assert_eq!(value.value_type(), ValueType::Number);
    assert_eq!(value, Value::from(7));
}

#[test]
fn test_symbol_with_text_is_text() {
    let resolver = Resolver::from_map([("n", Value::from(7))]);
    assert_eq!(eval_with("${n}%", &resolver).unwrap(), Value::text("7%"));
}

#[test]
fn test_symbol_inside_expression_keeps_type() {
    let resolver = Resolver::from_map([("n", Value::from(7))]);
    assert_eq!(eval_with("$(n * 6)", &resolver).unwrap(), Value::from(42));
}

#[test]
fn test_quoted_parens_do_not_close_expression() {
    assert_eq!(eval_text("[$( ')' ++ '(' )]"), "[)(]");
}

#[test]
fn test_dollar_escape() {
    assert_eq!(eval_text("$${name} costs $$5"), "${name} costs $5");
}

#[test]
fn test_braces_and_dollars_are_text() {
    assert_eq!(eval_text("{a} costs $5"), "{a} costs $5");
}

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn test_division_rounds_to_precision() {
    assert_eq!(eval_text("$( 1 / 3 )"), "0.3333333333333333");
}

#[test]
fn test_precision_is_per_context() {
    let context = quill::standard_builder().precision(5).build();
    let value = context.compile("$( 1 / 3 )").unwrap().evaluate(&Resolver::new()).unwrap();
    assert_eq!(value.to_text(), "0.33333");
}

#[test]
fn test_exact_decimals() {
    assert_eq!(eval("$(0.1 + 0.2)").unwrap(), num("0.3"));
}

#[test]
fn test_operator_precedence() {
    assert_eq!(eval("$(2 + 3 * 4)").unwrap(), Value::from(14));
    assert_eq!(eval("$((2 + 3) * 4)").unwrap(), Value::from(20));
    assert_eq!(eval("$(2 ^ 3 ^ 2)").unwrap(), Value::from(512));
}

#[test]
fn test_remainder_and_negation() {
    assert_eq!(eval("$(17 % 5)").unwrap(), Value::from(2));
    assert_eq!(eval("$(-(4 - 10))").unwrap(), Value::from(6));
}

#[test]
fn test_division_by_zero() {
    assert!(matches!(eval("$(1 / 0)"), Err(EvalError::Arithmetic(_))));
}

#[test]
fn test_text_operands_coerce_to_numbers() {
    assert_eq!(eval("$('40' + 2)").unwrap(), Value::from(42));
    assert!(matches!(eval("$('forty' + 2)"), Err(EvalError::Conversion(_))));
}

#[test]
fn test_concat_operator() {
    assert_eq!(eval("$(1 ++ 2)").unwrap(), Value::text("12"));
}

// ============================================================================
// Logic and Comparison
// ============================================================================

#[test]
fn test_comparisons() {
    assert_eq!(eval("$(2 < 10)").unwrap(), Value::Logic(true));
    assert_eq!(eval("$('b' > 'a')").unwrap(), Value::Logic(true));
    assert_eq!(eval("$(1 == 1.0)").unwrap(), Value::Logic(true));
    assert_eq!(eval("$(1 != 2)").unwrap(), Value::Logic(true));
}

#[test]
fn test_equality_coerces_right_to_left() {
    assert_eq!(eval("$(42 == '42')").unwrap(), Value::Logic(true));
    assert_eq!(eval("$(42 == 'x')").unwrap(), Value::Logic(false));
}

#[test]
fn test_ordering_failure_is_an_error() {
    assert!(eval("$(1 < 'x')").is_err());
}

#[test]
fn test_logic_keywords() {
    assert_eq!(eval("$(true and not false)").unwrap(), Value::Logic(true));
    assert_eq!(eval("$(false or false)").unwrap(), Value::Logic(false));
}

#[test]
fn test_short_circuit_skips_right_side() {
    assert_eq!(eval("$(false && missing)").unwrap(), Value::Logic(false));
    assert_eq!(eval("$(true || missing)").unwrap(), Value::Logic(true));
    assert!(matches!(
        eval("$(true && missing)"),
        Err(EvalError::UnresolvedSymbol { .. })
    ));
}

// ============================================================================
// Dates
// ============================================================================

#[test]
fn test_date_literal_prints_as_rfc3339() {
    assert_eq!(eval_text("$(@2024-03-01T10:00:00Z)"), "2024-03-01T10:00:00Z");
}

#[test]
fn test_date_plus_seconds() {
    assert_eq!(
        eval_text("$(@2024-03-01T10:00:00Z + 3600)"),
        "2024-03-01T11:00:00Z"
    );
}

#[test]
fn test_date_difference_in_seconds() {
    let value = eval("$(@2024-03-02T00:00:00Z - @2024-03-01T00:00:00Z)").unwrap();
    assert_eq!(value, Value::from(86_400));
}

#[test]
fn test_adding_two_dates_fails() {
    let err = eval("$(@2024-03-02T00:00:00Z + @2024-03-01T00:00:00Z)").unwrap_err();
    assert!(matches!(err, EvalError::Arithmetic(_)));
}

#[test]
fn test_dates_compare() {
    assert_eq!(
        eval("$(@2024-01-01T00:00:00Z < @2024-06-01T00:00:00Z)").unwrap(),
        Value::Logic(true)
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_unresolved_symbol_names_its_key() {
    let err = eval("${env:HOME}").unwrap_err();
    assert_eq!(
        err,
        EvalError::UnresolvedSymbol {
            key: "env:HOME".to_string()
        }
    );
}

#[test]
fn test_unknown_function() {
    assert_eq!(
        eval("$(nope(1))").unwrap_err(),
        EvalError::UnknownFunction {
            name: "nope".to_string()
        }
    );
}

#[test]
fn test_syntax_error_reports_diagnostics() {
    let err = quill::compile("$(1 +)").unwrap_err();
    assert!(matches!(err, CompileError::Syntax(_)));
    assert_eq!(err.diagnostics().len(), 1);
    assert!(err.render("$(1 +)", "inline").contains("Q0101"));
}

#[test]
fn test_source_length_limit() {
    let context = quill::standard_builder().max_source_length(8).build();
    let err = context.compile("0123456789").unwrap_err();
    assert!(matches!(
        err,
        CompileError::SizeLimitExceeded {
            length: 10,
            limit: 8
        }
    ));
    assert!(err.diagnostics().is_empty());
}

#[test]
fn test_long_operator_chain_fails_to_compile() {
    let source = format!("$(1{})", "+1".repeat(200_000));
    let context = quill::standard_builder().max_source_length(1_000_000).build();
    let err = context.compile(&source).unwrap_err();
    assert!(matches!(err, CompileError::Syntax(_)));
    assert_eq!(err.diagnostics().len(), 1);
    assert_eq!(
        err.diagnostics()[0].code,
        Some(quill_diagnostic::ErrorCode::NestingTooDeep)
    );
}

#[test]
fn test_operator_chain_within_limit_evaluates() {
    let source = format!("$(1{})", "+1".repeat(100));
    assert_eq!(eval(&source).unwrap(), Value::from(101));
}

#[test]
fn test_source_length_limit_is_inclusive() {
    let context = quill::standard_builder().max_source_length(10).build();
    assert!(context.compile("0123456789").is_ok());
}

// ============================================================================
// Timeouts
// ============================================================================

#[test]
fn test_slow_function_times_out() {
    let context = quill::standard_builder()
        .timeout(Duration::from_millis(50))
        .build();
    let compiled = context.compile("$(sleep(200))").unwrap();
    assert_eq!(
        compiled.evaluate(&Resolver::new()).unwrap_err(),
        EvalError::Timeout { limit_ms: 50 }
    );
}

#[test]
fn test_zero_timeout_never_fires() {
    let context = quill::standard_builder().timeout(Duration::ZERO).build();
    let compiled = context.compile("done$(sleep(20))").unwrap();
    assert_eq!(compiled.evaluate_text(&Resolver::new()).unwrap(), "done");
}

// ============================================================================
// Sharing
// ============================================================================

#[test]
fn test_compiled_expression_is_reusable() {
    let compiled = quill::compile("Hi ${who}").unwrap();
    let a = Resolver::from_map([("who", "Ada")]);
    let b = Resolver::from_map([("who", "Grace")]);
    assert_eq!(compiled.evaluate_text(&a).unwrap(), "Hi Ada");
    assert_eq!(compiled.evaluate_text(&b).unwrap(), "Hi Grace");
    assert_eq!(compiled.evaluate_text(&a).unwrap(), "Hi Ada");
}

#[test]
fn test_compiled_expression_across_threads() {
    let compiled = quill::compile("$(n * 2)").unwrap();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let compiled = compiled.clone();
            std::thread::spawn(move || {
                let resolver = Resolver::from_map([("n", Value::from(i))]);
                compiled.evaluate(&resolver).unwrap()
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), Value::from(i as i64 * 2));
    }
}

#[test]
fn test_context_default_has_no_functions() {
    let context = Context::new();
    assert!(context.registry().is_empty());
    let compiled = context.compile("$(max(1))").unwrap();
    assert!(matches!(
        compiled.evaluate(&Resolver::new()),
        Err(EvalError::UnknownFunction { .. })
    ));
}
