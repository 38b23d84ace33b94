//! Property-based tests for compile and evaluate.

use bigdecimal::BigDecimal;
use proptest::prelude::*;
use quill::{Resolver, Value, number};

// ============================================================================
// Strategies
// ============================================================================

/// Decimals with up to 18 digits and up to 12 fractional places.
fn arb_decimal() -> impl Strategy<Value = BigDecimal> {
    (any::<i64>(), 0i64..=12).prop_map(|(digits, scale)| BigDecimal::new(digits.into(), scale))
}

/// Template text with no interpolation markers.
fn arb_plain_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ./:{}()-]{0,60}"
}

fn arb_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}"
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn decimal_text_round_trips(value in arb_decimal()) {
        let source = format!("$( {} )", number::format(&value));
        let result = quill::compile(&source).unwrap().evaluate(&Resolver::new()).unwrap();
        prop_assert_eq!(result, Value::Number(number::round(&value, 16)));
    }

    #[test]
    fn plain_text_is_unchanged(text in arb_plain_text()) {
        let result = quill::compile(&text).unwrap().evaluate_text(&Resolver::new()).unwrap();
        prop_assert_eq!(result, text);
    }

    #[test]
    fn evaluation_is_deterministic(a in arb_decimal(), b in arb_decimal(), name in arb_name()) {
        let source = format!("${{{}-x}} $( {} * 3 + {} )", name, number::format(&a), number::format(&b));
        let compiled = quill::compile(&source).unwrap();
        let resolver = Resolver::from_map([(name.as_str(), "bound")]);
        let first = compiled.evaluate(&resolver).unwrap();
        let second = compiled.evaluate(&resolver).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn resolved_symbols_render_verbatim(name in arb_name(), value in arb_plain_text()) {
        let compiled = quill::compile(&format!("<${{{}}}>", name)).unwrap();
        let resolver = Resolver::from_map([(name.as_str(), value.as_str())]);
        prop_assert_eq!(compiled.evaluate_text(&resolver).unwrap(), format!("<{}>", value));
    }

    #[test]
    fn compile_never_panics(source in "\\PC{0,80}") {
        let _ = quill::compile(&source);
    }
}
