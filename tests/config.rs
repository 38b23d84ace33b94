//! Integration tests for context configuration and logging setup.

use std::time::Duration;

use pretty_assertions::assert_eq;
use quill::{Context, ContextConfig, LogConfig, Resolver, Value};

// ContextConfig tests

#[test]
fn test_config_json_round_trip() {
    let config = ContextConfig {
        precision: 8,
        timeout_ms: 250,
        max_source_length: 4096,
        io_quota: 512,
    };
    let json = serde_json::to_string(&config).unwrap();
    let back: ContextConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}

#[test]
fn test_empty_json_is_default() {
    let config: ContextConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, ContextConfig::default());
}

#[test]
fn test_json_config_drives_context() {
    let config: ContextConfig =
        serde_json::from_str(r#"{ "precision": 3, "max_source_length": 32 }"#).unwrap();
    let context = quill::standard_builder().config(config).build();

    assert_eq!(context.precision(), 3);
    let value = context.compile("$(2 / 3)").unwrap().evaluate(&Resolver::new()).unwrap();
    assert_eq!(value.to_text(), "0.667");
    assert!(context.compile(&"x".repeat(33)).is_err());
}

#[test]
fn test_unknown_json_field_is_ignored() {
    let config: ContextConfig = serde_json::from_str(r#"{ "colour": "blue", "io_quota": 10 }"#).unwrap();
    assert_eq!(config.io_quota, 10);
}

#[test]
fn test_builder_setters() {
    let context = Context::builder()
        .precision(20)
        .timeout(Duration::from_millis(1500))
        .max_source_length(10)
        .io_quota(99)
        .build();
    let config = context.config();
    assert_eq!(config.precision, 20);
    assert_eq!(config.timeout_ms, 1500);
    assert_eq!(config.max_source_length, 10);
    assert_eq!(config.io_quota, 99);
}

#[test]
fn test_contexts_have_distinct_ids() {
    let a = Context::new();
    let b = Context::new();
    assert_ne!(a.id(), b.id());
    assert_eq!(a.clone().id(), a.id());
}

#[test]
fn test_high_precision_context() {
    let context = quill::standard_builder().precision(40).build();
    let value = context.compile("$(1 / 7)").unwrap().evaluate(&Resolver::new()).unwrap();
    assert_eq!(value.to_text(), "0.1428571428571428571428571428571428571429");
}

// LogConfig tests

#[test]
fn test_log_config_defaults() {
    let config = LogConfig::default();
    assert_eq!(config.filter, "quill=warn");
    assert!(!config.with_target);
}

#[test]
fn test_logging_init_does_not_disturb_evaluation() {
    quill::logging::init(&LogConfig::new().filter("quill=trace"));
    let value = quill::compile("${a-b}$(1 + 1)")
        .unwrap()
        .evaluate(&Resolver::new())
        .unwrap();
    assert_eq!(value, Value::text("b2"));
}
