//! Config tests - defaults, builders, validation and settings parsing

use serde_json::json;

use crate::config::{HeaderSelection, LogySettings, LogyConfig};
use crate::error::{ConfigError, LogyError};
use crate::logging::{
    DEFAULT_SLOW_QUERY_THRESHOLD_SECS, MemorySink, ParameterFilter, TracingSink,
};
use crate::request::Params;

fn params(value: serde_json::Value) -> Params {
    match value {
        serde_json::Value::Object(map) => map,
        _ => panic!("expected a JSON object"),
    }
}

// =============================================================================
// Defaults and Builders
// =============================================================================

#[test]
fn test_config_defaults() {
    let config = LogyConfig::new();
    assert!(config.logger.is_none());
    assert!(config.filter.is_none());
    assert!(config.headers.is_none());
    assert!(config.status_exceptions.is_empty());
    assert_eq!(config.slow_query_threshold_secs, DEFAULT_SLOW_QUERY_THRESHOLD_SECS);
    assert_eq!(config.slow_query_threshold_secs, 2.0);
    assert!(config.create_spans);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_builder() {
    let config = LogyConfig::new()
        .with_logger(MemorySink::new())
        .with_filter_parameters(["password"])
        .with_headers(HeaderSelection::only(["X-Request-Id"]))
        .register_status_exceptions(|registry| {
            registry.register("Widgets::NotFound", 404);
        })
        .register_status_exception("Widgets::Invalid", 422)
        .with_slow_query_threshold(0.5)
        .with_spans(false);

    assert!(config.logger.is_some());
    assert!(config.filter.is_some());
    assert_eq!(
        config.headers,
        Some(HeaderSelection::Only(vec!["X-Request-Id".to_string()]))
    );
    assert_eq!(config.status_exceptions.get("Widgets::NotFound"), Some(404));
    assert_eq!(config.status_exceptions.get("Widgets::Invalid"), Some(422));
    assert_eq!(config.slow_query_threshold_secs, 0.5);
    assert!(!config.create_spans);
    assert!(config.validate().is_ok());
}

#[test]
fn test_later_registration_wins() {
    let config = LogyConfig::new()
        .register_status_exception("Widgets::Gone", 404)
        .register_status_exception("Widgets::Gone", 410);
    assert_eq!(config.status_exceptions.status_for("Widgets::Gone"), 410);
    assert_eq!(config.status_exceptions.len(), 1);
}

#[test]
fn test_config_debug_hides_sink_and_filter() {
    let config = LogyConfig::new()
        .with_logger(TracingSink)
        .with_filter_parameters(["password"]);
    let debug = format!("{config:?}");
    assert!(debug.contains("<sink>"));
    assert!(debug.contains("<filter>"));
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_validate_rejects_blank_header_name() {
    let config = LogyConfig::new().with_headers(HeaderSelection::only(["X-Request-Id", "  "]));
    assert_eq!(config.validate(), Err(ConfigError::BlankHeaderName));
}

#[test]
fn test_validate_rejects_invalid_status() {
    let config = LogyConfig::new().register_status_exception("Widgets::Weird", 1000);
    assert_eq!(
        config.validate(),
        Err(ConfigError::InvalidStatus {
            kind: "Widgets::Weird".to_string(),
            status: 1000,
        })
    );
}

#[test]
fn test_validate_rejects_non_positive_threshold() {
    for threshold in [0.0, -1.0] {
        let config = LogyConfig::new().with_slow_query_threshold(threshold);
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidSlowQueryThreshold(threshold))
        );
    }

    let config = LogyConfig::new().with_slow_query_threshold(f64::NAN);
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidSlowQueryThreshold(_))
    ));
}

// =============================================================================
// Settings
// =============================================================================

#[test]
fn test_settings_defaults() {
    let settings: LogySettings = serde_json::from_str("{}").unwrap();
    assert_eq!(settings, LogySettings::default());
    assert_eq!(settings.slow_query_threshold_secs, 2.0);
    assert!(settings.create_spans);
}

#[test]
fn test_from_json_with_all_headers() {
    let config = LogyConfig::from_json(r#"{ "headers": "all" }"#).unwrap();
    assert_eq!(config.headers, Some(HeaderSelection::All));
    assert!(config.filter.is_none());

    let config = LogyConfig::from_json(r#"{ "headers": "ALL" }"#).unwrap();
    assert_eq!(config.headers, Some(HeaderSelection::All));
}

#[test]
fn test_from_json_with_header_list() {
    let config = LogyConfig::from_json(r#"{ "headers": ["X-Request-Id", "Accept"] }"#).unwrap();
    assert_eq!(
        config.headers,
        Some(HeaderSelection::only(["X-Request-Id", "Accept"]))
    );
}

#[test]
fn test_from_json_rejects_unknown_header_keyword() {
    let result = LogyConfig::from_json(r#"{ "headers": "some" }"#);
    assert!(matches!(result, Err(LogyError::Settings(_))));
}

#[test]
fn test_from_json_rejects_malformed_json() {
    assert!(matches!(
        LogyConfig::from_json("{ not json"),
        Err(LogyError::Settings(_))
    ));
}

#[test]
fn test_from_json_builds_filter() {
    let config = LogyConfig::from_json(
        r#"{ "filter_parameters": ["password"], "filter_replacement": "<hidden>" }"#,
    )
    .unwrap();

    let filter = config.filter.unwrap();
    let filtered = filter.filter(params(json!({ "password": "x", "name": "y" })));
    assert_eq!(filtered["password"], "<hidden>");
    assert_eq!(filtered["name"], "y");
}

#[test]
fn test_from_json_registers_status_exceptions() {
    let config = LogyConfig::from_json(
        r#"{
            "status_exceptions": { "Widgets::NotFound": 404, "Widgets::Invalid": 422 },
            "slow_query_threshold_secs": 1.5,
            "create_spans": false
        }"#,
    )
    .unwrap();

    assert_eq!(config.status_exceptions.status_for("Widgets::NotFound"), 404);
    assert_eq!(config.status_exceptions.status_for("Widgets::Invalid"), 422);
    assert_eq!(config.status_exceptions.status_for("Widgets::Other"), 500);
    assert_eq!(config.slow_query_threshold_secs, 1.5);
    assert!(!config.create_spans);
}

#[test]
fn test_from_json_validates() {
    let result = LogyConfig::from_json(r#"{ "status_exceptions": { "Widgets::Odd": 42 } }"#);
    assert!(matches!(
        result,
        Err(LogyError::Config(ConfigError::InvalidStatus { status: 42, .. }))
    ));
}

// =============================================================================
// HeaderSelection Serde
// =============================================================================

#[test]
fn test_header_selection_serializes_like_settings() {
    assert_eq!(
        serde_json::to_value(HeaderSelection::All).unwrap(),
        json!("all")
    );
    assert_eq!(
        serde_json::to_value(HeaderSelection::only(["Accept"])).unwrap(),
        json!(["Accept"])
    );

    let selection: HeaderSelection = serde_json::from_value(json!(["Accept"])).unwrap();
    assert_eq!(selection, HeaderSelection::only(["Accept"]));
}

#[test]
fn test_header_selection_rejects_other_shapes() {
    assert!(serde_json::from_value::<HeaderSelection>(json!(3)).is_err());
    assert!(serde_json::from_value::<HeaderSelection>(json!("none")).is_err());
}
