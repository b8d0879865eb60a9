//! Integration tests for the settings loader
//!
//! Tests loading settings from files end to end and turning them into
//! controller options.

use std::io::Write;
use std::time::Duration;

use dynmetric_domain::DynMetricError;
use dynmetric_infra::config;
use dynmetric_infra::PushControllerOptions;
use tempfile::NamedTempFile;

#[test]
fn test_load_settings_from_json_file() {
    let json_content = r#"{
        "config_host": "http://config.internal:7070",
        "timeout_secs": 8,
        "poll_interval_secs": 300,
        "request_timeout_secs": 10,
        "resource": {
            "service.name": "checkout",
            "deployment.environment": "staging"
        }
    }"#;

    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(json_content.as_bytes()).expect("Failed to write to temp file");

    let path = temp_file.path().with_extension("json");
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");

    let settings = config::load_from_file(Some(path.clone())).expect("settings from JSON");

    assert_eq!(settings.config_host, "http://config.internal:7070");
    assert_eq!(settings.timeout_secs, Some(8));
    assert_eq!(settings.poll_interval_secs, 300);
    assert_eq!(settings.request_timeout_secs, 10);
    assert_eq!(settings.resource.len(), 2);

    let options = PushControllerOptions::from_settings(&settings);
    assert_eq!(options.timeout, Some(Duration::from_secs(8)));
    assert_eq!(options.poll_interval, Duration::from_secs(300));
    assert_eq!(options.resource.get("deployment.environment"), Some("staging"));

    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_settings_from_toml_file() {
    let toml_content = r#"
config_host = "https://config.internal"
poll_interval_secs = 60

[resource]
"service.name" = "ledger"
"#;

    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(toml_content.as_bytes()).expect("Failed to write to temp file");

    let path = temp_file.path().with_extension("toml");
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");

    let settings = config::load_from_file(Some(path.clone())).expect("settings from TOML");

    assert_eq!(settings.config_host, "https://config.internal");
    assert_eq!(settings.poll_interval_secs, 60);
    assert_eq!(settings.timeout_secs, None);
    assert_eq!(settings.resource.get("service.name").map(String::as_str), Some("ledger"));

    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_settings_with_minimal_fields() {
    let json_content = r#"{ "config_host": "http://localhost:7070" }"#;

    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(json_content.as_bytes()).expect("Failed to write to temp file");

    let path = temp_file.path().with_extension("json");
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");

    let settings = config::load_from_file(Some(path.clone())).expect("minimal settings");

    assert_eq!(settings.poll_interval_secs, 1800);
    assert_eq!(settings.request_timeout_secs, 30);
    assert!(settings.timeout().is_none());
    assert!(settings.resource.is_empty());

    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_settings_from_nonexistent_file() {
    let result = config::load_from_file(Some("/nonexistent/path/dynmetric.json".into()));

    match result {
        Err(DynMetricError::Config(msg)) => {
            assert!(msg.contains("not found"), "Error message should mention 'not found'");
        }
        other => panic!("Expected Config error, got {other:?}"),
    }
}

#[test]
fn test_load_settings_with_invalid_format() {
    let invalid_content = r#"{ "config_host": "http://x" "#;

    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(invalid_content.as_bytes()).expect("Failed to write to temp file");

    let path = temp_file.path().with_extension("json");
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");

    match config::load_from_file(Some(path.clone())) {
        Err(DynMetricError::Config(msg)) => {
            assert!(msg.contains("Invalid JSON"), "Error message should mention invalid JSON");
        }
        other => panic!("Expected Config error, got {other:?}"),
    }

    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_settings_rejects_zero_poll_interval() {
    let json_content = r#"{ "config_host": "http://localhost:7070", "poll_interval_secs": 0 }"#;

    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(json_content.as_bytes()).expect("Failed to write to temp file");

    let path = temp_file.path().with_extension("json");
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");

    assert!(matches!(
        config::load_from_file(Some(path.clone())),
        Err(DynMetricError::Config(msg)) if msg.contains("poll_interval_secs")
    ));

    std::fs::remove_file(path).ok();
}
