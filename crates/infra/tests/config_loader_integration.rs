//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files.

use std::io::Write;
use std::path::PathBuf;

use reauth_domain::{ApiError, LogFormat};
use reauth_infra::config;
use tempfile::NamedTempFile;

fn write_config(contents: &str, extension: &str) -> PathBuf {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(contents.as_bytes()).expect("Failed to write to temp file");

    let path = temp_file.path().with_extension(extension);
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");
    path
}

#[test]
fn test_load_config_from_json_file() {
    let path = write_config(
        r#"{
            "base_url": "https://api.example.com/v1",
            "timeout_secs": 15,
            "retry_budget": 2,
            "refresh_timeout_secs": 10,
            "default_headers": { "accept": "application/json" },
            "auth": {
                "token_url": "https://auth.example.com/oauth/token",
                "client_id": "integration",
                "client_secret": "secret"
            },
            "logging": { "level": "debug", "format": "json" }
        }"#,
        "json",
    );

    let result = config::load_from_file(Some(path.clone()));
    std::fs::remove_file(path).ok();

    let config = result.expect("Failed to load config from JSON file");
    assert_eq!(config.base_url, "https://api.example.com/v1");
    assert_eq!(config.timeout_secs, 15);
    assert_eq!(config.retry_budget, 2);
    assert_eq!(config.refresh_timeout_secs, Some(10));
    assert_eq!(config.default_headers.get("accept").map(String::as_str), Some("application/json"));

    let auth = config.auth.expect("auth section");
    assert_eq!(auth.client_id, "integration");
    assert_eq!(auth.client_secret.as_deref(), Some("secret"));

    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn test_load_minimal_toml_uses_defaults() {
    let path = write_config("base_url = \"http://localhost:9000\"\n", "toml");

    let result = config::load_from_file(Some(path.clone()));
    std::fs::remove_file(path).ok();

    let config = result.expect("Failed to load minimal TOML config");
    assert_eq!(config.timeout_secs, 30);
    assert_eq!(config.retry_budget, 3);
    assert_eq!(config.refresh_timeout_secs, None);
    assert!(config.auth.is_none());
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_load_config_nonexistent_file() {
    let result = config::load_from_file(Some(PathBuf::from("/nonexistent/reauth.toml")));

    let err = result.expect_err("missing file must fail");
    assert!(matches!(&err, ApiError::Config(msg) if msg.contains("not found")), "{err}");
}

#[test]
fn test_load_config_invalid_json() {
    let path = write_config("{ this is not json }", "json");

    let result = config::load_from_file(Some(path.clone()));
    std::fs::remove_file(path).ok();

    let err = result.expect_err("invalid JSON must fail");
    assert!(matches!(&err, ApiError::Config(msg) if msg.contains("Invalid JSON")), "{err}");
}

#[test]
fn test_load_config_invalid_toml() {
    let path = write_config("base_url = ", "toml");

    let result = config::load_from_file(Some(path.clone()));
    std::fs::remove_file(path).ok();

    let err = result.expect_err("invalid TOML must fail");
    assert!(matches!(&err, ApiError::Config(msg) if msg.contains("Invalid TOML")), "{err}");
}

#[test]
fn test_load_config_missing_base_url_fails_validation() {
    let path = write_config("retry_budget = 1\n", "toml");

    let result = config::load_from_file(Some(path.clone()));
    std::fs::remove_file(path).ok();

    let err = result.expect_err("base_url is required");
    assert!(matches!(&err, ApiError::Config(msg) if msg.contains("base_url")), "{err}");
}
