//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `REAUTH_BASE_URL` is not set, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `REAUTH_BASE_URL`: API base URL (required)
//! - `REAUTH_TIMEOUT_SECS`: Per-request deadline in seconds
//! - `REAUTH_RETRY_BUDGET`: Replays allowed per request after refreshes
//! - `REAUTH_REFRESH_TIMEOUT_SECS`: Upper bound on one token refresh
//! - `REAUTH_USER_AGENT`: User agent override
//! - `REAUTH_TOKEN_URL` / `REAUTH_CLIENT_ID` / `REAUTH_CLIENT_SECRET`: token
//!   endpoint (both URL and client id are needed to enable refreshes)
//! - `REAUTH_LOG_LEVEL`: Tracing filter directive
//! - `REAUTH_LOG_FORMAT`: `compact` or `json`
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./reauth.toml`, `./reauth.json`, `./config.toml`, `./config.json`
//! 2. The same names in the parent and grandparent directories
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use reauth_domain::constants::ENV_PREFIX;
use reauth_domain::{ApiError, AuthConfig, ClientConfig, LogFormat, Result};

use crate::errors::InfraError;

const CONFIG_FILE_NAMES: [&str; 4] = ["reauth.toml", "reauth.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the base URL is
/// not set there, falls back to a config file.
///
/// # Errors
/// Returns `ApiError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - The loaded configuration fails validation
pub fn load() -> Result<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from `REAUTH_*` environment variables
///
/// Only `REAUTH_BASE_URL` is required; everything else keeps its default.
///
/// # Errors
/// Returns `ApiError::Config` if the base URL is missing, a numeric or
/// enum variable does not parse, or validation fails.
pub fn load_from_env() -> Result<ClientConfig> {
    let mut config = ClientConfig { base_url: env_var("BASE_URL")?, ..ClientConfig::default() };

    if let Some(timeout) = env_parse::<u64>("TIMEOUT_SECS")? {
        config.timeout_secs = timeout;
    }
    if let Some(budget) = env_parse::<u32>("RETRY_BUDGET")? {
        config.retry_budget = budget;
    }
    config.refresh_timeout_secs = env_parse::<u64>("REFRESH_TIMEOUT_SECS")?;
    config.user_agent = env_opt("USER_AGENT");

    if let (Some(token_url), Some(client_id)) = (env_opt("TOKEN_URL"), env_opt("CLIENT_ID")) {
        config.auth =
            Some(AuthConfig { token_url, client_id, client_secret: env_opt("CLIENT_SECRET") });
    }

    if let Some(level) = env_opt("LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(format) = env_opt("LOG_FORMAT") {
        config.logging.format = LogFormat::from_str(&format).map_err(ApiError::Config)?;
    }

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `ApiError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - The configuration fails validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ApiError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ApiError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ApiError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents).map_err(|e| ApiError::from(InfraError::from(e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ApiError::Config(format!("Invalid JSON: {e}"))),
        _ => Err(ApiError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

fn env_key(suffix: &str) -> String {
    format!("{ENV_PREFIX}{suffix}")
}

/// Get a required `REAUTH_*` variable
fn env_var(suffix: &str) -> Result<String> {
    env_opt(suffix).ok_or_else(|| {
        ApiError::Config(format!("Missing required environment variable: {}", env_key(suffix)))
    })
}

/// Optional `REAUTH_*` variable; blank values count as unset.
fn env_opt(suffix: &str) -> Option<String> {
    std::env::var(env_key(suffix)).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T>(suffix: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(suffix)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| {
                ApiError::Config(format!("Invalid value for {}: {e}", env_key(suffix)))
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const ALL_VARS: [&str; 10] = [
        "BASE_URL",
        "TIMEOUT_SECS",
        "RETRY_BUDGET",
        "REFRESH_TIMEOUT_SECS",
        "USER_AGENT",
        "TOKEN_URL",
        "CLIENT_ID",
        "CLIENT_SECRET",
        "LOG_LEVEL",
        "LOG_FORMAT",
    ];

    fn clear_env() {
        for suffix in ALL_VARS {
            std::env::remove_var(env_key(suffix));
        }
    }

    fn set(suffix: &str, value: &str) {
        std::env::set_var(env_key(suffix), value);
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        set("BASE_URL", "https://api.example.com/v1");
        set("TIMEOUT_SECS", "12");
        set("RETRY_BUDGET", "5");
        set("REFRESH_TIMEOUT_SECS", "8");
        set("USER_AGENT", "probe/1.0");
        set("TOKEN_URL", "https://auth.example.com/token");
        set("CLIENT_ID", "cli");
        set("CLIENT_SECRET", "shh");
        set("LOG_LEVEL", "debug");
        set("LOG_FORMAT", "JSON");

        let result = load_from_env();
        clear_env();

        let config = result.expect("config from env");
        assert_eq!(config.base_url, "https://api.example.com/v1");
        assert_eq!(config.timeout_secs, 12);
        assert_eq!(config.retry_budget, 5);
        assert_eq!(config.refresh_timeout_secs, Some(8));
        assert_eq!(config.user_agent.as_deref(), Some("probe/1.0"));
        let auth = config.auth.expect("auth config");
        assert_eq!(auth.token_url, "https://auth.example.com/token");
        assert_eq!(auth.client_secret.as_deref(), Some("shh"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_load_from_env_defaults() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        set("BASE_URL", "http://localhost:8080");

        let result = load_from_env();
        clear_env();

        let config = result.expect("config from env");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.retry_budget, 3);
        assert!(config.auth.is_none());
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn test_load_from_env_missing_base_url() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, ApiError::Config(msg) if msg.contains("REAUTH_BASE_URL")));
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        set("BASE_URL", "https://api.example.com");
        set("RETRY_BUDGET", "lots");

        let result = load_from_env();
        clear_env();

        assert!(matches!(result, Err(ApiError::Config(msg)) if msg.contains("REAUTH_RETRY_BUDGET")));
    }

    #[test]
    fn test_load_from_env_token_url_without_client_id_disables_auth() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        set("BASE_URL", "https://api.example.com");
        set("TOKEN_URL", "https://auth.example.com/token");

        let result = load_from_env();
        clear_env();

        assert!(result.expect("config").auth.is_none());
    }

    #[test]
    fn test_load_from_file_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
base_url = "https://api.example.com"
retry_budget = 1

[auth]
token_url = "https://auth.example.com/token"
client_id = "cli"

[logging]
level = "warn"
format = "json"
"#
        )
        .unwrap();
        let path = file.path().with_extension("toml");
        std::fs::copy(file.path(), &path).unwrap();

        let result = load_from_file(Some(path.clone()));
        std::fs::remove_file(&path).ok();

        let config = result.expect("toml config");
        assert_eq!(config.retry_budget, 1);
        assert_eq!(config.auth.map(|a| a.client_id), Some("cli".to_string()));
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_load_from_file_invalid_config_fails_validation() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "base_url": "https://api.example.com", "timeout_secs": 0 }}"#).unwrap();
        let path = file.path().with_extension("json");
        std::fs::copy(file.path(), &path).unwrap();

        let result = load_from_file(Some(path.clone()));
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(ApiError::Config(msg)) if msg.contains("timeout_secs")));
    }

    #[test]
    fn test_parse_config_unsupported_extension() {
        let result = parse_config("base_url: x", Path::new("config.yaml"));
        assert!(matches!(result, Err(ApiError::Config(msg)) if msg.contains("Unsupported")));
    }
}
