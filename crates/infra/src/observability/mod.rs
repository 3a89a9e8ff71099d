//! Tracing subscriber setup
//!
//! The library only emits `tracing` events; binaries call [`init_tracing`]
//! once at startup to install a subscriber.

use reauth_domain::{ApiError, LogFormat, LoggingConfig, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global fmt subscriber described by `config`.
///
/// `RUST_LOG`, when set, takes precedence over `config.level`.
///
/// Returns `Ok(false)` if a global subscriber was already installed, so
/// repeated calls (e.g. from tests) are harmless.
///
/// # Errors
/// Returns `ApiError::Config` if `config.level` is not a valid filter
/// directive.
pub fn init_tracing(config: &LoggingConfig) -> Result<bool> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            ApiError::Config(format!("Invalid log level {:?}: {e}", config.level))
        })?,
    };

    let installed = match config.format {
        LogFormat::Json => fmt().with_env_filter(filter).json().with_target(false).try_init(),
        LogFormat::Compact => fmt().with_env_filter(filter).with_target(false).compact().try_init(),
    };

    Ok(installed.is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_initialisation_reports_false() {
        let config = LoggingConfig::default();
        // Another test may already have installed a subscriber.
        let _ = init_tracing(&config).unwrap();
        assert!(!init_tracing(&config).unwrap());
    }

    #[test]
    fn invalid_level_is_config_error() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LoggingConfig { level: "reauth=loud".into(), format: LogFormat::Json };
        assert!(matches!(init_tracing(&config), Err(ApiError::Config(_))));
    }
}
