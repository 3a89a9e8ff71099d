//! Client configuration structures
//!
//! Loaded by `reauth_infra::config` from environment variables or a TOML/JSON
//! file. Every field has a default except `base_url`, which `validate`
//! requires.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_LOG_LEVEL, DEFAULT_RETRY_BUDGET, DEFAULT_TIMEOUT_SECS};
use crate::errors::{ApiError, Result};
use crate::impl_token_conversions;

/// Top-level configuration for one API client instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL that request paths are joined onto (e.g. `https://api.example.com/v1`).
    pub base_url: String,
    /// Default deadline for one transport call.
    pub timeout_secs: u64,
    /// Retries granted per request identity after successful refreshes.
    pub retry_budget: u32,
    /// Upper bound on one reauthentication; expiry counts as a denial.
    pub refresh_timeout_secs: Option<u64>,
    /// `User-Agent` override for the default transport.
    pub user_agent: Option<String>,
    /// Headers added to every request.
    pub default_headers: BTreeMap<String, String>,
    /// Token endpoint settings. Without them refreshes are always denied.
    pub auth: Option<AuthConfig>,
    /// Tracing subscriber settings.
    pub logging: LoggingConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry_budget: DEFAULT_RETRY_BUDGET,
            refresh_timeout_secs: None,
            user_agent: None,
            default_headers: BTreeMap::new(),
            auth: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl ClientConfig {
    /// `timeout_secs` as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `refresh_timeout_secs` as a [`Duration`], if set.
    pub fn refresh_timeout(&self) -> Option<Duration> {
        self.refresh_timeout_secs.map(Duration::from_secs)
    }

    /// Check the configuration for values the client cannot work with.
    ///
    /// # Errors
    /// Returns `ApiError::Config` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(ApiError::Config("base_url must be set".into()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ApiError::Config(format!(
                "base_url must start with http:// or https://: {}",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ApiError::Config("timeout_secs must be greater than zero".into()));
        }
        if self.refresh_timeout_secs == Some(0) {
            return Err(ApiError::Config("refresh_timeout_secs must be greater than zero".into()));
        }
        if let Some(auth) = &self.auth {
            if auth.token_url.trim().is_empty() {
                return Err(ApiError::Config("auth.token_url must be set".into()));
            }
            if auth.client_id.trim().is_empty() {
                return Err(ApiError::Config("auth.client_id must be set".into()));
            }
        }
        Ok(())
    }
}

/// OAuth token endpoint used to renew expired access tokens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Endpoint accepting `grant_type=refresh_token` form posts.
    pub token_url: String,
    /// OAuth client identifier sent with each refresh.
    pub client_id: String,
    /// Optional client secret; redacted in `Debug` output.
    #[serde(default)]
    pub client_secret: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line human-readable output.
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
}

impl_token_conversions!(LogFormat {
    Compact => "compact",
    Json => "json",
});

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `reauth_core=debug,info`.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: DEFAULT_LOG_LEVEL.to_string(), format: LogFormat::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ClientConfig {
        ClientConfig { base_url: "https://api.example.com".into(), ..Default::default() }
    }

    #[test]
    fn defaults_match_constants() {
        let config = ClientConfig::default();
        assert_eq!(config.retry_budget, 3);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.refresh_timeout(), None);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn validate_requires_base_url() {
        assert!(matches!(ClientConfig::default().validate(), Err(ApiError::Config(_))));
        assert!(valid().validate().is_ok());

        let ftp = ClientConfig { base_url: "ftp://example.com".into(), ..Default::default() };
        assert!(ftp.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeouts() {
        let zero = ClientConfig { timeout_secs: 0, ..valid() };
        assert!(zero.validate().is_err());

        let zero_refresh = ClientConfig { refresh_timeout_secs: Some(0), ..valid() };
        assert!(zero_refresh.validate().is_err());
    }

    #[test]
    fn validate_checks_auth_section() {
        let config = ClientConfig {
            auth: Some(AuthConfig {
                token_url: String::new(),
                client_id: "cli".into(),
                client_secret: None,
            }),
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url":"https://x.test","logging":{"format":"json"}}"#)
                .unwrap();
        assert_eq!(config.retry_budget, 3);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn auth_debug_redacts_secret() {
        let auth = AuthConfig {
            token_url: "https://auth.test/token".into(),
            client_id: "cli".into(),
            client_secret: Some("hunter2".into()),
        };
        assert!(!format!("{auth:?}").contains("hunter2"));
    }
}
