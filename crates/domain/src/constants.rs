//! Domain constants
//!
//! Centralized defaults used by configuration and the dispatcher.

/// Retries granted to a request identity after a successful refresh.
pub const DEFAULT_RETRY_BUDGET: u32 = 3;

/// Default deadline for a single transport call, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Deadline used by `ApiClient::health_check`, in seconds.
pub const HEALTH_CHECK_TIMEOUT_SECS: u64 = 5;

/// Fallback wait suggested for a 429 without a usable `Retry-After` header.
pub const DEFAULT_RATE_LIMIT_DELAY_SECS: u64 = 60;

/// Log filter used when neither config nor `RUST_LOG` sets one.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// `User-Agent` sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("reauth/", env!("CARGO_PKG_VERSION"));

/// Environment variable prefix used by the configuration loader.
pub const ENV_PREFIX: &str = "REAUTH_";
