//! Error types used throughout the workspace
//!
//! `ApiError` is what callers of the dispatcher receive. Every variant that
//! originates from an HTTP response keeps that response so failures can be
//! diagnosed from the status, headers and body.

use std::time::Duration;

use thiserror::Error;

use crate::constants::DEFAULT_RATE_LIMIT_DELAY_SECS;
use crate::impl_token_conversions;
use crate::types::RawResponse;

/// Kind of transport-level failure (no response was received).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The deadline expired before a response arrived.
    Timeout,
    /// DNS resolution or connection establishment failed.
    Connect,
    /// The request could not be built or sent.
    Request,
    /// The response body could not be read.
    Body,
    /// Anything reqwest could not classify further.
    Other,
}

impl_token_conversions!(TransportErrorKind {
    Timeout => "timeout",
    Connect => "connect",
    Request => "request",
    Body => "body",
    Other => "other",
});

/// Failure reported by a transport when no response was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} failure: {message}")]
pub struct TransportError {
    /// What went wrong.
    pub kind: TransportErrorKind,
    /// Human-readable detail from the transport.
    pub message: String,
}

impl TransportError {
    /// Error of `kind` with `message`.
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    /// Deadline expiry after `after`.
    pub fn timeout(after: Duration) -> Self {
        Self::new(TransportErrorKind::Timeout, format!("no response within {after:?}"))
    }

    /// Connection failure.
    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Connect, message)
    }

    /// `true` for deadline expiry.
    pub fn is_timeout(&self) -> bool {
        self.kind == TransportErrorKind::Timeout
    }
}

/// Categories of API errors, used for logging labels and caller retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorCategory {
    /// 401 after the retry budget ran out, or a denied refresh
    Authentication,
    /// 429
    RateLimit,
    /// 5xx
    Server,
    /// Other 4xx and unexpected statuses
    Client,
    /// No response reached the client
    Network,
    /// A successful response whose body could not be decoded
    Parse,
    /// Configuration, request construction or internal failures
    Config,
}

impl_token_conversions!(ApiErrorCategory {
    Authentication => "authentication",
    RateLimit => "rate_limit",
    Server => "server",
    Client => "client",
    Network => "network",
    Parse => "parse",
    Config => "config",
});

/// Errors surfaced by the dispatcher and the API client
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received (connect failure, timeout, broken body).
    #[error("Network error: {0}")]
    Network(#[from] TransportError),

    /// 401 that could not be recovered by reauthentication.
    #[error("Unauthorized: status {} after exhausting the retry budget", .response.status())]
    Unauthorized {
        /// The final 401.
        response: RawResponse,
    },

    /// 429; never retried automatically.
    #[error("Rate limit exceeded: status {}", .response.status())]
    RateLimited {
        /// The 429, including any `Retry-After`.
        response: RawResponse,
    },

    /// 4xx other than 401 and 429, or an unexpected status.
    #[error("Client error: status {}: {}", .response.status(), .response.body_excerpt(200))]
    Client {
        /// The offending response.
        response: RawResponse,
    },

    /// 5xx.
    #[error("Server error: status {}: {}", .response.status(), .response.body_excerpt(200))]
    Server {
        /// The offending response.
        response: RawResponse,
    },

    /// Successful response whose body could not be decoded.
    #[error("Failed to parse response (status {}): {message}", .response.status())]
    Parse {
        /// Decoder error.
        message: String,
        /// The undecodable response.
        response: RawResponse,
    },

    /// The reauthenticator refused; carries the waiter's last 401.
    #[error("Credential refresh denied: status {}", .response.status())]
    RefreshDenied {
        /// The 401 that queued the request.
        response: RawResponse,
    },

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request could not be built.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invariant violation inside the client.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Unauthorized { .. } | Self::RefreshDenied { .. } => {
                ApiErrorCategory::Authentication
            }
            Self::RateLimited { .. } => ApiErrorCategory::RateLimit,
            Self::Server { .. } => ApiErrorCategory::Server,
            Self::Client { .. } => ApiErrorCategory::Client,
            Self::Network(_) => ApiErrorCategory::Network,
            Self::Parse { .. } => ApiErrorCategory::Parse,
            Self::Config(_) | Self::InvalidRequest(_) | Self::Internal(_) => {
                ApiErrorCategory::Config
            }
        }
    }

    /// The raw response attached to this error, if one was received.
    pub fn response(&self) -> Option<&RawResponse> {
        match self {
            Self::Unauthorized { response }
            | Self::RateLimited { response }
            | Self::Client { response }
            | Self::Server { response }
            | Self::Parse { response, .. }
            | Self::RefreshDenied { response } => Some(response),
            Self::Network(_) | Self::Config(_) | Self::InvalidRequest(_) | Self::Internal(_) => {
                None
            }
        }
    }

    /// HTTP status of the attached response, if any.
    pub fn status(&self) -> Option<u16> {
        self.response().map(RawResponse::status)
    }

    /// Whether a caller-level retry could reasonably succeed.
    ///
    /// The dispatcher itself never retries these; the hint is for callers
    /// that layer their own backoff policy on top.
    pub fn should_retry(&self) -> bool {
        matches!(
            self.category(),
            ApiErrorCategory::RateLimit | ApiErrorCategory::Server | ApiErrorCategory::Network
        )
    }

    /// Suggested wait before a caller-level retry
    pub fn suggested_retry_delay(&self) -> Duration {
        match self {
            Self::RateLimited { response } => response
                .retry_after()
                .unwrap_or(Duration::from_secs(DEFAULT_RATE_LIMIT_DELAY_SECS)),
            Self::Server { .. } => Duration::from_secs(10),
            Self::Network(_) => Duration::from_secs(5),
            _ => Duration::ZERO,
        }
    }
}

/// Result type alias for reauth operations
pub type Result<T> = std::result::Result<T, ApiError>;
