//! Conversions from external infrastructure errors into domain errors.

use reauth_domain::{ApiError, TransportError, TransportErrorKind};
use reqwest::Error as HttpError;
use thiserror::Error;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct InfraError(#[from] pub ApiError);

impl From<InfraError> for ApiError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → TransportError */
/* -------------------------------------------------------------------------- */

/// Classify a reqwest failure that happened before a status was available.
pub fn transport_error(err: &HttpError) -> TransportError {
    let kind = if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if is_connect(err) {
        TransportErrorKind::Connect
    } else if err.is_body() || err.is_decode() {
        TransportErrorKind::Body
    } else if err.is_builder() || err.is_request() || err.is_redirect() {
        TransportErrorKind::Request
    } else {
        TransportErrorKind::Other
    };

    TransportError::new(kind, err.to_string())
}

#[cfg(not(target_arch = "wasm32"))]
fn is_connect(err: &HttpError) -> bool {
    err.is_connect()
}

#[cfg(target_arch = "wasm32")]
fn is_connect(_err: &HttpError) -> bool {
    false
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(ApiError::Network(transport_error(&value)))
    }
}

/* -------------------------------------------------------------------------- */
/* url / serde / toml → ApiError */
/* -------------------------------------------------------------------------- */

impl From<url::ParseError> for InfraError {
    fn from(value: url::ParseError) -> Self {
        InfraError(ApiError::InvalidRequest(format!("invalid URL: {value}")))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(ApiError::InvalidRequest(format!("failed to serialize body: {value}")))
    }
}

impl From<toml::de::Error> for InfraError {
    fn from(value: toml::de::Error) -> Self {
        InfraError(ApiError::Config(format!("Invalid TOML: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
