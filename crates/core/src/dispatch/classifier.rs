//! Response classification
//!
//! Pure mapping from a transport result to the outcome that drives the
//! dispatcher's next step. The raw response or error is carried through
//! untouched.

use reauth_domain::{ApiError, RawResponse, TransportError};

/// Outcome category of one transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// 2xx
    Success(RawResponse),
    /// 401
    Unauthorized(RawResponse),
    /// 429
    RateLimited(RawResponse),
    /// 5xx
    ServerError(RawResponse),
    /// Any other non-2xx status (other 4xx, unfollowed 3xx, 1xx)
    ClientError(RawResponse),
    /// No response reached the client
    NetworkError(TransportError),
}

impl Classification {
    /// Stable label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Unauthorized(_) => "unauthorized",
            Self::RateLimited(_) => "rate_limited",
            Self::ServerError(_) => "server_error",
            Self::ClientError(_) => "client_error",
            Self::NetworkError(_) => "network_error",
        }
    }

    /// Convert into the value delivered to the caller.
    ///
    /// `Unauthorized` converts to `ApiError::Unauthorized`, which is only
    /// delivered once the retry budget is gone.
    pub fn into_result(self) -> Result<RawResponse, ApiError> {
        match self {
            Self::Success(response) => Ok(response),
            Self::Unauthorized(response) => Err(ApiError::Unauthorized { response }),
            Self::RateLimited(response) => Err(ApiError::RateLimited { response }),
            Self::ServerError(response) => Err(ApiError::Server { response }),
            Self::ClientError(response) => Err(ApiError::Client { response }),
            Self::NetworkError(error) => Err(ApiError::Network(error)),
        }
    }
}

/// Classify the result of one transport call.
pub fn classify(result: Result<RawResponse, TransportError>) -> Classification {
    let response = match result {
        Ok(response) => response,
        Err(error) => return Classification::NetworkError(error),
    };

    match response.status() {
        200..=299 => Classification::Success(response),
        401 => Classification::Unauthorized(response),
        429 => Classification::RateLimited(response),
        500..=599 => Classification::ServerError(response),
        _ => Classification::ClientError(response),
    }
}
