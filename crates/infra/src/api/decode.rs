//! JSON decoding of raw responses

use reauth_domain::{ApiError, RawResponse, Result};
use serde::de::DeserializeOwned;

/// Decode a successful response body as JSON.
///
/// 204 and 205 carry no body by definition, so they decode from JSON `null`
/// (which suits `()` and `Option<T>`).
///
/// # Errors
/// Returns `ApiError::Parse`, keeping the response, when the body does not
/// match `T`.
pub fn decode_json<T: DeserializeOwned>(response: RawResponse) -> Result<T> {
    let decoded = if matches!(response.status(), 204 | 205) {
        serde_json::from_value(serde_json::Value::Null)
    } else {
        serde_json::from_slice(response.body())
    };

    decoded.map_err(|err| ApiError::Parse {
        message: format!("failed to decode {} body: {err}", response.status()),
        response,
    })
}
