//! Port interfaces for request execution
//!
//! These traits define the boundaries between the coordinator and the
//! infrastructure that actually talks to the network.

use async_trait::async_trait;
use reauth_domain::{RawResponse, RefreshOutcome, RequestDescriptor, Result, TransportError};

/// Sends one built request and yields exactly one response or error.
///
/// Implementations must not retry internally; retry decisions belong to the
/// dispatcher.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and return the raw response.
    async fn send(
        &self,
        request: &RequestDescriptor,
    ) -> std::result::Result<RawResponse, TransportError>;
}

/// Obtains a fresh credential after the server rejected the current one.
///
/// Invoked at most once per refresh cycle, with the request whose 401 opened
/// the cycle. An `Err` is treated as [`RefreshOutcome::Denied`].
#[async_trait]
pub trait Reauthenticator: Send + Sync {
    /// Renew the credential.
    async fn reauthenticate(&self, trigger: &RequestDescriptor) -> Result<RefreshOutcome>;
}
