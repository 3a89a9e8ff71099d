//! OAuth refresh-token reauthentication
//!
//! [`TokenRefresher`] is the production [`Reauthenticator`]: it exchanges the
//! stored refresh token at the configured token endpoint and writes the
//! renewed tokens back into the shared [`CredentialStore`].

use std::time::Duration;

use async_trait::async_trait;
use reauth_core::Reauthenticator;
use reauth_domain::constants::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use reauth_domain::{ApiError, AuthConfig, RefreshOutcome, RequestDescriptor, Result};
use reqwest::Client as ReqwestClient;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::credentials::{CredentialStore, Credentials};
use crate::errors::{transport_error, InfraError};
use crate::http::read_response;

/// Standard OAuth 2.0 token response (RFC 6749 §5.1); only the fields the
/// client uses.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Renews the access token with a `refresh_token` grant.
#[derive(Debug, Clone)]
pub struct TokenRefresher {
    config: AuthConfig,
    store: CredentialStore,
    client: ReqwestClient,
}

impl TokenRefresher {
    /// # Errors
    /// Returns `ApiError::Network` if the HTTP client cannot be constructed.
    pub fn new(config: AuthConfig, store: CredentialStore) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(DEFAULT_USER_AGENT)
            .no_proxy()
            .build()
            .map_err(|err| ApiError::from(InfraError::from(err)))?;

        Ok(Self::with_client(config, store, client))
    }

    /// Use a preconfigured reqwest client for the token endpoint.
    pub fn with_client(config: AuthConfig, store: CredentialStore, client: ReqwestClient) -> Self {
        Self { config, store, client }
    }

    /// Store the refresher writes renewed tokens into.
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    async fn exchange(&self, refresh_token: &str) -> Result<RefreshOutcome> {
        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("refresh_token", refresh_token),
        ];
        if let Some(secret) = &self.config.client_secret {
            params.push(("client_secret", secret.as_str()));
        }

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|err| ApiError::Network(transport_error(&err)))?;

        let raw = read_response(response).await.map_err(ApiError::Network)?;
        let status = raw.status();

        match status {
            200..=299 => {}
            400 | 401 => {
                warn!(status, body = %raw.body_excerpt(200), "token endpoint rejected refresh token");
                return Ok(RefreshOutcome::Denied);
            }
            500..=599 => return Err(ApiError::Server { response: raw }),
            _ => return Err(ApiError::Client { response: raw }),
        }

        let tokens: TokenResponse = serde_json::from_slice(raw.body()).map_err(|err| {
            ApiError::Parse { message: format!("invalid token response: {err}"), response: raw.clone() }
        })?;

        // Providers that do not rotate refresh tokens omit the field.
        let refresh_token = tokens.refresh_token.or_else(|| Some(refresh_token.to_string()));
        self.store.replace(Credentials::new(tokens.access_token.clone(), refresh_token)).await;

        info!(expires_in = ?tokens.expires_in, "access token renewed");
        Ok(RefreshOutcome::renewed(tokens.access_token))
    }
}

#[async_trait]
impl Reauthenticator for TokenRefresher {
    async fn reauthenticate(&self, trigger: &RequestDescriptor) -> Result<RefreshOutcome> {
        debug!(trigger = %trigger.id().short(), url = %trigger.url(), "refreshing access token");

        let Some(refresh_token) = self.store.refresh_token().await else {
            warn!("no refresh token available; refresh denied");
            return Ok(RefreshOutcome::Denied);
        };

        self.exchange(&refresh_token).await
    }
}

/// Reauthenticator used when no token endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyingReauthenticator;

#[async_trait]
impl Reauthenticator for DenyingReauthenticator {
    async fn reauthenticate(&self, trigger: &RequestDescriptor) -> Result<RefreshOutcome> {
        debug!(trigger = %trigger.id().short(), "no token endpoint configured; refresh denied");
        Ok(RefreshOutcome::Denied)
    }
}
