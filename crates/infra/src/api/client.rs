//! API client facade
//!
//! Builds descriptors from [`RequestTemplate`]s with the current access token
//! and runs them through the [`Dispatcher`], which handles 401 recovery.

use std::sync::Arc;
use std::time::Duration;

use reauth_core::{Dispatcher, DispatcherConfig, Reauthenticator, Transport};
use reauth_domain::constants::HEALTH_CHECK_TIMEOUT_SECS;
use reauth_domain::{ApiError, ClientConfig, HttpMethod, RawResponse, RequestDescriptor, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::decode::decode_json;
use super::request::RequestTemplate;
use crate::auth::{CredentialStore, DenyingReauthenticator, TokenRefresher};
use crate::http::HttpTransport;

/// Authenticated API client.
#[derive(Clone)]
pub struct ApiClient {
    dispatcher: Dispatcher,
    transport: Arc<dyn Transport>,
    credentials: CredentialStore,
    config: ClientConfig,
}

impl ApiClient {
    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Wire the production collaborators for `config`: an [`HttpTransport`]
    /// and, when `auth` is configured, a [`TokenRefresher`].
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the configuration is invalid.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::builder().config(config.clone()).build()
    }

    /// Configuration the client was built from.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Store holding the current tokens.
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Underlying dispatcher, mostly for stats.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Build `template` with the current access token and execute it.
    ///
    /// # Errors
    /// Any error from [`RequestTemplate::build`] or [`Dispatcher::execute`].
    #[instrument(skip(self, template), fields(method = %template.method(), path = %template.path()))]
    pub async fn send(&self, template: &RequestTemplate) -> Result<RawResponse> {
        let token = self.credentials.access_token().await;
        if token.is_none() {
            debug!("no access token stored; sending unauthenticated");
        }

        let descriptor = template.build(&self.config.base_url, token.as_deref())?;
        let response = self.dispatcher.execute(descriptor).await?;

        debug!(status = response.status(), "request succeeded");
        Ok(response)
    }

    /// Execute `template` and decode the JSON response.
    ///
    /// # Errors
    /// As [`Self::send`], plus `ApiError::Parse` for an undecodable body.
    pub async fn fetch<T: DeserializeOwned>(&self, template: &RequestTemplate) -> Result<T> {
        decode_json(self.send(template).await?)
    }

    /// # Errors
    /// As [`Self::fetch`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.fetch(&RequestTemplate::get(path)).await
    }

    /// # Errors
    /// As [`Self::fetch`], plus `ApiError::InvalidRequest` if `body` cannot
    /// be serialized.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.fetch(&RequestTemplate::post(path).json(body)?).await
    }

    /// Unauthenticated `GET {base_url}/health`, bypassing the dispatcher.
    ///
    /// # Returns
    ///
    /// `true` for a 2xx response, `false` for any other status
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if no response arrived in time
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/health", self.config.base_url.trim_end_matches('/'));
        let descriptor = RequestDescriptor::builder(HttpMethod::Get, url)
            .deadline(Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS))
            .build()?;

        match self.transport.send(&descriptor).await {
            Ok(response) if response.is_success() => {
                info!("API is healthy");
                Ok(true)
            }
            Ok(response) => {
                warn!(status = response.status(), "API returned non-success status");
                Ok(false)
            }
            Err(err) => {
                warn!(error = %err, "Health check failed");
                Err(ApiError::Network(err))
            }
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ApiClient`]
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ClientConfig>,
    credentials: Option<CredentialStore>,
    transport: Option<Arc<dyn Transport>>,
    reauthenticator: Option<Arc<dyn Reauthenticator>>,
}

impl ApiClientBuilder {
    /// Client configuration (required).
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Share an existing credential store (e.g. one seeded at startup).
    pub fn credentials(mut self, credentials: CredentialStore) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Replace the default [`HttpTransport`].
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the reauthenticator derived from `config.auth`.
    pub fn reauthenticator(mut self, reauthenticator: Arc<dyn Reauthenticator>) -> Self {
        self.reauthenticator = Some(reauthenticator);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` if no configuration was given or it fails
    /// validation, or an error from constructing the default collaborators.
    pub fn build(self) -> Result<ApiClient> {
        let config =
            self.config.ok_or_else(|| ApiError::Config("client configuration not set".into()))?;
        config.validate()?;

        let credentials = self.credentials.unwrap_or_default();

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => {
                let mut builder = HttpTransport::builder()
                    .timeout(config.timeout())
                    .default_headers(&config.default_headers);
                if let Some(agent) = &config.user_agent {
                    builder = builder.user_agent(agent.clone());
                }
                Arc::new(builder.build()?)
            }
        };

        let reauthenticator: Arc<dyn Reauthenticator> = match (self.reauthenticator, &config.auth) {
            (Some(reauthenticator), _) => reauthenticator,
            (None, Some(auth)) => Arc::new(TokenRefresher::new(auth.clone(), credentials.clone())?),
            (None, None) => {
                debug!("no token endpoint configured; refreshes will be denied");
                Arc::new(DenyingReauthenticator)
            }
        };

        let dispatcher = Dispatcher::new(
            Arc::clone(&transport),
            reauthenticator,
            DispatcherConfig {
                retry_budget: config.retry_budget,
                default_deadline: Some(config.timeout()),
                refresh_timeout: config.refresh_timeout(),
            },
        );

        Ok(ApiClient { dispatcher, transport, credentials, config })
    }
}
