//! reqwest implementation of the transport port

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reauth_core::Transport;
use reauth_domain::constants::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use reauth_domain::{ApiError, HttpMethod, RawResponse, RequestDescriptor, TransportError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Client as ReqwestClient, Method};
use tracing::debug;

use crate::errors::{transport_error, InfraError};

/// reqwest-backed [`Transport`].
///
/// Sends each descriptor exactly once. Status codes are never turned into
/// errors here; the dispatcher classifies them.
#[derive(Clone)]
pub struct HttpTransport {
    client: ReqwestClient,
}

impl HttpTransport {
    /// Start building a new transport.
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }

    /// Convenience constructor with default configuration.
    ///
    /// # Errors
    /// Returns `ApiError::Network` if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, ApiError> {
        Self::builder().build()
    }

    fn request(&self, descriptor: &RequestDescriptor) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(reqwest_method(descriptor.method()), descriptor.url());

        let token = descriptor.auth_token();
        for (name, value) in descriptor.headers() {
            // The bearer token replaces any caller-supplied credential.
            if token.is_some() && name.eq_ignore_ascii_case(AUTHORIZATION.as_str()) {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = descriptor.body() {
            builder = builder.body(body.to_vec());
        }
        if let Some(deadline) = descriptor.deadline() {
            builder = builder.timeout(deadline);
        }

        builder
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport").finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<RawResponse, TransportError> {
        let method = request.method();
        let url = request.url();
        debug!(request_id = %request.id().short(), %method, %url, "sending HTTP request");

        let response = self.request(request).send().await.map_err(|err| {
            debug!(%method, %url, error = %err, "HTTP request failed");
            transport_error(&err)
        })?;

        let raw = read_response(response).await?;
        debug!(%method, %url, status = raw.status(), bytes = raw.body().len(), "received HTTP response");

        Ok(raw)
    }
}

/// Collect status, headers and body of a reqwest response.
///
/// Header values that are not visible ASCII are skipped.
pub(crate) async fn read_response(
    response: reqwest::Response,
) -> Result<RawResponse, TransportError> {
    let mut raw = RawResponse::new(response.status().as_u16());
    for (name, value) in response.headers() {
        if let Ok(value) = value.to_str() {
            raw = raw.with_header(name.as_str(), value);
        }
    }

    let body = response.bytes().await.map_err(|err| transport_error(&err))?;
    Ok(raw.with_body(body.to_vec()))
}

fn reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Options => Method::OPTIONS,
    }
}

/// Builder for [`HttpTransport`].
#[derive(Debug)]
pub struct HttpTransportBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    default_headers: BTreeMap<String, String>,
    accept_invalid_certs: bool,
}

impl Default for HttpTransportBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: None,
            default_headers: BTreeMap::new(),
            accept_invalid_certs: false,
        }
    }
}

impl HttpTransportBuilder {
    /// Client-wide timeout; a descriptor deadline overrides it per request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `User-Agent` header value.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Header sent on every request.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    /// Add every entry of `headers` as a default header.
    pub fn default_headers(mut self, headers: &BTreeMap<String, String>) -> Self {
        self.default_headers.extend(headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Test-only helper to allow insecure TLS (e.g., self-signed certs).
    #[cfg(test)]
    pub fn accept_invalid_certs(mut self, enabled: bool) -> Self {
        self.accept_invalid_certs = enabled;
        self
    }

    /// # Errors
    /// Returns `ApiError::Config` for an unusable default header and
    /// `ApiError::Network` if the client cannot be constructed.
    pub fn build(self) -> Result<HttpTransport, ApiError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.default_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| ApiError::Config(format!("invalid header name {name:?}: {err}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|err| ApiError::Config(format!("invalid value for {name}: {err}")))?;
            headers.insert(name, value);
        }

        let mut builder = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()))
            .default_headers(headers)
            .no_proxy();

        if self.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().map_err(|err| ApiError::from(InfraError::from(err)))?;

        Ok(HttpTransport { client })
    }
}
