//! Request descriptors and their stable identity
//!
//! A [`RequestDescriptor`] is the fully built, immutable description of one
//! HTTP call. Its [`RequestId`] is derived from the method, URL, headers and
//! body, so two descriptors built from the same logical inputs share an
//! identity. The bearer token and the deadline are deliberately left out of
//! the identity: a replay carrying a refreshed credential is still the same
//! request.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{ApiError, Result};
use crate::impl_token_conversions;

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
    /// `HEAD`
    Head,
    /// `OPTIONS`
    Options,
}

impl_token_conversions!(HttpMethod {
    Get => "GET",
    Post => "POST",
    Put => "PUT",
    Patch => "PATCH",
    Delete => "DELETE",
    Head => "HEAD",
    Options => "OPTIONS",
});

/// Stable identity of a request (hex-encoded BLAKE3 digest).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(String);

impl RequestId {
    /// Full hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First twelve hex characters, enough to tell requests apart in logs.
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }

    fn derive(
        method: HttpMethod,
        url: &str,
        headers: &BTreeMap<String, String>,
        body: Option<&[u8]>,
    ) -> Self {
        let mut hasher = blake3::Hasher::new();
        // Every field is length-prefixed so that adjacent fields cannot
        // bleed into each other ("ab" + "c" vs "a" + "bc").
        let mut field = |bytes: &[u8]| {
            hasher.update(&(bytes.len() as u64).to_le_bytes());
            hasher.update(bytes);
        };

        field(method.as_str().as_bytes());
        field(url.as_bytes());
        field(&(headers.len() as u64).to_le_bytes());
        for (name, value) in headers {
            field(name.as_bytes());
            field(value.as_bytes());
        }
        match body {
            Some(body) => {
                field(&[1]);
                field(body);
            }
            None => field(&[0]),
        }

        Self(hex::encode(hasher.finalize().as_bytes()))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable description of one HTTP call.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    id: RequestId,
    method: HttpMethod,
    url: String,
    headers: BTreeMap<String, String>,
    auth_token: Option<String>,
    body: Option<Vec<u8>>,
    deadline: Option<Duration>,
}

impl RequestDescriptor {
    /// Start building a descriptor for `method` against an absolute `url`.
    pub fn builder(method: HttpMethod, url: impl Into<String>) -> RequestDescriptorBuilder {
        RequestDescriptorBuilder {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            auth_token: None,
            body: None,
            deadline: None,
        }
    }

    /// Identity used for retry accounting.
    pub fn id(&self) -> &RequestId {
        &self.id
    }

    /// HTTP method.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Absolute URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Headers keyed by lowercase name.
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Bearer token, if the request is authenticated.
    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    /// Request body bytes.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Caller-supplied bound on the transport call, if any.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Copy of this descriptor carrying `token` as its bearer credential.
    ///
    /// The identity is unchanged.
    #[must_use]
    pub fn with_auth_token(&self, token: impl Into<String>) -> Self {
        Self { auth_token: Some(token.into()), ..self.clone() }
    }
}

impl fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("id", &self.id.short())
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("body_len", &self.body.as_ref().map(Vec::len))
            .field("deadline", &self.deadline)
            .finish()
    }
}

/// Builder for [`RequestDescriptor`].
#[derive(Debug, Clone)]
pub struct RequestDescriptorBuilder {
    method: HttpMethod,
    url: String,
    headers: BTreeMap<String, String>,
    auth_token: Option<String>,
    body: Option<Vec<u8>>,
    deadline: Option<Duration>,
}

impl RequestDescriptorBuilder {
    /// Add a header. Names are case-insensitive; a repeated name replaces the
    /// earlier value.
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Add several headers at once.
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self = self.header(name, value);
        }
        self
    }

    /// Bearer token to send. Not part of the identity.
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Request body. Part of the identity.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Per-request deadline overriding the dispatcher default.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Finish the descriptor and derive its identity.
    ///
    /// # Errors
    /// Returns `ApiError::InvalidRequest` when the URL is empty or a header
    /// name is empty.
    pub fn build(self) -> Result<RequestDescriptor> {
        if self.url.trim().is_empty() {
            return Err(ApiError::InvalidRequest("request URL must not be empty".into()));
        }
        if self.headers.keys().any(String::is_empty) {
            return Err(ApiError::InvalidRequest("header names must not be empty".into()));
        }

        let id = RequestId::derive(self.method, &self.url, &self.headers, self.body.as_deref());

        Ok(RequestDescriptor {
            id,
            method: self.method,
            url: self.url,
            headers: self.headers,
            auth_token: self.auth_token,
            body: self.body,
            deadline: self.deadline,
        })
    }
}
