//! Declarative request templates
//!
//! A [`RequestTemplate`] describes a call relative to the client's base URL.
//! `build` renders it into a [`RequestDescriptor`] carrying the current
//! access token.

use std::collections::BTreeMap;
use std::time::Duration;

use reauth_domain::{ApiError, HttpMethod, RequestDescriptor, Result};
use serde::Serialize;
use url::Url;

use crate::errors::InfraError;

/// Request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// Pre-serialized JSON, sent with `content-type: application/json`.
    Json(Vec<u8>),
    /// Arbitrary bytes with an explicit content type.
    Raw {
        /// `content-type` header value.
        content_type: String,
        /// Body bytes.
        bytes: Vec<u8>,
    },
}

impl RequestBody {
    fn content_type(&self) -> &str {
        match self {
            Self::Json(_) => "application/json",
            Self::Raw { content_type, .. } => content_type,
        }
    }

    fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Json(bytes) | Self::Raw { bytes, .. } => bytes,
        }
    }
}

/// Method, path template, parameters and body of one API call.
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    method: HttpMethod,
    path: String,
    path_params: BTreeMap<String, String>,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<RequestBody>,
    deadline: Option<Duration>,
}

impl RequestTemplate {
    /// `path` may contain `{name}` placeholders filled by [`Self::path_param`].
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            path_params: BTreeMap::new(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            deadline: None,
        }
    }

    /// `GET path`.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// `POST path`.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// `PUT path`.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    /// `DELETE path`.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// HTTP method.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Unexpanded path template.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Value substituted for `{name}` in the path, percent-encoded.
    pub fn path_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.path_params.insert(name.into(), value.to_string());
        self
    }

    /// Append a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Set a request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Serialize `body` as the JSON payload.
    ///
    /// # Errors
    /// Returns `ApiError::InvalidRequest` if `body` cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        let bytes = serde_json::to_vec(body).map_err(|err| ApiError::from(InfraError::from(err)))?;
        self.body = Some(RequestBody::Json(bytes));
        Ok(self)
    }

    /// Send `bytes` as-is with the given content type.
    pub fn raw_body(mut self, content_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.body = Some(RequestBody::Raw { content_type: content_type.into(), bytes: bytes.into() });
        self
    }

    /// Per-request deadline.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Render the template against `base_url`.
    ///
    /// Paths that are already absolute `http(s)` URLs are used as given.
    ///
    /// # Errors
    /// Returns `ApiError::InvalidRequest` for a missing or unused path
    /// parameter, an unterminated placeholder, or a URL that does not parse.
    pub fn build(&self, base_url: &str, auth_token: Option<&str>) -> Result<RequestDescriptor> {
        let url = self.render_url(base_url)?;

        let mut builder = RequestDescriptor::builder(self.method, url.as_str());
        if let Some(body) = &self.body {
            builder = builder.header("content-type", body.content_type());
        }
        // Explicit headers win over the body's content type.
        builder = builder.headers(self.headers.iter().map(|(k, v)| (k.as_str(), v.clone())));
        if let Some(token) = auth_token {
            builder = builder.auth_token(token);
        }
        if let Some(body) = self.body.clone() {
            builder = builder.body(body.into_bytes());
        }
        if let Some(deadline) = self.deadline {
            builder = builder.deadline(deadline);
        }

        builder.build()
    }

    fn render_url(&self, base_url: &str) -> Result<Url> {
        let path = render_path(&self.path, &self.path_params)?;

        let joined = if path.starts_with("http://") || path.starts_with("https://") {
            path
        } else if path.is_empty() {
            base_url.to_string()
        } else {
            format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
        };

        let mut url = Url::parse(&joined).map_err(|err| ApiError::from(InfraError::from(err)))?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Ok(url)
    }
}

fn render_path(template: &str, params: &BTreeMap<String, String>) -> Result<String> {
    let mut rendered = String::with_capacity(template.len());
    let mut used = 0usize;
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or_else(|| {
            ApiError::InvalidRequest(format!("unterminated placeholder in path {template:?}"))
        })?;
        let name = &after[..close];
        let value = params.get(name).ok_or_else(|| {
            ApiError::InvalidRequest(format!("missing path parameter {name:?} for {template:?}"))
        })?;
        rendered.push_str(&urlencoding::encode(value));
        used += 1;
        rest = &after[close + 1..];
    }
    rendered.push_str(rest);

    if used < params.len() {
        let unknown: Vec<&str> = params
            .keys()
            .map(String::as_str)
            .filter(|name| !template.contains(&format!("{{{name}}}")))
            .collect();
        if !unknown.is_empty() {
            return Err(ApiError::InvalidRequest(format!(
                "unknown path parameter(s) {unknown:?} for {template:?}"
            )));
        }
    }

    Ok(rendered)
}
