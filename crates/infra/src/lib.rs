//! # Reauth Infrastructure
//!
//! Infrastructure implementations of the core ports plus the client facade.
//!
//! This crate contains:
//! - `HttpTransport`, the reqwest-backed `Transport`
//! - `TokenRefresher`, an OAuth refresh-token `Reauthenticator`
//! - Request templates, JSON decoding and the `ApiClient` facade
//! - Configuration loading and tracing initialisation
//!
//! ## Architecture
//! - Implements traits defined in `reauth-core`
//! - Depends on `reauth-domain` and `reauth-core`
//! - Contains all "impure" code (network, files, environment)

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use api::{decode_json, ApiClient, ApiClientBuilder, RequestBody, RequestTemplate};
pub use auth::{CredentialStore, Credentials, DenyingReauthenticator, TokenRefresher};
pub use http::{HttpTransport, HttpTransportBuilder};
pub use observability::init_tracing;
