//! Credential storage and reauthentication

pub mod credentials;
pub mod refresher;

pub use credentials::{CredentialStore, Credentials};
pub use refresher::{DenyingReauthenticator, TokenRefresher};
