//! Shared credential storage

use std::sync::Arc;

use tokio::sync::RwLock;

/// Access token plus the refresh token used to renew it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Bearer token sent with requests.
    pub access_token: String,
    /// Token exchanged at the token endpoint on 401.
    pub refresh_token: Option<String>,
}

impl Credentials {
    /// Pair an access token with an optional refresh token.
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self { access_token: access_token.into(), refresh_token }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Cloneable handle to the current credentials.
///
/// The client reads the access token from here when building requests and
/// the token refresher writes renewed tokens back.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    inner: Arc<RwLock<Option<Credentials>>>,
}

impl CredentialStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `credentials`.
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self { inner: Arc::new(RwLock::new(Some(credentials))) }
    }

    /// Current access token.
    pub async fn access_token(&self) -> Option<String> {
        self.inner.read().await.as_ref().map(|c| c.access_token.clone())
    }

    /// Current refresh token.
    pub async fn refresh_token(&self) -> Option<String> {
        self.inner.read().await.as_ref().and_then(|c| c.refresh_token.clone())
    }

    /// Copy of the stored credentials.
    pub async fn get(&self) -> Option<Credentials> {
        self.inner.read().await.clone()
    }

    /// Replace the stored credentials.
    pub async fn replace(&self, credentials: Credentials) {
        *self.inner.write().await = Some(credentials);
    }

    /// Forget all tokens.
    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replace_and_clear() {
        let store = CredentialStore::new();
        assert_eq!(store.access_token().await, None);

        store.replace(Credentials::new("a1", Some("r1".into()))).await;
        assert_eq!(store.access_token().await.as_deref(), Some("a1"));
        assert_eq!(store.refresh_token().await.as_deref(), Some("r1"));

        let shared = store.clone();
        shared.replace(Credentials::new("a2", None)).await;
        assert_eq!(store.access_token().await.as_deref(), Some("a2"));
        assert_eq!(store.refresh_token().await, None);

        store.clear().await;
        assert!(shared.get().await.is_none());
    }

    #[test]
    fn debug_redacts_tokens() {
        let rendered = format!("{:?}", Credentials::new("secret-access", Some("secret-refresh".into())));
        assert!(!rendered.contains("secret-access"));
        assert!(!rendered.contains("secret-refresh"));
    }
}
