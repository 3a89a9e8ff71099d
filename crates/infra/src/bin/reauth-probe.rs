//! Issue one authenticated GET and report the outcome.
//!
//! ```text
//! REAUTH_BASE_URL=https://api.example.com \
//! REAUTH_ACCESS_TOKEN=... REAUTH_REFRESH_TOKEN=... \
//! REAUTH_TOKEN_URL=https://auth.example.com/token REAUTH_CLIENT_ID=cli \
//! reauth-probe /v1/me
//! ```

use anyhow::Context;
use reauth_infra::{config, init_tracing, ApiClient, CredentialStore, Credentials, RequestTemplate};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load().context("loading configuration")?;
    init_tracing(&config.logging).context("initialising tracing")?;

    let path = std::env::args().nth(1).unwrap_or_else(|| "/".to_string());

    let credentials = CredentialStore::new();
    if let Ok(access_token) = std::env::var("REAUTH_ACCESS_TOKEN") {
        let refresh_token = std::env::var("REAUTH_REFRESH_TOKEN").ok();
        credentials.replace(Credentials::new(access_token, refresh_token)).await;
    } else {
        tracing::warn!("REAUTH_ACCESS_TOKEN not set; sending without credentials");
    }

    let client = ApiClient::builder().config(config).credentials(credentials).build()?;

    match client.send(&RequestTemplate::get(path.as_str())).await {
        Ok(response) => {
            tracing::info!(
                %path,
                status = response.status(),
                bytes = response.body().len(),
                body = %response.body_excerpt(200),
                "request succeeded"
            );
            Ok(())
        }
        Err(err) => {
            tracing::error!(
                %path,
                category = %err.category(),
                status = ?err.status(),
                error = %err,
                "request failed"
            );
            Err(err.into())
        }
    }
}
