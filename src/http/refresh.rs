use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;

use crate::session::TokenPair;

pub const REFRESH_PATH: &str = "/api/auth/refresh";

/// Exchanges a refresh token for a new token pair.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair>;
}

/// Calls the backend's refresh endpoint directly, outside the interceptor,
/// so a failing refresh can never trigger another refresh.
pub struct BackendRefresher {
    client: Client,
    url: String,
}

impl BackendRefresher {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            url: format!("{}{}", base_url.trim_end_matches('/'), REFRESH_PATH),
        }
    }
}

#[async_trait]
impl TokenRefresher for BackendRefresher {
    #[tracing::instrument(skip(self, refresh_token))]
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        debug!("POST {}", self.url);

        let response = self
            .client
            .post(&self.url)
            .query(&[("token", refresh_token)])
            .send()
            .await
            .context("Failed to send refresh request")?;

        let response = response
            .error_for_status()
            .context("Refresh token was rejected")?;

        response
            .json::<TokenPair>()
            .await
            .context("Failed to parse refresh response")
    }
}
