//! Identity provider HTTP client.
//!
//! Talks to a provider's login and refresh endpoints. Both answer with a
//! JSON `{access, refresh}` pair.

use std::time::Duration;

use async_trait::async_trait;
use carmart_application::ports::{IdentityProvider, LoginError, RefreshError, TokenRefresher};
use carmart_application::settings::DEFAULT_PROVIDER_TIMEOUT_MS;
use carmart_domain::{ProviderConfig, TokenPair};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

/// Token pair as returned by provider endpoints.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access: Option<String>,
    #[serde(default)]
    refresh: Option<String>,
}

impl TokenResponse {
    fn access(&self) -> Option<&str> {
        self.access.as_deref().filter(|value| !value.is_empty())
    }

    fn refresh(&self) -> Option<&str> {
        self.refresh.as_deref().filter(|value| !value.is_empty())
    }
}

/// Adapter for provider login and refresh endpoints.
#[derive(Debug, Clone)]
pub struct ProviderHttpClient {
    http_client: reqwest::Client,
    timeout: Duration,
}

impl ProviderHttpClient {
    /// Creates a client that does not follow redirects.
    ///
    /// Each call is bounded by a 30 second timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_client(
            reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        )
    }

    /// Creates a client over an existing reqwest client.
    #[must_use]
    pub const fn with_client(http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            timeout: Duration::from_millis(DEFAULT_PROVIDER_TIMEOUT_MS),
        }
    }

    /// Overrides the per-call timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn post_json(
        &self,
        url: &Url,
        body: &Value,
    ) -> Result<(reqwest::StatusCode, String), reqwest::Error> {
        let response = self
            .http_client
            .post(url.clone())
            .timeout(self.timeout)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        Ok((status, text))
    }
}

impl Default for ProviderHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenRefresher for ProviderHttpClient {
    async fn refresh(
        &self,
        provider: &ProviderConfig,
        refresh_token: &str,
    ) -> Result<TokenPair, RefreshError> {
        let mut body = Map::new();
        body.insert(
            provider.refresh_field.to_string(),
            Value::String(refresh_token.to_string()),
        );

        let (status, text) = self
            .post_json(&provider.refresh_endpoint, &Value::Object(body))
            .await
            .map_err(|e| RefreshError::Unavailable {
                status: None,
                message: e.to_string(),
            })?;
        debug!(provider = %provider.id, status = status.as_u16(), "refresh endpoint answered");

        if status.is_client_error() {
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(RefreshError::Unavailable {
                status: Some(status.as_u16()),
                message: format!("refresh endpoint returned {status}"),
            });
        }

        let unusable = |message: String| RefreshError::Unavailable {
            status: Some(status.as_u16()),
            message,
        };
        let response: TokenResponse = serde_json::from_str(&text)
            .map_err(|e| unusable(format!("Failed to parse token response: {e}")))?;
        let access = response
            .access()
            .ok_or_else(|| unusable("token response lacks an access token".to_string()))?;

        // Providers that do not rotate refresh tokens omit the field.
        Ok(TokenPair::new(
            access,
            response.refresh().unwrap_or(refresh_token),
        ))
    }
}

#[async_trait]
impl IdentityProvider for ProviderHttpClient {
    async fn login(
        &self,
        provider: &ProviderConfig,
        credentials: &Value,
    ) -> Result<TokenPair, LoginError> {
        let (status, text) = self
            .post_json(&provider.login_endpoint, credentials)
            .await
            .map_err(|e| LoginError::Unavailable(e.to_string()))?;
        debug!(provider = %provider.id, status = status.as_u16(), "login endpoint answered");

        if status.is_client_error() {
            return Err(LoginError::Rejected {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(LoginError::Unavailable(format!(
                "login endpoint returned {status}"
            )));
        }

        let response: TokenResponse = serde_json::from_str(&text)
            .map_err(|e| LoginError::Unavailable(format!("Failed to parse token response: {e}")))?;
        match (response.access(), response.refresh()) {
            (Some(access), Some(refresh)) => Ok(TokenPair::new(access, refresh)),
            _ => Err(LoginError::Unavailable(
                "login response lacks a token".to_string(),
            )),
        }
    }
}
