//! Identity provider ports: token refresh and credential login

use async_trait::async_trait;
use carmart_domain::{ProviderConfig, TokenPair};

/// Errors returned by a provider's refresh endpoint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    /// The provider rejected the refresh token (4xx). Retrying cannot help.
    #[error("refresh token rejected with status {status}")]
    Rejected {
        /// HTTP status returned by the provider.
        status: u16,
    },

    /// Transient failure: network error, 5xx, or an unusable success body.
    #[error("refresh endpoint unavailable: {message}")]
    Unavailable {
        /// HTTP status, if a response was received.
        status: Option<u16>,
        /// Description of the failure.
        message: String,
    },
}

/// Errors returned by a provider's login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    /// The provider refused the credentials (4xx).
    #[error("credentials rejected with status {status}")]
    Rejected {
        /// HTTP status returned by the provider.
        status: u16,
    },

    /// The provider could not be reached or failed (5xx, bad body).
    #[error("login endpoint unavailable: {0}")]
    Unavailable(String),
}

/// Port for exchanging a refresh token at a provider's refresh endpoint.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Exchanges `refresh_token` for a new token pair.
    ///
    /// # Errors
    /// Returns [`RefreshError::Rejected`] when the provider refuses the
    /// token and [`RefreshError::Unavailable`] for transient failures.
    async fn refresh(
        &self,
        provider: &ProviderConfig,
        refresh_token: &str,
    ) -> Result<TokenPair, RefreshError>;
}

/// Port for exchanging user credentials at a provider's login endpoint.
///
/// Credentials are forwarded as an opaque JSON document; their shape is a
/// contract between the browser and the provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Performs the login call.
    ///
    /// # Errors
    /// Returns [`LoginError`] if the provider refuses or cannot be reached.
    async fn login(
        &self,
        provider: &ProviderConfig,
        credentials: &serde_json::Value,
    ) -> Result<TokenPair, LoginError>;
}
