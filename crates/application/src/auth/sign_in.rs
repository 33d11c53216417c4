//! Sign-in and provider switching

use std::sync::Arc;

use carmart_domain::{ProviderConfig, ProviderId, TokenPair};
use tracing::{info, warn};

use super::TokenLifecycleManager;
use crate::ports::{CacheError, IdentityProvider, LoginError, SessionHandle};

/// Errors that can occur while signing in.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignInError {
    /// The provider refused the credentials.
    #[error("{provider} rejected the credentials with status {status}")]
    Rejected {
        /// Provider that was asked.
        provider: ProviderId,
        /// HTTP status it answered with.
        status: u16,
    },

    /// The provider could not be reached or failed.
    #[error("{provider} login unavailable: {message}")]
    Unavailable {
        /// Provider that was asked.
        provider: ProviderId,
        /// Description of the failure.
        message: String,
    },

    /// The issued tokens could not be cached.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Exchanges credentials for tokens and selects the active provider.
#[derive(Clone)]
pub struct SignIn {
    manager: TokenLifecycleManager,
    identity: Arc<dyn IdentityProvider>,
}

impl SignIn {
    /// Creates the sign-in flow.
    #[must_use]
    pub fn new(manager: TokenLifecycleManager, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { manager, identity }
    }

    /// Logs in to `provider` with `credentials`, caches the issued pair and
    /// makes the provider active in `session`.
    ///
    /// # Errors
    /// Returns [`SignInError`] if the provider refuses or fails, or the
    /// tokens cannot be cached. The session is left untouched on error.
    pub async fn sign_in(
        &self,
        provider: ProviderId,
        credentials: &serde_json::Value,
        session: &dyn SessionHandle,
    ) -> Result<(), SignInError> {
        let config = self.manager.registry().get(provider);
        let pair = self
            .identity
            .login(config, credentials)
            .await
            .map_err(|error| {
                warn!(%provider, %error, "sign-in failed");
                match error {
                    LoginError::Rejected { status } => SignInError::Rejected { provider, status },
                    LoginError::Unavailable(message) => {
                        SignInError::Unavailable { provider, message }
                    }
                }
            })?;

        self.complete_sign_in(provider, pair, session).await
    }

    /// Stores a pair obtained out of band and activates `provider`.
    ///
    /// # Errors
    /// Returns [`SignInError::Cache`] if the record cannot be written.
    pub async fn complete_sign_in(
        &self,
        provider: ProviderId,
        pair: TokenPair,
        session: &dyn SessionHandle,
    ) -> Result<(), SignInError> {
        self.manager.store(provider, pair).await?;
        self.manager.registry().activate(session, provider);
        info!(%provider, "signed in");
        Ok(())
    }

    /// Makes `provider` the active one without touching any token record.
    pub fn switch_provider(
        &self,
        provider: ProviderId,
        session: &dyn SessionHandle,
    ) -> &ProviderConfig {
        info!(%provider, "switching active provider");
        self.manager.registry().activate(session, provider)
    }
}
