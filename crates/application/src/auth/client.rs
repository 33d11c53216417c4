//! Authenticated request wrapper
//!
//! The one place that attaches bearer tokens to provider API calls and
//! reacts to 401 responses.

use std::sync::Arc;

use carmart_domain::{ApiRequest, ApiResponse, AuthError, ProviderId};
use tracing::{debug, warn};

use super::{ProviderRegistry, TokenLifecycleManager};
use crate::ports::{HttpTransport, TransportError};

/// Failure of an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// No usable token could be obtained, or the API kept rejecting it.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The downstream call produced no response.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Sends requests to provider APIs with a valid bearer token.
#[derive(Clone)]
pub struct AuthenticatedClient {
    manager: TokenLifecycleManager,
    transport: Arc<dyn HttpTransport>,
}

impl AuthenticatedClient {
    /// Creates a client that obtains tokens from `manager`.
    #[must_use]
    pub fn new(manager: TokenLifecycleManager, transport: Arc<dyn HttpTransport>) -> Self {
        Self { manager, transport }
    }

    /// Registry used to resolve provider API URLs.
    #[must_use]
    pub fn registry(&self) -> &ProviderRegistry {
        self.manager.registry()
    }

    /// Sends `request` on behalf of `provider`.
    ///
    /// A 401 answer distrusts the token and triggers exactly one retry with a
    /// refreshed token. Every other status is returned as is.
    ///
    /// # Errors
    /// - [`RequestError::Auth`] if no token is available, or with
    ///   [`AuthError::AuthenticationRequired`] after a second 401.
    /// - [`RequestError::Transport`] if the call produced no response.
    pub async fn request(
        &self,
        provider: ProviderId,
        request: ApiRequest,
    ) -> Result<ApiResponse, RequestError> {
        for attempt in 0..2 {
            let token = self.manager.get_valid_access_token(provider).await?;
            let response = self.transport.send(request.with_bearer(&token)).await?;

            if !response.is_unauthorized() {
                return Ok(response);
            }

            self.manager.distrust(provider, &token);
            if attempt == 0 {
                debug!(%provider, url = %request.url, "401 from provider API, retrying once");
            }
        }

        warn!(%provider, url = %request.url, "provider API rejected a refreshed token");
        Err(AuthError::AuthenticationRequired { provider }.into())
    }
}
