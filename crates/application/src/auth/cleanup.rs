//! Sign-out coordination
//!
//! Logging out ends the user's session with every provider, not only the
//! active one.

use carmart_domain::ProviderId;
use tracing::{info, warn};

use super::TokenLifecycleManager;
use crate::ports::{CacheError, SessionHandle};

/// A provider record that could not be deleted during sign-out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to delete {provider} token record: {source}")]
pub struct CleanupError {
    /// First provider whose delete failed.
    pub provider: ProviderId,
    /// Underlying cache failure.
    pub source: CacheError,
}

/// Deletes all provider records and clears the front-end session.
#[derive(Clone)]
pub struct SessionCleanup {
    manager: TokenLifecycleManager,
}

impl SessionCleanup {
    /// Creates a coordinator over `manager`'s cache and registry.
    #[must_use]
    pub const fn new(manager: TokenLifecycleManager) -> Self {
        Self { manager }
    }

    /// Signs the user out of every provider.
    ///
    /// Safe to repeat. A failed delete does not stop the remaining providers
    /// or the cookie from being cleared.
    ///
    /// # Errors
    /// Returns the first [`CleanupError`] encountered.
    pub async fn sign_out(&self, session: &dyn SessionHandle) -> Result<(), CleanupError> {
        let mut first_error = None;

        for provider in ProviderId::all() {
            if let Err(source) = self.manager.discard(*provider).await {
                warn!(%provider, error = %source, "failed to delete token record on sign-out");
                first_error.get_or_insert(CleanupError {
                    provider: *provider,
                    source,
                });
            }
        }

        session.clear();
        info!(clean = first_error.is_none(), "signed out of all providers");

        first_error.map_or(Ok(()), Err)
    }
}
