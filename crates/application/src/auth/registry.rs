//! Provider registry
//!
//! Resolves a [`ProviderId`] to its endpoints and cache namespace. The
//! provider set is closed, so lookups are total once the registry exists.

use carmart_domain::{ProviderConfig, ProviderId};

use crate::ports::SessionHandle;

/// Errors raised while assembling the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A configuration was supplied in the slot of another provider.
    #[error("configuration for {found} supplied as {expected}")]
    Mismatch {
        /// Slot being filled.
        expected: ProviderId,
        /// Provider named by the configuration.
        found: ProviderId,
    },

    /// Two providers would share one cache entry.
    #[error("providers share cache namespace {0}")]
    SharedNamespace(String),
}

/// Static mapping from provider identifier to its configuration.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    dummy: ProviderConfig,
    backend: ProviderConfig,
    default_provider: ProviderId,
}

impl ProviderRegistry {
    /// Creates a registry from one configuration per provider.
    ///
    /// # Errors
    /// Returns [`RegistryError`] if a configuration is in the wrong slot or
    /// the namespaces collide.
    pub fn new(
        dummy: ProviderConfig,
        backend: ProviderConfig,
        default_provider: ProviderId,
    ) -> Result<Self, RegistryError> {
        for (expected, config) in [(ProviderId::Dummy, &dummy), (ProviderId::Backend, &backend)] {
            if config.id != expected {
                return Err(RegistryError::Mismatch {
                    expected,
                    found: config.id,
                });
            }
        }
        if dummy.cache_namespace == backend.cache_namespace {
            return Err(RegistryError::SharedNamespace(dummy.cache_namespace));
        }

        Ok(Self {
            dummy,
            backend,
            default_provider,
        })
    }

    /// Returns the configuration of `provider`.
    #[must_use]
    pub const fn get(&self, provider: ProviderId) -> &ProviderConfig {
        match provider {
            ProviderId::Dummy => &self.dummy,
            ProviderId::Backend => &self.backend,
        }
    }

    /// Returns the cache key holding `provider`'s token record.
    #[must_use]
    pub fn cache_key(&self, provider: ProviderId) -> &str {
        &self.get(provider).cache_namespace
    }

    /// Iterates over every provider configuration.
    pub fn all(&self) -> impl Iterator<Item = &ProviderConfig> {
        ProviderId::all().iter().map(|id| self.get(*id))
    }

    /// Provider used when a request names none.
    #[must_use]
    pub const fn default_provider(&self) -> ProviderId {
        self.default_provider
    }

    /// Makes `provider` the active one for `session`.
    ///
    /// This is a pure selection: no token is copied, refreshed or deleted.
    pub fn activate<'a>(
        &'a self,
        session: &dyn SessionHandle,
        provider: ProviderId,
    ) -> &'a ProviderConfig {
        session.activate(provider);
        self.get(provider)
    }
}
