//! Shared handler state and its assembly from settings.

use std::sync::Arc;

use carmart_application::ports::TokenCache;
use carmart_application::{
    AuthenticatedClient, ProviderRegistry, SessionCleanup, SignIn, TokenLifecycleManager,
};
use carmart_infrastructure::{
    CacheBackend, InMemoryTokenCache, ProviderHttpClient, RedisTokenCache, ReqwestTransport,
    Settings, SystemClock,
};
use tracing::info;

use crate::cookie::CookiePolicy;
use crate::error::StartupError;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Credential login and provider switching.
    pub sign_in: SignIn,
    /// Sign-out across all providers.
    pub cleanup: SessionCleanup,
    /// Bearer-authenticated provider API calls.
    pub client: AuthenticatedClient,
    /// Session cookie attributes.
    pub cookies: CookiePolicy,
}

impl AppState {
    /// Wires the flows over `cache` and HTTP adapters configured by
    /// `settings`.
    ///
    /// # Errors
    /// Returns [`StartupError`] if the outbound HTTP client cannot be built.
    pub fn new(
        registry: ProviderRegistry,
        cache: Arc<dyn TokenCache>,
        settings: &Settings,
    ) -> Result<Self, StartupError> {
        let provider_client =
            Arc::new(ProviderHttpClient::new().with_timeout(settings.auth.provider_timeout()));
        let manager = TokenLifecycleManager::new(
            Arc::new(registry),
            cache,
            provider_client.clone(),
            Arc::new(SystemClock::new()),
            settings.auth.clone(),
        );

        Ok(Self {
            sign_in: SignIn::new(manager.clone(), provider_client),
            cleanup: SessionCleanup::new(manager.clone()),
            client: AuthenticatedClient::new(manager, Arc::new(ReqwestTransport::new()?)),
            cookies: CookiePolicy {
                secure: settings.server.secure_cookies,
                max_age_secs: settings.server.session_max_age_secs,
            },
        })
    }

    /// Builds the full state, including the configured cache backend.
    ///
    /// # Errors
    /// Returns [`StartupError`] if providers or the cache are misconfigured.
    pub fn from_settings(settings: &Settings) -> Result<Self, StartupError> {
        let cache: Arc<dyn TokenCache> = match settings.cache.backend {
            CacheBackend::Redis => {
                info!(prefix = %settings.cache.key_prefix, "using redis token cache");
                Arc::new(RedisTokenCache::open(
                    &settings.cache.redis_url,
                    settings.cache.key_prefix.clone(),
                )?)
            }
            CacheBackend::Memory => {
                info!("using in-memory token cache");
                Arc::new(InMemoryTokenCache::new())
            }
        };

        Self::new(settings.registry()?, cache, settings)
    }
}
