//! Token lifecycle manager
//!
//! Hands out a usable access token per provider, refreshing through the
//! provider when the cached one is about to expire. At most one refresh per
//! provider runs at a time in this process; concurrent callers share it.

use std::collections::HashMap;
use std::sync::Arc;

use carmart_domain::{AuthError, ProviderId, TokenPair, TokenRecord, jwt};
use futures::FutureExt as _;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::ProviderRegistry;
use crate::ports::{CacheError, Clock, RefreshError, TokenCache, TokenRefresher};
use crate::settings::AuthSettings;

type RefreshHandle = Shared<BoxFuture<'static, Result<String, AuthError>>>;

/// Process-local bookkeeping for one provider.
#[derive(Default)]
struct ProviderState {
    in_flight: Option<RefreshHandle>,
    /// Advanced by sign-in and sign-out; a refresh started under an older
    /// generation never writes.
    generation: u64,
    /// This process deleted the record after a rejected refresh or the
    /// failure ceiling.
    expired: bool,
    /// Access token the downstream API answered 401 for.
    distrusted: Option<String>,
}

struct Core {
    registry: Arc<ProviderRegistry>,
    cache: Arc<dyn TokenCache>,
    refresher: Arc<dyn TokenRefresher>,
    clock: Arc<dyn Clock>,
    settings: AuthSettings,
    states: Mutex<HashMap<ProviderId, ProviderState>>,
}

/// Owns the read, refresh and write-back cycle of cached token records.
///
/// Cloning is cheap; clones share the single-flight state.
#[derive(Clone)]
pub struct TokenLifecycleManager {
    core: Arc<Core>,
}

impl TokenLifecycleManager {
    /// Creates a manager over the given ports.
    #[must_use]
    pub fn new(
        registry: Arc<ProviderRegistry>,
        cache: Arc<dyn TokenCache>,
        refresher: Arc<dyn TokenRefresher>,
        clock: Arc<dyn Clock>,
        settings: AuthSettings,
    ) -> Self {
        Self {
            core: Arc::new(Core {
                registry,
                cache,
                refresher,
                clock,
                settings,
                states: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Provider registry this manager resolves keys with.
    #[must_use]
    pub fn registry(&self) -> &ProviderRegistry {
        &self.core.registry
    }

    /// Returns an access token for `provider` that is not about to expire.
    ///
    /// A fresh cached token is returned without any network call. Otherwise
    /// the token is refreshed, joining a refresh already in flight for the
    /// same provider.
    ///
    /// # Errors
    /// - [`AuthError::NotAuthenticated`] if no record is cached.
    /// - [`AuthError::SessionExpired`] if the refresh token was rejected or
    ///   the failure ceiling was reached.
    /// - [`AuthError::RefreshFailed`] on a transient refresh failure.
    /// - [`AuthError::Cache`] if the cache failed or held a malformed entry.
    pub async fn get_valid_access_token(&self, provider: ProviderId) -> Result<String, AuthError> {
        let Some(record) = self.core.load(provider).await? else {
            return Err(self.core.absent(provider));
        };

        if !self.core.needs_refresh(provider, &record.access) {
            debug!(%provider, "using cached access token");
            return Ok(record.access);
        }

        self.join_refresh(provider).await
    }

    /// Marks `access` as rejected by the downstream API, so the next request
    /// for `provider` refreshes even if the token's `exp` says otherwise.
    pub fn distrust(&self, provider: ProviderId, access: &str) {
        let mut states = self.core.states.lock();
        states.entry(provider).or_default().distrusted = Some(access.to_string());
        debug!(%provider, "access token distrusted after 401");
    }

    /// Writes a freshly issued pair for `provider`, as after sign-in.
    ///
    /// Any refresh still running for the provider is settled first and its
    /// result discarded.
    ///
    /// # Errors
    /// Returns [`CacheError`] if the write fails.
    pub async fn store(&self, provider: ProviderId, pair: TokenPair) -> Result<(), CacheError> {
        self.forget(provider).await;

        let record = TokenRecord::issued(pair);
        self.core
            .cache
            .set(
                self.core.registry.cache_key(provider),
                &record,
                self.core.settings.record_ttl(),
            )
            .await?;

        info!(%provider, "stored issued token record");
        Ok(())
    }

    /// Drops process-local state for `provider` and waits for a pending
    /// refresh to settle. A refresh that settles afterwards does not write.
    pub async fn forget(&self, provider: ProviderId) {
        let pending = {
            let mut states = self.core.states.lock();
            let state = states.entry(provider).or_default();
            state.generation = state.generation.wrapping_add(1);
            state.expired = false;
            state.distrusted = None;
            state.in_flight.take()
        };

        if let Some(pending) = pending {
            debug!(%provider, "waiting for in-flight refresh before forgetting");
            // The outcome belongs to the session being dropped. Past the
            // deadline the refresh can no longer write: its generation is stale.
            if tokio::time::timeout(self.core.settings.provider_timeout(), pending)
                .await
                .is_err()
            {
                warn!(%provider, "in-flight refresh did not settle, forgetting anyway");
            }
        }
    }

    /// Forgets `provider` and deletes its cached record.
    ///
    /// # Errors
    /// Returns [`CacheError`] if the delete fails.
    pub async fn discard(&self, provider: ProviderId) -> Result<(), CacheError> {
        self.forget(provider).await;
        self.core
            .cache
            .delete(self.core.registry.cache_key(provider))
            .await
    }

    async fn join_refresh(&self, provider: ProviderId) -> Result<String, AuthError> {
        let handle = {
            let mut states = self.core.states.lock();
            let state = states.entry(provider).or_default();
            match &state.in_flight {
                Some(handle) => {
                    debug!(%provider, "joining in-flight refresh");
                    handle.clone()
                }
                None => {
                    let handle = self.spawn_refresh(provider, state.generation);
                    state.in_flight = Some(handle.clone());
                    handle
                }
            }
        };

        handle.await
    }

    /// Runs the refresh on its own task so that dropping the caller that
    /// started it does not cancel it.
    fn spawn_refresh(&self, provider: ProviderId, generation: u64) -> RefreshHandle {
        let core = Arc::clone(&self.core);
        let task = tokio::spawn(async move {
            let _slot = InFlightSlot {
                core: &core,
                provider,
                generation,
            };
            core.refresh(provider, generation).await
        });

        task.map(move |joined| {
            joined.unwrap_or_else(|error| {
                Err(AuthError::RefreshFailed {
                    provider,
                    message: error.to_string(),
                })
            })
        })
        .boxed()
        .shared()
    }
}

impl Core {
    async fn load(&self, provider: ProviderId) -> Result<Option<TokenRecord>, AuthError> {
        let key = self.registry.cache_key(provider);
        match self.cache.get(key).await {
            Ok(record) => Ok(record),
            Err(error @ CacheError::Corrupt { .. }) => {
                warn!(%provider, %error, "discarding corrupt token record");
                self.cache.delete(key).await.map_err(cache_failure)?;
                Ok(None)
            }
            Err(error @ CacheError::Malformed { .. }) => {
                warn!(%provider, %error, "discarding malformed token record");
                if let Err(delete_error) = self.cache.delete(key).await {
                    warn!(%provider, error = %delete_error, "failed to delete malformed record");
                }
                Err(cache_failure(error))
            }
            Err(error) => Err(cache_failure(error)),
        }
    }

    fn absent(&self, provider: ProviderId) -> AuthError {
        let states = self.states.lock();
        if states.get(&provider).is_some_and(|state| state.expired) {
            AuthError::SessionExpired { provider }
        } else {
            AuthError::NotAuthenticated { provider }
        }
    }

    fn needs_refresh(&self, provider: ProviderId, access: &str) -> bool {
        let distrusted = self
            .states
            .lock()
            .get(&provider)
            .and_then(|state| state.distrusted.as_deref())
            == Some(access);

        distrusted
            || jwt::inspect(access, self.settings.expiry_buffer_secs, self.clock.now())
                .needs_refresh()
    }

    fn is_current(&self, provider: ProviderId, generation: u64) -> bool {
        self.states
            .lock()
            .get(&provider)
            .is_some_and(|state| state.generation == generation)
    }

    async fn refresh(&self, provider: ProviderId, generation: u64) -> Result<String, AuthError> {
        let key = self.registry.cache_key(provider);

        // Another process, or a refresh that just finished, may have won.
        let Some(record) = self.load(provider).await? else {
            return Err(self.absent(provider));
        };
        if !self.needs_refresh(provider, &record.access) {
            debug!(%provider, "token already refreshed, skipping provider call");
            return Ok(record.access);
        }

        info!(%provider, attempts = record.refresh_attempts, "refreshing access token");
        let timeout = self.settings.provider_timeout();
        let outcome = tokio::time::timeout(
            timeout,
            self.refresher.refresh(self.registry.get(provider), &record.refresh),
        )
        .await
        .unwrap_or_else(|_| {
            Err(RefreshError::Unavailable {
                status: None,
                message: format!("refresh timed out after {}ms", timeout.as_millis()),
            })
        });

        // No await between this check and the writes below.
        if !self.is_current(provider, generation) {
            info!(%provider, "session changed during refresh, discarding result");
            return Err(AuthError::NotAuthenticated { provider });
        }

        match outcome {
            Ok(pair) => {
                let fresh = TokenRecord::issued(pair);
                self.cache
                    .set(key, &fresh, self.settings.record_ttl())
                    .await
                    .map_err(cache_failure)?;
                if let Some(state) = self.states.lock().get_mut(&provider) {
                    state.distrusted = None;
                    state.expired = false;
                }
                info!(%provider, "access token refreshed");
                Ok(fresh.access)
            }
            Err(RefreshError::Rejected { status }) => {
                warn!(%provider, status, "refresh token rejected, ending session");
                self.expire(provider).await
            }
            Err(RefreshError::Unavailable { status, message }) => {
                let failed = record.with_failed_attempt();
                let ceiling = self.settings.effective_ceiling();
                if failed.refresh_attempts >= ceiling {
                    warn!(
                        %provider,
                        attempts = failed.refresh_attempts,
                        ceiling,
                        "refresh failure ceiling reached, ending session"
                    );
                    return self.expire(provider).await;
                }

                warn!(
                    %provider,
                    ?status,
                    attempts = failed.refresh_attempts,
                    ceiling,
                    "token refresh failed"
                );
                self.cache
                    .set(key, &failed, self.settings.record_ttl())
                    .await
                    .map_err(cache_failure)?;
                Err(AuthError::RefreshFailed { provider, message })
            }
        }
    }

    async fn expire(&self, provider: ProviderId) -> Result<String, AuthError> {
        self.cache
            .delete(self.registry.cache_key(provider))
            .await
            .map_err(cache_failure)?;
        self.states.lock().entry(provider).or_default().expired = true;
        Err(AuthError::SessionExpired { provider })
    }
}

/// Clears the provider's in-flight slot when the refresh task ends, unless
/// the provider was forgotten meanwhile.
struct InFlightSlot<'a> {
    core: &'a Core,
    provider: ProviderId,
    generation: u64,
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        let mut states = self.core.states.lock();
        if let Some(state) = states.get_mut(&self.provider)
            && state.generation == self.generation
        {
            state.in_flight = None;
        }
    }
}

fn cache_failure(error: CacheError) -> AuthError {
    AuthError::Cache(error.to_string())
}
