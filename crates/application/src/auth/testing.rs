//! Port fakes shared by the auth unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use carmart_domain::{
    ApiRequest, ApiResponse, ProviderConfig, ProviderId, TokenPair, TokenRecord,
};
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;

use super::{ProviderRegistry, TokenLifecycleManager};
use crate::ports::{
    CacheError, Clock, HttpTransport, IdentityProvider, LoginError, RefreshError,
    SessionHandle, TokenCache, TokenRefresher, TransportError,
};
use crate::settings::AuthSettings;

pub(crate) fn test_registry(base_url: &str) -> ProviderRegistry {
    ProviderRegistry::new(
        ProviderConfig::from_base_url(ProviderId::Dummy, base_url).unwrap(),
        ProviderConfig::from_base_url(ProviderId::Backend, base_url).unwrap(),
        ProviderId::Backend,
    )
    .unwrap()
}

pub(crate) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

/// Unsigned JWT whose `exp` lies `seconds` after [`fixed_now`].
pub(crate) fn jwt_expiring_in(seconds: i64, marker: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = serde_json::json!({"exp": fixed_now().timestamp() + seconds, "jti": marker});
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.sig")
}

pub(crate) struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        fixed_now()
    }
}

#[derive(Default)]
pub(crate) struct FakeCache {
    entries: Mutex<HashMap<String, TokenRecord>>,
    broken: Mutex<HashMap<String, CacheError>>,
    pub(crate) unavailable: Mutex<bool>,
    pub(crate) touched: Mutex<Vec<(&'static str, String)>>,
}

impl FakeCache {
    pub(crate) fn with_record(key: &str, record: TokenRecord) -> Self {
        let cache = Self::default();
        cache.entries.lock().insert(key.to_string(), record);
        cache
    }

    pub(crate) fn insert(&self, key: &str, record: TokenRecord) {
        self.entries.lock().insert(key.to_string(), record);
    }

    pub(crate) fn break_entry(&self, key: &str, error: CacheError) {
        self.broken.lock().insert(key.to_string(), error);
    }

    pub(crate) fn record(&self, key: &str) -> Option<TokenRecord> {
        self.entries.lock().get(key).cloned()
    }

    pub(crate) fn keys_touched(&self) -> Vec<String> {
        self.touched.lock().iter().map(|(_, key)| key.clone()).collect()
    }

    fn check(&self, op: &'static str, key: &str) -> Result<(), CacheError> {
        self.touched.lock().push((op, key.to_string()));
        if *self.unavailable.lock() {
            return Err(CacheError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl TokenCache for FakeCache {
    async fn get(&self, key: &str) -> Result<Option<TokenRecord>, CacheError> {
        self.check("get", key)?;
        if let Some(error) = self.broken.lock().get(key) {
            return Err(error.clone());
        }
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, record: &TokenRecord, _ttl: Duration) -> Result<(), CacheError> {
        self.check("set", key)?;
        self.broken.lock().remove(key);
        self.entries.lock().insert(key.to_string(), record.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.check("delete", key)?;
        self.broken.lock().remove(key);
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Scripted refresh endpoint. The last scripted outcome repeats.
pub(crate) struct FakeRefresher {
    script: Mutex<VecDeque<Result<TokenPair, RefreshError>>>,
    delay: Duration,
    calls: AtomicUsize,
    pub(crate) seen: Mutex<Vec<(ProviderId, String)>>,
}

impl FakeRefresher {
    pub(crate) fn new(script: Vec<Result<TokenPair, RefreshError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn returning(access: &str, refresh: &str) -> Self {
        Self::new(vec![Ok(TokenPair::new(access, refresh))])
    }

    pub(crate) fn unavailable() -> Self {
        Self::new(vec![Err(RefreshError::Unavailable {
            status: Some(503),
            message: "503 Service Unavailable".to_string(),
        })])
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenRefresher for FakeRefresher {
    async fn refresh(
        &self,
        provider: &ProviderConfig,
        refresh_token: &str,
    ) -> Result<TokenPair, RefreshError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push((provider.id, refresh_token.to_string()));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let mut script = self.script.lock();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap()
        }
    }
}

pub(crate) struct FakeIdentity {
    pub(crate) outcome: Result<TokenPair, LoginError>,
    pub(crate) calls: AtomicUsize,
}

impl FakeIdentity {
    pub(crate) fn new(outcome: Result<TokenPair, LoginError>) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn login(
        &self,
        _provider: &ProviderConfig,
        _credentials: &serde_json::Value,
    ) -> Result<TokenPair, LoginError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

/// Scripted downstream API. The last scripted status repeats.
pub(crate) struct FakeTransport {
    statuses: Mutex<VecDeque<u16>>,
    pub(crate) sent: Mutex<Vec<ApiRequest>>,
    pub(crate) fail: bool,
}

impl FakeTransport {
    pub(crate) fn new(statuses: Vec<u16>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            sent: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(vec![200])
        }
    }

    pub(crate) fn bearers(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter_map(|r| r.header("Authorization").map(String::from))
            .collect()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.sent.lock().push(request);
        if self.fail {
            return Err(TransportError::ConnectionFailed("connection reset".to_string()));
        }
        let mut statuses = self.statuses.lock();
        let status = if statuses.len() > 1 {
            statuses.pop_front().unwrap()
        } else {
            *statuses.front().unwrap()
        };
        Ok(ApiResponse::new(status, Vec::new(), b"{}".to_vec()))
    }
}

#[derive(Default)]
pub(crate) struct FakeSession {
    pub(crate) provider: Mutex<Option<ProviderId>>,
    pub(crate) cleared: Mutex<u32>,
}

impl SessionHandle for FakeSession {
    fn active_provider(&self) -> Option<ProviderId> {
        *self.provider.lock()
    }

    fn activate(&self, provider: ProviderId) {
        *self.provider.lock() = Some(provider);
    }

    fn clear(&self) {
        *self.provider.lock() = None;
        *self.cleared.lock() += 1;
    }
}

pub(crate) fn manager_with(
    cache: &Arc<FakeCache>,
    refresher: &Arc<FakeRefresher>,
    settings: AuthSettings,
) -> TokenLifecycleManager {
    TokenLifecycleManager::new(
        Arc::new(test_registry("http://provider.test")),
        Arc::clone(cache) as Arc<dyn TokenCache>,
        Arc::clone(refresher) as Arc<dyn TokenRefresher>,
        Arc::new(FixedClock),
        settings,
    )
}
