//! In-process token cache with per-entry expiry.
//!
//! Entries are stored in their JSON wire form so decoding behaves exactly
//! like the shared store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use carmart_application::ports::{CacheError, TokenCache};
use carmart_domain::TokenRecord;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Entry {
    payload: String,
    expires_at: Instant,
}

/// Thread-safe in-memory token cache.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTokenCache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl InMemoryTokenCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw payload at `key`, bypassing record encoding.
    pub async fn insert_raw(&self, key: impl Into<String>, payload: impl Into<String>, ttl: Duration) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.into(),
            Entry {
                payload: payload.into(),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries.values().filter(|entry| entry.expires_at > now).count()
    }

    /// Returns true if no live entry exists.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl TokenCache for InMemoryTokenCache {
    async fn get(&self, key: &str) -> Result<Option<TokenRecord>, CacheError> {
        let payload = {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > Instant::now() => entry.payload.clone(),
                _ => return Ok(None),
            }
        };

        TokenRecord::from_json(&payload)
            .map(Some)
            .map_err(|e| CacheError::decode(key, e))
    }

    async fn set(&self, key: &str, record: &TokenRecord, ttl: Duration) -> Result<(), CacheError> {
        let payload = record
            .to_json()
            .map_err(|e| CacheError::decode(key, e))?;
        self.insert_raw(key, payload, ttl).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }
}
