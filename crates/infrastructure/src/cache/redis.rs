//! Redis-backed token cache shared across processes.

use std::time::Duration;

use async_trait::async_trait;
use carmart_application::ports::{CacheError, TokenCache};
use carmart_domain::TokenRecord;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use tokio::sync::OnceCell;
use tracing::debug;

/// Token cache over `GET`, `SET key value EX ttl` and `DEL`.
///
/// Keys are namespaced with a global prefix so several deployments can share
/// one Redis instance.
pub struct RedisTokenCache {
    client: redis::Client,
    prefix: String,
    connection: OnceCell<MultiplexedConnection>,
}

impl RedisTokenCache {
    /// Creates a cache for the Redis server at `url`. No connection is made
    /// until the first command.
    ///
    /// # Errors
    /// Returns [`CacheError::Unavailable`] if `url` is not a valid Redis URL.
    pub fn open(url: &str, prefix: impl Into<String>) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(unavailable)?;
        Ok(Self::with_client(client, prefix))
    }

    /// Creates a cache over an existing client.
    #[must_use]
    pub fn with_client(client: redis::Client, prefix: impl Into<String>) -> Self {
        Self {
            client,
            prefix: prefix.into(),
            connection: OnceCell::new(),
        }
    }

    fn key(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{key}", self.prefix)
        }
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CacheError> {
        self.connection
            .get_or_try_init(|| async {
                debug!("opening redis connection");
                self.client
                    .get_multiplexed_async_connection()
                    .await
                    .map_err(unavailable)
            })
            .await
            .cloned()
    }
}

#[async_trait]
impl TokenCache for RedisTokenCache {
    async fn get(&self, key: &str) -> Result<Option<TokenRecord>, CacheError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(self.key(key)).await.map_err(unavailable)?;

        value
            .map(|json| TokenRecord::from_json(&json).map_err(|e| CacheError::decode(key, e)))
            .transpose()
    }

    async fn set(&self, key: &str, record: &TokenRecord, ttl: Duration) -> Result<(), CacheError> {
        let payload = record.to_json().map_err(|e| CacheError::decode(key, e))?;
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(self.key(key), payload, ttl.as_secs().max(1))
            .await
            .map_err(unavailable)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(self.key(key)).await.map_err(unavailable)
    }
}

fn unavailable(error: redis::RedisError) -> CacheError {
    CacheError::Unavailable(error.to_string())
}
