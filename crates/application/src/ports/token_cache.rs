//! Token cache port
//!
//! Narrow transport contract over the shared key-value store holding one
//! token record per provider.

use std::time::Duration;

use async_trait::async_trait;
use carmart_domain::{DomainError, TokenRecord};

/// Errors that can occur during token cache operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// The store could not be reached or rejected the command.
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    /// The stored payload is not a token record document.
    #[error("malformed entry at {key}: {message}")]
    Malformed {
        /// Key holding the payload.
        key: String,
        /// Parser message.
        message: String,
    },

    /// The stored record lacks one of its two tokens.
    #[error("corrupt entry at {key}: missing {missing} token")]
    Corrupt {
        /// Key holding the record.
        key: String,
        /// Which token is missing.
        missing: &'static str,
    },
}

impl CacheError {
    /// Maps a payload decoding failure for `key`.
    #[must_use]
    pub fn decode(key: &str, error: DomainError) -> Self {
        match error {
            DomainError::CorruptRecord(missing) => Self::Corrupt {
                key: key.to_string(),
                missing,
            },
            other => Self::Malformed {
                key: key.to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// Typed get/set/delete access to cached token records.
///
/// Implementations are best-effort and eventually consistent across
/// processes, but a value written by this process must be readable by it
/// immediately afterwards.
#[async_trait]
pub trait TokenCache: Send + Sync {
    /// Reads the record at `key`. Absent keys yield `Ok(None)`.
    ///
    /// # Errors
    /// Returns [`CacheError::Malformed`] or [`CacheError::Corrupt`] for bad
    /// payloads and [`CacheError::Unavailable`] if the store fails.
    async fn get(&self, key: &str) -> Result<Option<TokenRecord>, CacheError>;

    /// Writes `record` at `key`, expiring after `ttl`.
    ///
    /// # Errors
    /// Returns [`CacheError::Unavailable`] if the store fails.
    async fn set(&self, key: &str, record: &TokenRecord, ttl: Duration) -> Result<(), CacheError>;

    /// Removes `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    /// Returns [`CacheError::Unavailable`] if the store fails.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
