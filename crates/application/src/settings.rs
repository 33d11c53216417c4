//! Token lifecycle tuning

use std::time::Duration;

use carmart_domain::jwt::DEFAULT_EXPIRY_BUFFER_SECS;
use serde::Deserialize;

/// Consecutive transient refresh failures after which a record is dropped.
pub const DEFAULT_REFRESH_CEILING: u32 = 3;

/// Cache lifetime of a token record, one week.
pub const DEFAULT_RECORD_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Upper bound on a single refresh or login call, in milliseconds.
pub const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 30_000;

/// Settings governing when tokens are refreshed and how long they are cached.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Seconds before `exp` at which an access token counts as expiring.
    pub expiry_buffer_secs: u64,
    /// Failed refreshes after which the record is deleted.
    pub refresh_ceiling: u32,
    /// Cache TTL applied to every record write.
    pub record_ttl_secs: u64,
    /// Longest a provider refresh or login call may take.
    pub provider_timeout_ms: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            expiry_buffer_secs: DEFAULT_EXPIRY_BUFFER_SECS,
            refresh_ceiling: DEFAULT_REFRESH_CEILING,
            record_ttl_secs: DEFAULT_RECORD_TTL_SECS,
            provider_timeout_ms: DEFAULT_PROVIDER_TIMEOUT_MS,
        }
    }
}

impl AuthSettings {
    /// Cache TTL as a `Duration`.
    #[must_use]
    pub const fn record_ttl(&self) -> Duration {
        Duration::from_secs(self.record_ttl_secs)
    }

    /// Provider call timeout as a `Duration`.
    #[must_use]
    pub const fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    /// Effective ceiling; a configured zero behaves like one.
    #[must_use]
    pub fn effective_ceiling(&self) -> u32 {
        self.refresh_ceiling.max(1)
    }
}
