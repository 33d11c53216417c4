//! Cached token record and token pair types

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Access/refresh pair as returned by login and refresh endpoints.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer credential.
    pub access: String,
    /// Longer-lived credential exchanged for a new pair.
    pub refresh: String,
}

impl TokenPair {
    /// Creates a new token pair.
    #[must_use]
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair").finish_non_exhaustive()
    }
}

/// The cached `{access, refresh, refreshAttempts}` tuple for one provider.
///
/// A record always carries both tokens. Payloads missing either one are
/// rejected by [`TokenRecord::from_json`] as corrupt.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Current access token.
    pub access: String,
    /// Current refresh token.
    pub refresh: String,
    /// Consecutive failed refresh attempts.
    #[serde(rename = "refreshAttempts", default)]
    pub refresh_attempts: u32,
}

/// Loose shape used to tell malformed payloads from corrupt ones.
#[derive(Deserialize)]
struct RawRecord {
    #[serde(default)]
    access: Option<String>,
    #[serde(default)]
    refresh: Option<String>,
    #[serde(rename = "refreshAttempts", default)]
    refresh_attempts: u32,
}

impl TokenRecord {
    /// Creates a fresh record with a zero failure count.
    #[must_use]
    pub fn issued(pair: TokenPair) -> Self {
        Self {
            access: pair.access,
            refresh: pair.refresh,
            refresh_attempts: 0,
        }
    }

    /// Returns a copy with one more failed refresh attempt recorded.
    #[must_use]
    pub fn with_failed_attempt(&self) -> Self {
        Self {
            refresh_attempts: self.refresh_attempts.saturating_add(1),
            ..self.clone()
        }
    }

    /// Serializes the record to its cache JSON form.
    ///
    /// # Errors
    /// Returns [`DomainError::MalformedRecord`] if serialization fails.
    pub fn to_json(&self) -> DomainResult<String> {
        serde_json::to_string(self).map_err(|e| DomainError::MalformedRecord(e.to_string()))
    }

    /// Parses a cached payload.
    ///
    /// # Errors
    /// Returns [`DomainError::MalformedRecord`] when the payload is not a JSON
    /// object of the expected shape, and [`DomainError::CorruptRecord`] when
    /// it is well-formed but lacks one of the two tokens.
    pub fn from_json(payload: &str) -> DomainResult<Self> {
        let value: serde_json::Value = serde_json::from_str(payload)
            .map_err(|e| DomainError::MalformedRecord(e.to_string()))?;
        if !value.is_object() {
            return Err(DomainError::MalformedRecord(
                "token record is not a JSON object".to_string(),
            ));
        }
        let raw: RawRecord = serde_json::from_value(value)
            .map_err(|e| DomainError::MalformedRecord(e.to_string()))?;

        let access = raw
            .access
            .filter(|value| !value.is_empty())
            .ok_or(DomainError::CorruptRecord("access"))?;
        let refresh = raw
            .refresh
            .filter(|value| !value.is_empty())
            .ok_or(DomainError::CorruptRecord("refresh"))?;

        Ok(Self {
            access,
            refresh,
            refresh_attempts: raw.refresh_attempts,
        })
    }
}

impl std::fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRecord")
            .field("refresh_attempts", &self.refresh_attempts)
            .finish_non_exhaustive()
    }
}
