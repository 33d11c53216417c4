//! Unverified JWT expiry inspection.
//!
//! The bridge never validates token signatures; that is the backend's job.
//! It only needs the `exp` claim to decide whether a cached access token is
//! still usable. Every failure mode is fail-closed: a token whose expiry
//! cannot be read is reported as expired.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};

/// Default window before expiry in which a token counts as expiring.
pub const DEFAULT_EXPIRY_BUFFER_SECS: u64 = 300;

/// Expiry state of a bearer token relative to a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenExpiry {
    /// `exp` is at or before `now`, or the token could not be decoded.
    Expired,
    /// Still valid but inside the refresh buffer.
    ExpiringSoon,
    /// Valid beyond the refresh buffer.
    Valid,
}

impl TokenExpiry {
    /// Returns true unless the token is comfortably valid.
    #[must_use]
    pub const fn needs_refresh(self) -> bool {
        !matches!(self, Self::Valid)
    }
}

/// Reads the `exp` claim (seconds since the epoch) without verifying the
/// signature. Returns `None` if the token is not a decodable JWT or carries
/// no numeric `exp`.
#[must_use]
pub fn expiry_claim(token: &str) -> Option<f64> {
    let mut segments = token.split('.');
    let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);
    if segments.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    claims.get("exp")?.as_f64().filter(|exp| exp.is_finite())
}

/// Classifies `token` against `now` and a refresh buffer.
#[must_use]
pub fn inspect(token: &str, buffer_seconds: u64, now: DateTime<Utc>) -> TokenExpiry {
    let Some(exp) = expiry_claim(token) else {
        return TokenExpiry::Expired;
    };

    #[allow(clippy::cast_precision_loss)]
    let now_secs = now.timestamp() as f64;
    #[allow(clippy::cast_precision_loss)]
    let buffer = buffer_seconds as f64;

    if exp < now_secs {
        TokenExpiry::Expired
    } else if exp < now_secs + buffer {
        TokenExpiry::ExpiringSoon
    } else {
        TokenExpiry::Valid
    }
}

/// Returns true if `exp < now + buffer_seconds` or the token is undecodable.
#[must_use]
pub fn is_expiring_soon(token: &str, buffer_seconds: u64, now: DateTime<Utc>) -> bool {
    inspect(token, buffer_seconds, now).needs_refresh()
}
