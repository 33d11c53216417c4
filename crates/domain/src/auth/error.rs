//! Authentication state errors

use thiserror::Error;

use super::ProviderId;

/// Outcome of an authentication step that did not yield a usable token.
///
/// These are expected state transitions, returned as values so callers are
/// forced to handle each case.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No cached token record exists for the provider.
    #[error("not authenticated with {provider}")]
    NotAuthenticated {
        /// Provider that was asked for a token.
        provider: ProviderId,
    },

    /// The refresh endpoint was unreachable or returned a server error.
    #[error("token refresh with {provider} failed: {message}")]
    RefreshFailed {
        /// Provider whose refresh failed.
        provider: ProviderId,
        /// Description of the transient failure.
        message: String,
    },

    /// The refresh token was rejected or the failure ceiling was reached.
    #[error("session with {provider} expired, please log in again")]
    SessionExpired {
        /// Provider whose session ended.
        provider: ProviderId,
    },

    /// The downstream API rejected a freshly obtained token twice in a row.
    #[error("authentication with {provider} required")]
    AuthenticationRequired {
        /// Provider whose token was rejected.
        provider: ProviderId,
    },

    /// The token cache failed unexpectedly.
    #[error("token cache error: {0}")]
    Cache(String),
}

impl AuthError {
    /// Returns true if the caller must go through a full sign-in again.
    #[must_use]
    pub const fn requires_reauthentication(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated { .. }
                | Self::SessionExpired { .. }
                | Self::AuthenticationRequired { .. }
        )
    }

    /// Returns true if the failure is transient and the whole operation may
    /// be retried later.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::RefreshFailed { .. } | Self::Cache(_))
    }

    /// Stable machine-readable code for API error bodies.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotAuthenticated { .. } => "not_authenticated",
            Self::RefreshFailed { .. } => "refresh_failed",
            Self::SessionExpired { .. } => "session_expired",
            Self::AuthenticationRequired { .. } => "authentication_required",
            Self::Cache(_) => "cache_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reauthentication_classification() {
        let provider = ProviderId::Backend;
        assert!(AuthError::NotAuthenticated { provider }.requires_reauthentication());
        assert!(AuthError::SessionExpired { provider }.requires_reauthentication());
        assert!(AuthError::AuthenticationRequired { provider }.requires_reauthentication());
        assert!(
            !AuthError::RefreshFailed {
                provider,
                message: "503".to_string()
            }
            .requires_reauthentication()
        );
        assert!(AuthError::Cache("down".to_string()).is_transient());
    }

    #[test]
    fn test_display_names_provider() {
        let err = AuthError::SessionExpired {
            provider: ProviderId::Dummy,
        };
        assert_eq!(err.to_string(), "session with dummy expired, please log in again");
        assert_eq!(err.code(), "session_expired");
    }
}
