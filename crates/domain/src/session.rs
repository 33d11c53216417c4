//! Front-end session cookie value.
//!
//! The browser session only records which provider is active. Tokens never
//! leave the server side; they live in the shared token cache.

use std::str::FromStr;

use crate::auth::ProviderId;

/// Name of the front-end session cookie.
pub const SESSION_COOKIE_NAME: &str = "carmart_session";

/// Live front-end session, identified by its active provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontendSession {
    provider: ProviderId,
}

impl FrontendSession {
    /// Starts a session with `provider` active.
    #[must_use]
    pub const fn new(provider: ProviderId) -> Self {
        Self { provider }
    }

    /// Returns the active provider.
    #[must_use]
    pub const fn provider(&self) -> ProviderId {
        self.provider
    }

    /// Parses a cookie value. Unknown or empty values yield no session.
    #[must_use]
    pub fn from_cookie_value(value: &str) -> Option<Self> {
        ProviderId::from_str(value).ok().map(Self::new)
    }

    /// Returns the cookie value representing this session.
    #[must_use]
    pub const fn cookie_value(&self) -> &'static str {
        self.provider.as_str()
    }
}
