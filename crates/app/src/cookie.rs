//! Front-end session cookie handling.

use axum::http::{HeaderMap, HeaderValue, header};
use carmart_application::ports::SessionHandle;
use carmart_domain::{FrontendSession, ProviderId, SESSION_COOKIE_NAME};
use parking_lot::Mutex;

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    cookie_header.split(';').find_map(|part| {
        let (key, value) = part.trim().split_once('=')?;
        (key.trim() == name).then(|| value.trim())
    })
}

/// Attributes applied to the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookiePolicy {
    /// Add the `Secure` attribute.
    pub secure: bool,
    /// `Max-Age` of a freshly set cookie.
    pub max_age_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Activate(ProviderId),
    Clear,
}

/// Request-scoped session backed by the `carmart_session` cookie.
///
/// Changes are collected while the request is handled and emitted as one
/// `Set-Cookie` header on the response.
#[derive(Debug)]
pub struct CookieSession {
    policy: CookiePolicy,
    current: Mutex<Option<FrontendSession>>,
    pending: Mutex<Option<Pending>>,
}

impl CookieSession {
    /// Reads the session from the request headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, policy: CookiePolicy) -> Self {
        let current = get_cookie(headers, SESSION_COOKIE_NAME)
            .and_then(FrontendSession::from_cookie_value);
        Self {
            policy,
            current: Mutex::new(current),
            pending: Mutex::new(None),
        }
    }

    /// `Set-Cookie` value for the change made during this request, if any.
    #[must_use]
    pub fn set_cookie_header(&self) -> Option<HeaderValue> {
        let secure = if self.policy.secure { "; Secure" } else { "" };
        let cookie = match (*self.pending.lock())? {
            Pending::Activate(provider) => format!(
                "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}{}",
                SESSION_COOKIE_NAME,
                FrontendSession::new(provider).cookie_value(),
                self.policy.max_age_secs,
                secure
            ),
            Pending::Clear => format!(
                "{SESSION_COOKIE_NAME}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0{secure}"
            ),
        };
        HeaderValue::from_str(&cookie).ok()
    }
}

impl SessionHandle for CookieSession {
    fn active_provider(&self) -> Option<ProviderId> {
        self.current.lock().map(|session| session.provider())
    }

    fn activate(&self, provider: ProviderId) {
        *self.current.lock() = Some(FrontendSession::new(provider));
        *self.pending.lock() = Some(Pending::Activate(provider));
    }

    fn clear(&self) {
        *self.current.lock() = None;
        *self.pending.lock() = Some(Pending::Clear);
    }
}
