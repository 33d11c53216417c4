//! Front-end session boundary

use carmart_domain::ProviderId;

/// Request-scoped view of the browser's front-end session.
///
/// The core only asks whether a live session exists and which provider is
/// active; it writes the session at sign-in, provider switch and sign-out.
pub trait SessionHandle: Send + Sync {
    /// Returns the active provider if a live session exists.
    fn active_provider(&self) -> Option<ProviderId>;

    /// Starts or updates the session with `provider` active.
    fn activate(&self, provider: ProviderId);

    /// Clears the session cookie.
    fn clear(&self);

    /// Returns true if a live session exists.
    fn is_live(&self) -> bool {
        self.active_provider().is_some()
    }
}
