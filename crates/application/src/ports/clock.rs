//! Clock port for expiry decisions

use chrono::{DateTime, Utc};

/// Port for getting the current time.
///
/// Token expiry checks read the time through this trait so tests can pin
/// `now` instead of minting tokens relative to the wall clock.
pub trait Clock: Send + Sync {
    /// Returns the current UTC timestamp.
    fn now(&self) -> DateTime<Utc>;
}
