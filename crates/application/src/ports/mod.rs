//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the authentication core and external
//! systems. Each port is a trait implemented by adapters in the
//! infrastructure layer, or by fakes in tests.

mod clock;
mod http_transport;
mod provider_client;
mod session;
mod token_cache;

pub use clock::Clock;
pub use http_transport::{HttpTransport, TransportError};
pub use provider_client::{IdentityProvider, LoginError, RefreshError, TokenRefresher};
pub use session::SessionHandle;
pub use token_cache::{CacheError, TokenCache};
