//! Authentication use cases
//!
//! - [`ProviderRegistry`]: provider id to endpoints and cache key
//! - [`TokenLifecycleManager`]: cached tokens, refresh, single-flight
//! - [`AuthenticatedClient`]: bearer attachment and 401 retry
//! - [`SignIn`] and [`SessionCleanup`]: session entry and exit

mod cleanup;
mod client;
mod lifecycle;
mod registry;
mod sign_in;

#[cfg(test)]
pub(crate) mod testing;

pub use cleanup::{CleanupError, SessionCleanup};
pub use client::{AuthenticatedClient, RequestError};
pub use lifecycle::TokenLifecycleManager;
pub use registry::{ProviderRegistry, RegistryError};
pub use sign_in::{SignIn, SignInError};
