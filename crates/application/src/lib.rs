//! Carmart Application - Token lifecycle use cases and ports
//!
//! This crate defines the application layer with:
//! - Port traits for the token cache, identity providers, HTTP and session
//! - The token lifecycle manager and the flows built on it
//! - Tuning settings for refresh behaviour

pub mod auth;
pub mod ports;
pub mod settings;

pub use auth::{
    AuthenticatedClient, CleanupError, ProviderRegistry, RegistryError, RequestError,
    SessionCleanup, SignIn, SignInError, TokenLifecycleManager,
};
pub use ports::{
    CacheError, Clock, HttpTransport, IdentityProvider, LoginError, RefreshError, SessionHandle,
    TokenCache, TokenRefresher, TransportError,
};
pub use settings::AuthSettings;
