//! Carmart Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus configuration loading.

pub mod adapters;
pub mod auth;
pub mod cache;
pub mod settings;

pub use adapters::{ReqwestTransport, SystemClock};
pub use auth::ProviderHttpClient;
pub use cache::{InMemoryTokenCache, RedisTokenCache};
pub use settings::{
    CacheBackend, CacheSettings, ProviderSettings, ProvidersSettings, ServerSettings, Settings,
    SettingsError,
};
