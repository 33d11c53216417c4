//! Layered process configuration.
//!
//! Sources, later ones winning:
//! 1. Built-in defaults
//! 2. Optional TOML file (`CARMART_CONFIG`, default `carmart.toml`)
//! 3. Environment variables `CARMART_<SECTION>__<KEY>`

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use carmart_application::{AuthSettings, ProviderRegistry, RegistryError};
use carmart_domain::{DomainError, ProviderConfig, ProviderId};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "CARMART_CONFIG";

/// Configuration file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "carmart.toml";

const ENV_PREFIX: &str = "CARMART";

/// Errors that can occur while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A source could not be read or did not match the expected shape.
    #[error("invalid configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A provider base URL is unusable.
    #[error("invalid provider configuration: {0}")]
    Provider(#[from] DomainError),

    /// Provider configurations conflict.
    #[error("invalid provider registry: {0}")]
    Registry(#[from] RegistryError),
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address the HTTP server binds to.
    pub bind: SocketAddr,
    /// Mark the session cookie `Secure`.
    pub secure_cookies: bool,
    /// Lifetime of the session cookie.
    pub session_max_age_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            secure_cookies: false,
            session_max_age_secs: carmart_application::settings::DEFAULT_RECORD_TTL_SECS,
        }
    }
}

/// Which token cache adapter to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Shared Redis instance.
    Redis,
    /// Process-local map, for development.
    #[default]
    Memory,
}

/// Token cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Adapter selection.
    pub backend: CacheBackend,
    /// Redis connection URL.
    pub redis_url: String,
    /// Global key prefix.
    pub key_prefix: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: "carmart".to_string(),
        }
    }
}

/// Settings of one identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderSettings {
    /// Base URL that endpoint paths and API calls are resolved against.
    pub base_url: String,
    /// Overrides the default cache namespace.
    #[serde(default)]
    pub cache_namespace: Option<String>,
}

impl ProviderSettings {
    fn local(port: u16) -> Self {
        Self {
            base_url: format!("http://127.0.0.1:{port}/"),
            cache_namespace: None,
        }
    }

    fn to_config(&self, id: ProviderId) -> Result<ProviderConfig, DomainError> {
        let config = ProviderConfig::from_base_url(id, &self.base_url)?;
        Ok(match &self.cache_namespace {
            Some(namespace) => config.with_namespace(namespace.clone()),
            None => config,
        })
    }
}

/// Per-provider settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProvidersSettings {
    /// The dummy provider.
    pub dummy: ProviderSettings,
    /// The backend provider.
    pub backend: ProviderSettings,
}

impl Default for ProvidersSettings {
    fn default() -> Self {
        Self {
            dummy: ProviderSettings::local(3001),
            backend: ProviderSettings::local(8000),
        }
    }
}

/// Complete process configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// HTTP listener.
    pub server: ServerSettings,
    /// Token cache.
    pub cache: CacheSettings,
    /// Token lifecycle tuning.
    pub auth: AuthSettings,
    /// Identity providers.
    pub providers: ProvidersSettings,
    /// Provider selected when a session names none.
    pub default_provider: ProviderId,
}

impl Settings {
    /// Loads settings from the file named by `CARMART_CONFIG` (if present)
    /// and the environment.
    ///
    /// # Errors
    /// Returns [`SettingsError`] if a source is invalid.
    pub fn load() -> Result<Self, SettingsError> {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
        Self::load_from(&path)
    }

    /// Loads settings from `path` (optional) and the environment.
    ///
    /// # Errors
    /// Returns [`SettingsError`] if a source is invalid.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        Self::load_with_env(path, None)
    }

    /// Same as [`Settings::load_from`], reading variables from `env` instead
    /// of the process environment when given.
    fn load_with_env(
        path: &Path,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, SettingsError> {
        let settings = Config::builder()
            .add_source(
                File::from(path)
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Builds the provider registry these settings describe.
    ///
    /// # Errors
    /// Returns [`SettingsError`] if a base URL is invalid or the providers
    /// share a cache namespace.
    pub fn registry(&self) -> Result<ProviderRegistry, SettingsError> {
        Ok(ProviderRegistry::new(
            self.providers.dummy.to_config(ProviderId::Dummy)?,
            self.providers.backend.to_config(ProviderId::Backend)?,
            self.default_provider,
        )?)
    }
}
