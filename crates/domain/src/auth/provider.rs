//! Identity provider identifiers and their endpoint configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{DomainError, DomainResult};

/// Supported identity providers.
///
/// The set is closed: every provider owns its own cache namespace and
/// endpoints, resolved once by the provider registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    /// Disposable test provider used for demos and local development.
    Dummy,
    /// Production marketplace backend.
    #[default]
    Backend,
}

impl ProviderId {
    /// Returns all supported providers.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Dummy, Self::Backend]
    }

    /// Returns the provider identifier as a static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dummy => "dummy",
            Self::Backend => "backend",
        }
    }

    /// Cache key namespace used when no override is configured.
    #[must_use]
    pub const fn default_namespace(self) -> &'static str {
        match self {
            Self::Dummy => "tokens:dummy",
            Self::Backend => "tokens:backend",
        }
    }

    /// Refresh endpoint path relative to the provider base URL.
    #[must_use]
    pub const fn default_refresh_path(self) -> &'static str {
        match self {
            Self::Dummy => "auth/refresh",
            Self::Backend => "api/token/refresh/",
        }
    }

    /// Login endpoint path relative to the provider base URL.
    #[must_use]
    pub const fn default_login_path(self) -> &'static str {
        match self {
            Self::Dummy => "auth/login",
            Self::Backend => "api/token/",
        }
    }

    /// JSON field carrying the refresh token in refresh requests.
    #[must_use]
    pub const fn refresh_field(self) -> &'static str {
        match self {
            Self::Dummy => "refreshToken",
            Self::Backend => "refresh",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "dummy" => Ok(Self::Dummy),
            "backend" => Ok(Self::Backend),
            other => Err(DomainError::UnknownProvider(other.to_string())),
        }
    }
}

/// Endpoint and cache configuration for one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Provider this configuration belongs to.
    pub id: ProviderId,
    /// Cache key under which the provider's token record lives.
    pub cache_namespace: String,
    /// Endpoint exchanging a refresh token for a new token pair.
    pub refresh_endpoint: Url,
    /// Endpoint exchanging user credentials for a token pair.
    pub login_endpoint: Url,
    /// Base URL for authenticated API calls.
    pub api_base: Url,
    /// JSON field name carrying the refresh token.
    pub refresh_field: &'static str,
}

impl ProviderConfig {
    /// Builds the default configuration for `id` rooted at `base_url`.
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidEndpoint`] if the base URL cannot be
    /// parsed or joined with the provider's endpoint paths.
    pub fn from_base_url(id: ProviderId, base_url: &str) -> DomainResult<Self> {
        let base = parse_base(base_url)?;
        let join = |path: &str| {
            base.join(path)
                .map_err(|e| DomainError::InvalidEndpoint(format!("{e}: {base}{path}")))
        };

        Ok(Self {
            id,
            cache_namespace: id.default_namespace().to_string(),
            refresh_endpoint: join(id.default_refresh_path())?,
            login_endpoint: join(id.default_login_path())?,
            api_base: base.clone(),
            refresh_field: id.refresh_field(),
        })
    }

    /// Overrides the cache namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.cache_namespace = namespace.into();
        self
    }

    /// Resolves an API path against the provider's base URL.
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidEndpoint`] if the joined URL is invalid
    /// or escapes the API base.
    pub fn api_url(&self, path: &str) -> DomainResult<Url> {
        let url = self
            .api_base
            .join(path.trim_start_matches('/'))
            .map_err(|e| DomainError::InvalidEndpoint(format!("{e}: {path}")))?;

        if url.origin() != self.api_base.origin() || !url.path().starts_with(self.api_base.path())
        {
            return Err(DomainError::InvalidEndpoint(format!(
                "{path} leaves {}",
                self.api_base
            )));
        }
        Ok(url)
    }
}

/// Parses a base URL, making sure it ends with a slash so relative joins
/// append instead of replacing the last segment.
fn parse_base(base_url: &str) -> DomainResult<Url> {
    let normalized = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{base_url}/")
    };
    Url::parse(&normalized).map_err(|e| DomainError::InvalidEndpoint(format!("{e}: {base_url}")))
}
