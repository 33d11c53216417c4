//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use carmart_application::{CacheError, CleanupError, RequestError, SignInError, TransportError};
use carmart_domain::{AuthError, DomainError};
use carmart_infrastructure::SettingsError;
use serde::Serialize;
use thiserror::Error;

/// Errors returned by request handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No usable provider token.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The provider API could not be reached.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Sign-in failed.
    #[error(transparent)]
    SignIn(#[from] SignInError),

    /// Sign-out could not delete every record.
    #[error(transparent)]
    Cleanup(#[from] CleanupError),

    /// The request named an unknown provider, method or path.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The request requires a live front-end session.
    #[error("no active session")]
    NoSession,

    /// The request body could not be read.
    #[error("invalid request body: {0}")]
    Body(String),
}

impl From<RequestError> for ApiError {
    fn from(error: RequestError) -> Self {
        match error {
            RequestError::Auth(error) => Self::Auth(error),
            RequestError::Transport(error) => Self::Transport(error),
        }
    }
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Auth(AuthError::RefreshFailed { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Auth(AuthError::Cache(_))
            | Self::SignIn(SignInError::Cache(_))
            | Self::Cleanup(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(_) | Self::NoSession | Self::SignIn(SignInError::Rejected { .. }) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Transport(_) | Self::SignIn(SignInError::Unavailable { .. }) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Domain(DomainError::UnknownProvider(_)) => StatusCode::NOT_FOUND,
            Self::Domain(DomainError::UnsupportedMethod(_)) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Domain(_) | Self::Body(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Stable machine-readable code for the response body.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Auth(error) => error.code(),
            Self::Transport(_) => "upstream_unreachable",
            Self::SignIn(SignInError::Rejected { .. }) => "invalid_credentials",
            Self::SignIn(SignInError::Unavailable { .. }) => "provider_unavailable",
            Self::SignIn(SignInError::Cache(_)) | Self::Cleanup(_) => "cache_error",
            Self::Domain(DomainError::UnknownProvider(_)) => "unknown_provider",
            Self::Domain(_) | Self::Body(_) => "bad_request",
            Self::NoSession => "no_session",
        }
    }

    /// Returns true if the front-end session must be cleared along with the
    /// error response.
    #[must_use]
    pub const fn ends_session(&self) -> bool {
        matches!(
            self,
            Self::Auth(AuthError::SessionExpired { .. } | AuthError::AuthenticationRequired { .. })
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: &'static str,
            message: String,
        }

        if self.status_code().is_server_error() {
            tracing::warn!(error = %self, "request failed");
        }

        (
            self.status_code(),
            Json(ErrorResponse {
                error: self.code(),
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Errors that prevent the server from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Configuration is invalid.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// The token cache could not be set up.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The HTTP client could not be built.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The listener could not be bound or failed.
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}
