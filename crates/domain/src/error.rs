//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The identifier does not name a supported identity provider.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// An endpoint URL is invalid or cannot be joined with its path.
    #[error("invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// A cached token payload is not a token record document.
    #[error("malformed token record: {0}")]
    MalformedRecord(String),

    /// A cached token record lacks its access or refresh token.
    #[error("corrupt token record: missing {0} token")]
    CorruptRecord(&'static str),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
