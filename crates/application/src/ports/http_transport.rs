//! Outbound HTTP transport port

use async_trait::async_trait;
use carmart_domain::{ApiRequest, ApiResponse};

/// Errors that prevent a downstream call from producing a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request timed out.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout in milliseconds.
        timeout_ms: u64,
    },

    /// Connection could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Any other transport failure.
    #[error("transport error: {0}")]
    Other(String),
}

/// Port for performing raw HTTP calls.
///
/// Only the authenticated request wrapper should call this for provider
/// APIs; it owns bearer attachment and 401 handling.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends `request` and returns the response, whatever its status.
    ///
    /// # Errors
    /// Returns [`TransportError`] if no response was received.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}
