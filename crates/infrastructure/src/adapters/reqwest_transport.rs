//! HTTP transport implementation using reqwest.
//!
//! Performs the raw provider API calls on behalf of the authenticated
//! request wrapper. Statuses are never interpreted here.

use std::time::Duration;

use async_trait::async_trait;
use carmart_application::ports::{HttpTransport, TransportError};
use carmart_domain::{ApiRequest, ApiResponse, HttpMethod};
use reqwest::{Client, Method};
use tracing::debug;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP transport wrapping a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Creates a transport with default settings.
    ///
    /// Default configuration:
    /// - Request timeout: 30 seconds
    /// - Redirects: not followed, so 401s are seen as such
    /// - User-Agent: "Carmart/<version>"
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("Carmart/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self::with_client(client))
    }

    /// Creates a transport over a custom reqwest client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self {
            client,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Options => Method::OPTIONS,
        }
    }

    /// Maps reqwest errors to `TransportError`.
    fn map_error(error: &reqwest::Error, timeout: Duration) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            };
        }
        if error.is_connect() {
            return TransportError::ConnectionFailed(error.to_string());
        }
        TransportError::Other(error.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), request.url.clone())
            .timeout(self.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(&e, self.timeout))?;

        let status = response.status().as_u16();
        debug!(method = %request.method, url = %request.url, status, "provider API call");

        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("<binary>").to_string()))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Other(format!("Failed to read body: {e}")))?
            .to_vec();

        Ok(ApiResponse::new(status, headers, body))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;
    use url::Url;

    #[test]
    fn test_to_reqwest_method() {
        assert_eq!(ReqwestTransport::to_reqwest_method(HttpMethod::Get), Method::GET);
        assert_eq!(ReqwestTransport::to_reqwest_method(HttpMethod::Post), Method::POST);
        assert_eq!(ReqwestTransport::to_reqwest_method(HttpMethod::Delete), Method::DELETE);
    }

    #[tokio::test]
    async fn test_sends_headers_and_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/listings/")
                .header("authorization", "Bearer a1")
                .body(r#"{"make":"Volvo"}"#);
            then.status(201)
                .header("content-type", "application/json")
                .body(r#"{"id":7}"#);
        });

        let request = ApiRequest::new(
            HttpMethod::Post,
            Url::parse(&server.url("/api/listings/")).unwrap(),
        )
        .with_header("Authorization", "Bearer a1")
        .with_body(br#"{"make":"Volvo"}"#.to_vec());
        let response = ReqwestTransport::new().unwrap().send(request).await.unwrap();

        assert_eq!(response.status.as_u16(), 201);
        assert_eq!(response.body, br#"{"id":7}"#.to_vec());
        assert_eq!(response.header("content-type"), Some("application/json"));
        mock.assert();
    }

    #[tokio::test]
    async fn test_unauthorized_is_returned_not_raised() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/me/");
            then.status(401);
        });

        let request = ApiRequest::get(Url::parse(&server.url("/api/me/")).unwrap());
        let response = ReqwestTransport::new().unwrap().send(request).await.unwrap();

        assert!(response.is_unauthorized());
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let request = ApiRequest::get(Url::parse("http://127.0.0.1:1/").unwrap());

        let error = ReqwestTransport::new().unwrap().send(request).await.unwrap_err();

        assert!(matches!(error, TransportError::ConnectionFailed(_)));
    }
}
