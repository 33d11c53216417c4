//! Outbound API request

use url::Url;

use super::HttpMethod;

/// Header name that carries the bearer credential.
pub const AUTHORIZATION: &str = "Authorization";

/// A downstream API call, cloneable so it can be replayed after a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute target URL.
    pub url: Url,
    /// Request headers in send order.
    pub headers: Vec<(String, String)>,
    /// Optional body bytes.
    pub body: Option<Vec<u8>>,
}

impl ApiRequest {
    /// Creates a request without headers or body.
    #[must_use]
    pub const fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub const fn get(url: Url) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Returns a copy carrying `token` as its only Authorization header.
    #[must_use]
    pub fn with_bearer(&self, token: &str) -> Self {
        let mut request = self.clone();
        request
            .headers
            .retain(|(name, _)| !name.eq_ignore_ascii_case(AUTHORIZATION));
        request
            .headers
            .push((AUTHORIZATION.to_string(), format!("Bearer {token}")));
        request
    }

    /// Returns the first value of the named header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_with_bearer_replaces_existing_authorization() {
        let request = ApiRequest::get(Url::parse("https://api.example.com/cars").unwrap())
            .with_header("authorization", "Basic abc")
            .with_header("Accept", "application/json");

        let authed = request.with_bearer("tok");
        assert_eq!(authed.header("Authorization"), Some("Bearer tok"));
        assert_eq!(
            authed
                .headers
                .iter()
                .filter(|(k, _)| k.eq_ignore_ascii_case(AUTHORIZATION))
                .count(),
            1
        );
        assert_eq!(authed.header("accept"), Some("application/json"));
        assert_eq!(request.header("Authorization"), Some("Basic abc"));
    }
}
