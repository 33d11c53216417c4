//! Router tests against mocked identity providers.
//!
//! Both providers point at one mock server; the in-memory cache stands in
//! for Redis.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode, header},
};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use carmart::{AppState, create_app};
use carmart_application::ports::TokenCache;
use carmart_domain::TokenRecord;
use carmart_infrastructure::{InMemoryTokenCache, Settings};
use httpmock::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt;

const TTL: Duration = Duration::from_secs(600);

/// Unsigned JWT expiring `seconds` from now.
fn jwt(seconds: i64, marker: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256"}"#);
    let claims = json!({"exp": chrono::Utc::now().timestamp() + seconds, "jti": marker});
    format!("{header}.{}.sig", URL_SAFE_NO_PAD.encode(claims.to_string()))
}

fn record(access: &str, refresh: &str) -> TokenRecord {
    TokenRecord {
        access: access.to_string(),
        refresh: refresh.to_string(),
        refresh_attempts: 0,
    }
}

struct Harness {
    app: Router,
    cache: Arc<InMemoryTokenCache>,
}

fn harness(server: &MockServer) -> Harness {
    let mut settings = Settings::default();
    settings.providers.dummy.base_url = server.base_url();
    settings.providers.backend.base_url = server.base_url();

    let cache = Arc::new(InMemoryTokenCache::new());
    let state = AppState::new(settings.registry().unwrap(), cache.clone(), &settings).unwrap();
    Harness {
        app: create_app(state),
        cache,
    }
}

fn request(method: &str, uri: &str, session: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(provider) = session {
        builder = builder.header(header::COOKIE, format!("carmart_session={provider}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn set_cookie(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Should set the session cookie")
        .to_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_login_sets_session_cookie_and_caches_tokens() {
    let server = MockServer::start();
    let access = jwt(3600, "a1");
    let login = server.mock(|when, then| {
        when.method(POST)
            .path("/api/token/")
            .json_body(json!({"username": "ana", "password": "pw"}));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"access": access, "refresh": "r1"}));
    });
    let h = harness(&server);

    let response = h
        .app
        .oneshot(request(
            "POST",
            "/auth/backend/login",
            None,
            Some(json!({"username": "ana", "password": "pw"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).starts_with("carmart_session=backend;"));
    assert_eq!(json_body(response).await, json!({"provider": "backend"}));
    assert_eq!(
        h.cache.get("tokens:backend").await.unwrap(),
        Some(record(&access, "r1"))
    );
    login.assert();
}

#[tokio::test]
async fn test_rejected_login_sets_no_cookie() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/auth/login");
        then.status(401);
    });
    let h = harness(&server);

    let response = h
        .app
        .oneshot(request("POST", "/auth/dummy/login", None, Some(json!({}))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(json_body(response).await["error"], "invalid_credentials");
}

#[tokio::test]
async fn test_unknown_provider_is_not_found() {
    let server = MockServer::start();
    let h = harness(&server);

    let response = h
        .app
        .oneshot(request("POST", "/auth/google/login", None, Some(json!({}))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_session_status_reflects_cookie() {
    let server = MockServer::start();
    let h = harness(&server);

    let anonymous = h
        .app
        .clone()
        .oneshot(request("GET", "/auth/session", None, None))
        .await
        .unwrap();
    let signed_in = h
        .app
        .oneshot(request("GET", "/auth/session", Some("dummy"), None))
        .await
        .unwrap();

    assert_eq!(
        json_body(anonymous).await,
        json!({"authenticated": false, "provider": null})
    );
    assert_eq!(
        json_body(signed_in).await,
        json!({"authenticated": true, "provider": "dummy"})
    );
}

#[tokio::test]
async fn test_activate_switches_provider_only() {
    let server = MockServer::start();
    let h = harness(&server);
    h.cache
        .set("tokens:dummy", &record("a1", "r1"), TTL)
        .await
        .unwrap();

    let response = h
        .app
        .oneshot(request("POST", "/auth/backend/activate", Some("dummy"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).starts_with("carmart_session=backend;"));
    assert!(h.cache.get("tokens:dummy").await.unwrap().is_some());
}

#[tokio::test]
async fn test_proxy_requires_session() {
    let server = MockServer::start();
    let h = harness(&server);

    let response = h
        .app
        .oneshot(request("GET", "/api/listings/", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "no_session");
}

#[tokio::test]
async fn test_proxy_forwards_with_bearer() {
    let server = MockServer::start();
    let access = jwt(3600, "a1");
    let listings = server.mock(|when, then| {
        when.method(GET)
            .path("/listings/")
            .query_param("page", "2")
            .header("authorization", format!("Bearer {access}"));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"results": []}));
    });
    let h = harness(&server);
    h.cache
        .set("tokens:backend", &record(&access, "r1"), TTL)
        .await
        .unwrap();

    let response = h
        .app
        .oneshot(request("GET", "/api/listings/?page=2", Some("backend"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"results": []}));
    listings.assert();
}

#[tokio::test]
async fn test_proxy_refreshes_once_after_401() {
    let server = MockServer::start();
    let stale = jwt(3600, "a1");
    let renewed = jwt(3600, "a2");
    server.mock(|when, then| {
        when.method(GET)
            .path("/favorites/")
            .header("authorization", format!("Bearer {stale}"));
        then.status(401);
    });
    let accepted = server.mock(|when, then| {
        when.method(GET)
            .path("/favorites/")
            .header("authorization", format!("Bearer {renewed}"));
        then.status(200).json_body(json!([]));
    });
    let refresh = server.mock(|when, then| {
        when.method(POST)
            .path("/api/token/refresh/")
            .json_body(json!({"refresh": "r1"}));
        then.status(200)
            .json_body(json!({"access": renewed, "refresh": "r2"}));
    });
    let h = harness(&server);
    h.cache
        .set("tokens:backend", &record(&stale, "r1"), TTL)
        .await
        .unwrap();

    let response = h
        .app
        .oneshot(request("GET", "/api/favorites/", Some("backend"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(refresh.calls(), 1);
    assert_eq!(accepted.calls(), 1);
    assert_eq!(
        h.cache.get("tokens:backend").await.unwrap(),
        Some(record(&renewed, "r2"))
    );
}

#[tokio::test]
async fn test_repeated_401_ends_session() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/profile/");
        then.status(401);
    });
    let refresh = server.mock(|when, then| {
        when.method(POST).path("/api/token/refresh/");
        then.status(200)
            .json_body(json!({"access": jwt(3600, "a2"), "refresh": "r2"}));
    });
    let h = harness(&server);
    h.cache
        .set("tokens:backend", &record(&jwt(3600, "a1"), "r1"), TTL)
        .await
        .unwrap();

    let response = h
        .app
        .oneshot(request("GET", "/api/profile/", Some("backend"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie(&response).contains("Max-Age=0"));
    assert_eq!(json_body(response).await["error"], "authentication_required");
    assert_eq!(refresh.calls(), 1);
}

#[tokio::test]
async fn test_refresh_outage_is_service_unavailable() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/auth/refresh");
        then.status(500);
    });
    let h = harness(&server);
    let expiring = jwt(10, "a1");
    h.cache
        .set("tokens:dummy", &record(&expiring, "r1"), TTL)
        .await
        .unwrap();

    let response = h
        .app
        .oneshot(request("GET", "/api/cars/", Some("dummy"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(
        h.cache
            .get("tokens:dummy")
            .await
            .unwrap()
            .unwrap()
            .refresh_attempts,
        1
    );
}

#[tokio::test]
async fn test_logout_deletes_every_record() {
    let server = MockServer::start();
    let h = harness(&server);
    h.cache
        .set("tokens:dummy", &record("a1", "r1"), TTL)
        .await
        .unwrap();
    h.cache
        .set("tokens:backend", &record("a2", "r2"), TTL)
        .await
        .unwrap();

    let response = h
        .app
        .clone()
        .oneshot(request("POST", "/auth/logout", Some("dummy"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(set_cookie(&response).starts_with("carmart_session=;"));
    assert!(h.cache.is_empty().await);

    let again = h
        .app
        .oneshot(request("POST", "/auth/logout", None, None))
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::NO_CONTENT);
}
