//! Request handlers.
//!
//! - POST `/auth/{provider}/login` - Sign in with credentials
//! - POST `/auth/{provider}/activate` - Switch the active provider
//! - GET `/auth/session` - Describe the front-end session
//! - POST `/auth/logout` - Sign out of every provider
//! - ANY `/api/{*path}` - Forward to the active provider's API

use axum::{
    Json,
    body::{Body, to_bytes},
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use carmart_application::ports::SessionHandle;
use carmart_domain::{ApiRequest, ApiResponse, HttpMethod, ProviderId};
use serde::Serialize;
use serde_json::Value;

use crate::cookie::CookieSession;
use crate::error::ApiError;
use crate::state::AppState;

/// Largest request body forwarded to a provider API.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Request headers passed through to provider APIs.
const FORWARDED_HEADERS: [header::HeaderName; 3] =
    [header::CONTENT_TYPE, header::ACCEPT, header::ACCEPT_LANGUAGE];

/// Response headers that describe the hop, not the payload.
const HOP_HEADERS: [&str; 4] = ["connection", "transfer-encoding", "content-length", "keep-alive"];

#[derive(Serialize)]
struct ProviderBody {
    provider: ProviderId,
}

#[derive(Serialize)]
struct SessionBody {
    authenticated: bool,
    provider: Option<ProviderId>,
}

/// Finishes a response: clears the session for terminal auth errors and
/// emits any pending session cookie change.
fn respond(session: &CookieSession, result: Result<Response, ApiError>) -> Response {
    let mut response = match result {
        Ok(response) => response,
        Err(error) => {
            if error.ends_session() {
                session.clear();
            }
            error.into_response()
        }
    };

    if let Some(cookie) = session.set_cookie_header() {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}

pub async fn login(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    Json(credentials): Json<Value>,
) -> Response {
    let session = CookieSession::from_headers(&headers, state.cookies);
    let result = async {
        let provider: ProviderId = provider.parse()?;
        state.sign_in.sign_in(provider, &credentials, &session).await?;
        Ok::<_, ApiError>(Json(ProviderBody { provider }).into_response())
    }
    .await;
    respond(&session, result)
}

pub async fn activate(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
) -> Response {
    let session = CookieSession::from_headers(&headers, state.cookies);
    let result = provider.parse::<ProviderId>().map_err(ApiError::from).map(|provider| {
        state.sign_in.switch_provider(provider, &session);
        Json(ProviderBody { provider }).into_response()
    });
    respond(&session, result)
}

pub async fn session_status(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = CookieSession::from_headers(&headers, state.cookies);
    let provider = session.active_provider();
    Json(SessionBody {
        authenticated: provider.is_some(),
        provider,
    })
    .into_response()
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = CookieSession::from_headers(&headers, state.cookies);
    let result = state
        .cleanup
        .sign_out(&session)
        .await
        .map(|()| StatusCode::NO_CONTENT.into_response())
        .map_err(ApiError::from);
    respond(&session, result)
}

pub async fn proxy(
    State(state): State<AppState>,
    Path(path): Path<String>,
    request: Request,
) -> Response {
    let session = CookieSession::from_headers(request.headers(), state.cookies);
    let result = forward(&state, &session, &path, request).await;
    respond(&session, result)
}

async fn forward(
    state: &AppState,
    session: &CookieSession,
    path: &str,
    request: Request,
) -> Result<Response, ApiError> {
    let provider = session.active_provider().ok_or(ApiError::NoSession)?;
    let config = state.client.registry().get(provider);

    let method: HttpMethod = request.method().as_str().parse()?;
    let mut url = config.api_url(path)?;
    url.set_query(request.uri().query());

    let mut api_request = ApiRequest::new(method, url);
    for name in &FORWARDED_HEADERS {
        if let Some(value) = request.headers().get(name).and_then(|v| v.to_str().ok()) {
            api_request = api_request.with_header(name.as_str(), value);
        }
    }

    let body = to_bytes(request.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|e| ApiError::Body(e.to_string()))?;
    if !body.is_empty() {
        api_request = api_request.with_body(body.to_vec());
    }

    let response = state.client.request(provider, api_request).await?;
    into_axum_response(response)
}

fn into_axum_response(response: ApiResponse) -> Result<Response, ApiError> {
    let mut builder = Response::builder().status(response.status.as_u16());
    for (name, value) in &response.headers {
        if !HOP_HEADERS.iter().any(|hop| name.eq_ignore_ascii_case(hop)) {
            builder = builder.header(name.as_str(), value.as_str());
        }
    }
    builder
        .body(Body::from(response.body))
        .map_err(|e| ApiError::Body(e.to_string()))
}
