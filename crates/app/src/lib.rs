//! Carmart - Authentication bridge HTTP server
//!
//! Exposes sign-in, provider switching, sign-out and an authenticated
//! pass-through to the active provider's API.

pub mod cookie;
pub mod error;
mod routes;
pub mod state;

use std::net::SocketAddr;

use axum::Router;
use axum::routing::{any, get, post};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use cookie::{CookiePolicy, CookieSession};
pub use error::{ApiError, StartupError};
pub use state::AppState;

/// Builds the HTTP router.
#[must_use]
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/auth/session", get(routes::session_status))
        .route("/auth/logout", post(routes::logout))
        .route("/auth/{provider}/login", post(routes::login))
        .route("/auth/{provider}/activate", post(routes::activate))
        .route("/api/{*path}", any(routes::proxy))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the router on `addr` until the process stops.
///
/// # Errors
/// Returns [`StartupError::Io`] if the listener cannot be bound.
pub async fn run_server(state: AppState, addr: SocketAddr) -> Result<(), StartupError> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, create_app(state)).await?;
    Ok(())
}
