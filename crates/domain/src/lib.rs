//! Carmart Domain - Core authentication types
//!
//! This crate defines the domain model for the authentication bridge
//! between the marketplace front end and its identity providers.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod error;
pub mod http;
pub mod session;

pub use auth::{
    AuthError, ProviderConfig, ProviderId, TokenExpiry, TokenPair, TokenRecord, jwt,
};
pub use error::{DomainError, DomainResult};
pub use http::{ApiRequest, ApiResponse, HttpMethod, StatusCode};
pub use session::{FrontendSession, SESSION_COOKIE_NAME};
