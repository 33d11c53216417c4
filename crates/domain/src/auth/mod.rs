//! Authentication domain types

mod error;
pub mod jwt;
mod provider;
mod record;

pub use error::AuthError;
pub use jwt::TokenExpiry;
pub use provider::{ProviderConfig, ProviderId};
pub use record::{TokenPair, TokenRecord};
