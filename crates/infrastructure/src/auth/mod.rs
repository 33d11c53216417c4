//! Identity provider adapters

mod provider_client;

pub use provider_client::ProviderHttpClient;
