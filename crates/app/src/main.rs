//! Carmart authentication bridge binary.

use carmart::AppState;
use carmart_infrastructure::Settings;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load()?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        default_provider = %settings.default_provider,
        "starting Carmart"
    );

    let state = AppState::from_settings(&settings)?;
    carmart::run_server(state, settings.server.bind).await?;

    Ok(())
}
