use anyhow::{Context, Result};
use story_gateway_api::{ApiServer, AppState, GatewayConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "story_gateway=debug,tower_http=debug,axum=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Story Gateway...");

    let config = GatewayConfig::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    // Any unreachable dependency aborts startup
    let state = AppState::connect(&config)
        .await
        .context("Failed to connect to backing services")?;

    ApiServer::new(config, state)
        .start()
        .await
        .context("Server error")?;

    Ok(())
}
