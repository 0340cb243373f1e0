use anyhow::Result;
use payband_requests::{
    client::WalletApiClient,
    config::Config,
    handlers::{router, AppState},
    services::{CoordinatorSettings, EventBus, HealthCheck, RequestCoordinator, WalletService},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!("Starting payband-requests v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {:?}", config.environment);

    // Initialize services
    let wallet = Arc::new(WalletApiClient::new(
        &config.wallet_api_url,
        config.wallet_api_token.as_deref(),
        config.wallet_api_timeout,
    )?);
    if !wallet.is_healthy().await {
        tracing::warn!("Wallet API at {} is not reachable yet", wallet.base_url());
    }

    let events = EventBus::new(config.event_channel_capacity);
    let coordinator = Arc::new(RequestCoordinator::new(
        wallet.clone(),
        wallet.clone(),
        events.clone(),
        CoordinatorSettings::from(&config),
    ));

    let wallet_service = Arc::new(WalletService::new(
        wallet.clone(),
        wallet.clone(),
        coordinator.clone(),
    ));

    let app = router(AppState::new(
        coordinator.clone(),
        events,
        wallet_service,
        wallet,
    ));

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Request status stream: ws://{}/ws/request", addr);
    tracing::info!("Push event webhook: http://{}/events", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // leave no timers running against the backend after shutdown
    coordinator.reset().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl+c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down gracefully...");
}
