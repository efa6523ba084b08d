// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use komari_ping_chart::application::ping_chart_service::PingChartService;
use komari_ping_chart::infrastructure::config::load_service_config;
use komari_ping_chart::infrastructure::komari_repository::KomariRepository;
use komari_ping_chart::presentation::app_state::AppState;
use komari_ping_chart::presentation::handlers::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG takes precedence, fallback to info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = load_service_config()?;

    // Create repository (infrastructure layer)
    let repository = Arc::new(KomariRepository::new(
        config.backend.base_url.clone(),
        Duration::from_secs(config.backend.timeout_secs),
    )?);

    // Create services (application layer)
    let chart_service = PingChartService::new(repository, config.chart.clone());

    let state = Arc::new(AppState { chart_service });

    let addr: SocketAddr = config
        .server
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.server.listen))?;
    tracing::info!(
        backend = %config.backend.base_url,
        "Starting komari-ping-chart service on {}",
        addr
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router(state)).await?;

    Ok(())
}
