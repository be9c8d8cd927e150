//! Spread Arbitrage API Server
//!
//! Serves venue prices, the live spread verdict and the execution endpoint
//! as JSON for the dashboard front end.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use spread_arb_core::{config::Config, SpreadMonitor};

mod executor;
mod logging;
mod routes;
mod state;

use executor::DisabledExecutor;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Invalid configuration")?;
    logging::setup(&config.log_level);

    info!("Starting Spread Arbitrage API");
    let pairs: Vec<String> = config.markets.iter().map(|m| m.pair.symbol()).collect();
    info!("  Pairs: {}", pairs.join(", "));
    info!("  Min spread threshold: {}%", config.min_spread_threshold);

    let monitor = SpreadMonitor::from_config(&config)?;

    let state = AppState::new(
        monitor,
        Arc::new(DisabledExecutor),
        config.max_snapshot_age_secs,
    );

    tokio::spawn(state::run_poller(
        state.clone(),
        Duration::from_millis(config.poll_interval_ms),
    ));

    let app = routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.api_port);
    let listener = TcpListener::bind(&addr).await?;
    info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    Ok(())
}
