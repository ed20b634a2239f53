//! Trend Service - PSA trend & alert engine over HTTP
//!
//! Runs next to the record-keeping application, which posts a subject's
//! lab series and renders or dispatches the returned trend and alerts.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use trend_lib::{StructuredLogger, TrendEngine};
use trend_service::{api, config};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = config::ServiceConfig::load()?;
    info!(
        instance = %config.instance_name,
        normal_max = config.engine.normal_max,
        high_min = config.engine.high_min,
        "Service configured"
    );

    let logger = StructuredLogger::new(&config.instance_name);
    let engine = TrendEngine::new(config.engine.clone(), logger.clone())
        .context("Failed to initialize trend engine")?;

    let app_state = Arc::new(api::AppState::new(engine, SERVICE_VERSION));

    let addr = config.bind_addr();
    logger.log_startup(SERVICE_VERSION, &addr);

    let shutdown_logger = logger.clone();
    api::serve(&addr, app_state, async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        shutdown_logger.log_shutdown("SIGINT received");
    })
    .await?;

    info!("Shutting down");
    Ok(())
}
