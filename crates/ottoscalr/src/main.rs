//! Autoscaling recommendation operator
//!
//! Serves health probes and engine metrics; the reconciliation loop that
//! drives recommendation workflows runs against this process.

use anyhow::Result;
use ottoscalr::{api, config::OperatorConfig};
use ottoscalr_lib::health::EngineHealth;
use ottoscalr_lib::observability::EngineMetrics;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const OPERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!(version = OPERATOR_VERSION, "Starting ottoscalr");

    let config = OperatorConfig::load()?;
    let engine = config.recommender_config();
    info!(
        metric_window_secs = engine.metric_window.as_secs(),
        metric_step_secs = engine.metric_step.as_secs(),
        red_line_util = engine.red_line_util,
        min_target = engine.min_target,
        max_target = engine.max_target,
        "Engine configured"
    );

    // Register the engine metrics before the first scrape arrives.
    EngineMetrics::new();

    let health = EngineHealth::new();
    let server = tokio::spawn(api::serve(config.api_port, health.clone()));
    health.mark_started();

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    server.abort();

    Ok(())
}
