//! Gateway binary for the Rogue game backend.
//!
//! Loads configuration, initializes structured logging, and runs the
//! gateway until `Ctrl-C`.

use anyhow::Context as _;
use rogue_gateway::GatewayConfig;
use rogue_gateway::config::LoggingConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::load().context("failed to load configuration")?;
    init_logging(&config.logging);

    info!(
        host = config.server.host,
        port = config.server.port,
        backend = ?config.store.backend,
        refresh_interval_secs = config.stats.refresh_interval_secs,
        "rogue-gateway starting"
    );

    rogue_gateway::startup::run(config)
        .await
        .context("gateway stopped with an error")?;

    info!("rogue-gateway exited");
    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
