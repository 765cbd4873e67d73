use anyhow::Context;
use clinic_pay_server::shared::LoggingUtils;
use clinic_pay_server::{AppConfig, HttpServer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;

    LoggingUtils::initialize(&config.logging).context("failed to initialize logging")?;

    info!("Starting clinic payment confirmation server...");
    info!(
        gateway = %config.gateway.base_url,
        max_attempts = config.polling.max_attempts,
        poll_interval_ms = config.polling.poll_interval_ms,
        "Configuration loaded"
    );

    let server = HttpServer::new(config).context("failed to initialize server")?;

    info!("Server starting on {}", server.config().server_address());
    server.run().await.context("server error")?;

    Ok(())
}
