use admin9_core::{config::Config, migration, server, telemetry};
use anyhow::Result;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let prometheus_handle = telemetry::init(&config.telemetry)?;

    // `admin9-core migrate` applies the schema and exits
    if std::env::args().nth(1).as_deref() == Some("migrate") {
        return migration::run_migrations(&config).await;
    }

    info!("Starting Admin9 Core Service");
    info!("HTTP server listening on {}", config.http_addr());

    server::run(config, prometheus_handle).await
}
