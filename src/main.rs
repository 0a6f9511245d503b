use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use casegen::config::Config;
use casegen::http;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    tracing::info!("Starting Test Case Generator API");
    tracing::info!("Backend base URL: {}", config.backend_base_url);
    tracing::info!("Default model: {}", config.default_model);
    tracing::info!(
        "System instructions file: {}",
        config.instructions_path.display()
    );

    http::start_http_server(Arc::new(config)).await
}
