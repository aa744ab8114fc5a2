//! Chat Relay - Entry Point
//!
//! Loads configuration, starts the TCP listener and serves connections.

use std::env;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use chat_relay::{RelayServer, ServerConfig};

/// Environment variable naming an optional TOML config file
const CONFIG_ENV: &str = "CHAT_RELAY_CONFIG";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chat_relay=info")),
        )
        .init();

    let mut config = match env::var(CONFIG_ENV) {
        Ok(path) => {
            info!("Loading config from {}", path);
            ServerConfig::load(&path)?
        }
        Err(_) => ServerConfig::default(),
    };

    // Bind address from command line overrides the config
    if let Some(addr) = env::args().nth(1) {
        if !config.set_bind_addr(&addr) {
            warn!("Ignoring invalid bind address '{}'", addr);
        }
    }

    let server = RelayServer::bind(config).await?;
    server.run().await;

    Ok(())
}
