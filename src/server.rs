//! Relay server listener
//!
//! Binds the TCP listener and spawns one handler task per accepted
//! connection. All tasks share one `Registry`.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::handler::handle_connection;
use crate::registry::Registry;

/// TCP chat relay server
pub struct RelayServer {
    listener: TcpListener,
    registry: Arc<Registry>,
    config: Arc<ServerConfig>,
}

impl RelayServer {
    /// Bind to the address in `config` with a fresh registry
    pub async fn bind(config: ServerConfig) -> Result<Self, AppError> {
        Self::with_registry(config, Arc::new(Registry::new())).await
    }

    /// Bind to the address in `config`, sharing an existing registry
    pub async fn with_registry(
        config: ServerConfig,
        registry: Arc<Registry>,
    ) -> Result<Self, AppError> {
        let listener = TcpListener::bind(config.bind_addr()).await?;
        info!("Chat relay listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            registry,
            config: Arc::new(config),
        })
    }

    /// Get the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Accept connections until the process is stopped
    ///
    /// A failed accept or a failing connection is logged; neither stops
    /// the loop.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    info!("New connection from {}", addr);
                    let registry = Arc::clone(&self.registry);
                    let config = Arc::clone(&self.config);

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, registry, config).await {
                            error!("Connection handler error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}
