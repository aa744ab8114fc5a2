//! Server configuration
//!
//! Every field has a default, so an empty TOML file is a valid config.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::AppError;

/// Relay server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory uploaded files are written under.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Maximum bytes read from a connection per file chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Capacity of each member's outbound line queue.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
    /// How long a closing connection's writer may keep flushing.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_ms: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8888
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_chunk_size() -> usize {
    1024
}

fn default_outbound_buffer() -> usize {
    32
}

fn default_shutdown_grace() -> u64 {
    1000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            upload_dir: default_upload_dir(),
            chunk_size: default_chunk_size(),
            outbound_buffer: default_outbound_buffer(),
            shutdown_grace_ms: default_shutdown_grace(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, AppError> {
        Ok(toml::from_str(content)?)
    }

    /// `host:port` string to bind the listener to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Override host and port from a `host:port` string.
    ///
    /// Returns false and leaves the config untouched if the port is not a number.
    pub fn set_bind_addr(&mut self, addr: &str) -> bool {
        let Some((host, port)) = addr.rsplit_once(':') else {
            return false;
        };
        let Ok(port) = port.parse() else {
            return false;
        };
        self.host = host.to_string();
        self.port = port;
        true
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}
