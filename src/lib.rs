//! Line-based TCP Chat Relay Library
//!
//! Clients connect over TCP, register with a display name and a room
//! name, then exchange newline-delimited chat lines and inline file
//! uploads with the other members of that room.
//!
//! # Features
//! - Named rooms, created on first join and removed when empty
//! - Chat relay to every member of the sender's room
//! - `Rooms:` / `Users:` presence rosters after every join and leave
//! - Inline file uploads (`FILE:<name>`, size line, raw bytes)
//!
//! # Architecture
//! - `Registry` is the single piece of shared state, guarded by one mutex
//! - Each connection runs in its own `handler` task and mutates the registry
//! - Each connection also has a write task fed by an `mpsc` channel, so
//!   broadcasts never write to sockets while the registry is locked
//!
//! # Example
//! ```ignore
//! use chat_relay::{RelayServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = RelayServer::bind(ServerConfig::default()).await.unwrap();
//!     server.run().await;
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod room;
pub mod server;
pub mod transfer;
pub mod types;

// Re-export main types for convenience
pub use client::Member;
pub use config::ServerConfig;
pub use error::{AppError, SendError};
pub use handler::handle_connection;
pub use message::{ClientLine, ServerLine};
pub use registry::{PresenceSnapshot, Registry};
pub use room::Room;
pub use server::RelayServer;
pub use transfer::TransferOutcome;
pub use types::ClientId;
