//! Member struct definition
//!
//! A registered connection as seen by the registry: identity, display
//! name, and the channel feeding that connection's writer task.

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::message::ServerLine;
use crate::types::ClientId;

/// Registered room member
///
/// Cloning a `Member` clones the channel sender, so a snapshot can be
/// taken under the registry lock and written to after releasing it.
#[derive(Debug, Clone)]
pub struct Member {
    /// Connection identity
    pub id: ClientId,
    /// Name chosen at registration (may be empty)
    pub display_name: String,
    /// Server → Client line channel
    pub sender: mpsc::Sender<ServerLine>,
}

impl Member {
    /// Create a new member with the given ID, name and sender channel
    pub fn new(
        id: ClientId,
        display_name: impl Into<String>,
        sender: mpsc::Sender<ServerLine>,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            sender,
        }
    }

    /// Queue a line for this member
    ///
    /// Waits while the member's queue is full. Returns an error if the
    /// writer task has gone away.
    pub async fn send(&self, line: ServerLine) -> Result<(), SendError> {
        self.sender
            .send(line)
            .await
            .map_err(|_| SendError::ChannelClosed)
    }

    /// Queue a line only if there is room for it right now
    pub fn try_send(&self, line: ServerLine) -> Result<(), SendError> {
        self.sender.try_send(line).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }
}
