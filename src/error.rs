//! Error types for the chat relay
//!
//! Defines session-level errors and outbound send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// `Io` and `ConnectionClosed` end the session that hit them.
/// `InvalidFileSize` and `Upload` abort one file transfer and the
/// session carries on.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error on the owning connection (fatal for the session)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// The size line of a file transfer was not a decimal byte count
    #[error("Invalid file size: {0:?}")]
    InvalidFileSize(String),

    /// The destination file could not be created or written
    #[error("Upload of '{name}' failed: {source}")]
    Upload {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Peer closed the connection mid-protocol
    #[error("Connection closed")]
    ConnectionClosed,
}

impl AppError {
    /// Whether the session may keep reading after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AppError::InvalidFileSize(_) | AppError::Upload { .. })
    }
}

/// Message send errors
///
/// Occurs when attempting to send lines through closed channels.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,

    /// The member's outbound queue has no free slot
    #[error("Queue full")]
    QueueFull,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_errors_are_recoverable() {
        assert!(AppError::InvalidFileSize("abc".to_string()).is_recoverable());
        let upload = AppError::Upload {
            name: "a.txt".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(upload.is_recoverable());
    }

    #[test]
    fn test_connection_errors_are_fatal() {
        assert!(!AppError::ConnectionClosed.is_recoverable());
        let io = AppError::from(std::io::Error::from(std::io::ErrorKind::ConnectionReset));
        assert!(!io.is_recoverable());
    }

    #[test]
    fn test_invalid_file_size_message() {
        let err = AppError::InvalidFileSize("abc".to_string());
        assert_eq!(err.to_string(), "Invalid file size: \"abc\"");
    }
}
