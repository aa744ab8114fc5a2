//! TCP connection handler
//!
//! Handles one client connection end to end: registration handshake,
//! the read loop, and teardown. Outbound lines go through a per-client
//! channel drained by a dedicated write task.

use std::future::Future;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::client::Member;
use crate::config::ServerConfig;
use crate::error::AppError;
use crate::message::{decode_line, ClientLine, ServerLine};
use crate::registry::Registry;
use crate::transfer::{self, TransferOutcome};
use crate::types::ClientId;

/// Handle a new TCP connection
///
/// Reads the registration lines, joins the member to its room, and runs
/// the read loop in its own task. Deregistration and the departure
/// notices run however that task ends, including by panic.
pub async fn handle_connection(
    stream: TcpStream,
    registry: Arc<Registry>,
    config: Arc<ServerConfig>,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let client_id = ClientId::new();
    let (read_half, write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let Some((username, room)) = read_registration(&mut reader).await? else {
        info!(
            "Client {} from {} disconnected before registering",
            client_id, peer_addr
        );
        return Ok(());
    };

    info!(
        "Client {} from {} registered as '{}' in '{}'",
        client_id, peer_addr, username, room
    );

    // Channel for server -> client lines
    let (line_tx, line_rx) = mpsc::channel::<ServerLine>(config.outbound_buffer.max(1));
    let mut write_task = tokio::spawn(write_lines(write_half, line_rx, client_id));

    let member = Member::new(client_id, username.clone(), line_tx);
    let snapshot = registry.join(&room, member).await;
    snapshot.announce(ServerLine::Joined {
        username: username.clone(),
    });
    drop(snapshot);

    let session = Session {
        client_id,
        username: username.clone(),
        room: room.clone(),
        registry: Arc::clone(&registry),
        config: Arc::clone(&config),
    };
    let result =
        run_registered(session.run(reader), &registry, &room, client_id, username).await;

    // The registry no longer holds this member's sender, so the write task
    // finishes once the queue is flushed.
    if tokio::time::timeout(config.shutdown_grace(), &mut write_task)
        .await
        .is_err()
    {
        warn!("Write task for {} did not finish, aborting", client_id);
        write_task.abort();
    }

    info!("Client {} disconnected", client_id);

    result
}

/// Run a registered member's read loop in its own task, then deregister
///
/// The member leaves its room and the departure is announced whether the
/// loop returned `Ok`, returned `Err`, or panicked. The loop's own error is
/// returned after teardown.
async fn run_registered<F>(
    session: F,
    registry: &Registry,
    room: &str,
    client_id: ClientId,
    username: String,
) -> Result<(), AppError>
where
    F: Future<Output = Result<(), AppError>> + Send + 'static,
{
    let result = match tokio::spawn(session).await {
        Ok(result) => result,
        Err(e) => {
            error!("Session task for {} ended abnormally: {}", client_id, e);
            Ok(())
        }
    };

    if let Some(snapshot) = registry.leave(room, client_id).await {
        snapshot.announce(ServerLine::Left { username });
    }

    result
}

/// Read the two registration lines: display name, then room name
///
/// Returns None if the peer closes the connection before sending both.
/// Empty names are accepted.
async fn read_registration<R>(reader: &mut R) -> Result<Option<(String, String)>, AppError>
where
    R: AsyncBufRead + Unpin,
{
    let Some(username) = read_trimmed_line(reader).await? else {
        return Ok(None);
    };
    let Some(room) = read_trimmed_line(reader).await? else {
        return Ok(None);
    };
    Ok(Some((username, room)))
}

/// Read one line; None on EOF
async fn read_trimmed_line<R>(reader: &mut R) -> Result<Option<String>, AppError>
where
    R: AsyncBufRead + Unpin,
{
    let mut raw = Vec::new();
    if reader.read_until(b'\n', &mut raw).await? == 0 {
        return Ok(None);
    }
    Ok(Some(decode_line(&raw)))
}

/// Drain the outbound channel into the socket
async fn write_lines(
    mut writer: OwnedWriteHalf,
    mut line_rx: mpsc::Receiver<ServerLine>,
    client_id: ClientId,
) {
    while let Some(line) = line_rx.recv().await {
        if let Err(e) = writer.write_all(line.to_wire().as_bytes()).await {
            debug!("Write to {} failed, ending write task: {}", client_id, e);
            break;
        }
    }

    let _ = writer.shutdown().await;
    debug!("Write task ended for {}", client_id);
}

/// Steady-state state for one registered connection
struct Session {
    client_id: ClientId,
    username: String,
    room: String,
    registry: Arc<Registry>,
    config: Arc<ServerConfig>,
}

impl Session {
    /// Read and dispatch lines until EOF or a read error
    async fn run(self, mut reader: BufReader<OwnedReadHalf>) -> Result<(), AppError> {
        loop {
            let Some(line) = read_trimmed_line(&mut reader).await? else {
                debug!("Client {} closed the connection", self.client_id);
                return Ok(());
            };

            match ClientLine::decode(&line) {
                ClientLine::Chat(content) => {
                    let line = ServerLine::Chat {
                        from: self.username.clone(),
                        content,
                    };
                    self.registry.broadcast(&self.room, &line).await;
                }
                ClientLine::FileStart(filename) => {
                    match self.receive_upload(&mut reader, filename).await {
                        Err(AppError::ConnectionClosed) => {
                            debug!("Client {} closed the connection mid-upload", self.client_id);
                            return Ok(());
                        }
                        other => other?,
                    }
                }
            }
        }
    }

    /// Announce, receive, and confirm one file upload
    async fn receive_upload(
        &self,
        reader: &mut BufReader<OwnedReadHalf>,
        filename: String,
    ) -> Result<(), AppError> {
        info!(
            "Client {} is uploading '{}' to '{}'",
            self.client_id, filename, self.room
        );
        self.registry
            .broadcast(
                &self.room,
                &ServerLine::FileShared {
                    from: self.username.clone(),
                    filename: filename.clone(),
                },
            )
            .await;

        let outcome = match transfer::receive_file(
            reader,
            &self.config.upload_dir,
            &filename,
            self.config.chunk_size,
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(e) if e.is_recoverable() => {
                warn!("Upload from {} aborted: {}", self.client_id, e);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        match outcome {
            TransferOutcome::Complete { bytes } => {
                info!("Upload of '{}' complete ({} bytes)", filename, bytes);
            }
            TransferOutcome::Truncated { expected, received } => {
                warn!(
                    "Upload of '{}' from {} truncated at {}/{} bytes",
                    filename, self.client_id, received, expected
                );
            }
        }

        self.registry
            .broadcast(&self.room, &ServerLine::FileComplete { filename })
            .await;
        Ok(())
    }
}
