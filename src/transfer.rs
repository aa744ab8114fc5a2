//! Inline file upload
//!
//! After a `FILE:<name>` line the client sends a decimal size line and
//! then exactly that many raw bytes on the same connection. The bytes are
//! streamed to disk chunk by chunk as they arrive.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::message::decode_line;

/// Result of a transfer whose payload was read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// All announced bytes were written
    Complete { bytes: u64 },
    /// The peer closed the connection early; a short file was left on disk
    Truncated { expected: u64, received: u64 },
}

/// Parse the size line of a transfer.
pub fn parse_size(line: &str) -> Result<u64, AppError> {
    line.parse::<u64>()
        .map_err(|_| AppError::InvalidFileSize(line.to_string()))
}

/// Destination for an upload. The name is used verbatim.
pub fn destination(upload_dir: &Path, name: &str) -> PathBuf {
    upload_dir.join(name)
}

/// Run the rest of a transfer after its `FILE:` line has been seen.
///
/// Reads the size line, then `size` raw bytes in reads of at most
/// `chunk_size`, writing each chunk to `upload_dir/name` immediately.
///
/// If the file cannot be created or written, the remaining payload is
/// still read and discarded so the connection stays in step, and
/// `AppError::Upload` is returned afterwards.
pub async fn receive_file<R>(
    reader: &mut R,
    upload_dir: &Path,
    name: &str,
    chunk_size: usize,
) -> Result<TransferOutcome, AppError>
where
    R: AsyncBufRead + Unpin,
{
    let mut raw = Vec::new();
    if reader.read_until(b'\n', &mut raw).await? == 0 {
        return Err(AppError::ConnectionClosed);
    }
    let expected = parse_size(&decode_line(&raw))?;

    let path = destination(upload_dir, name);
    debug!("Receiving {} bytes into {}", expected, path.display());

    let mut upload_error = None;
    let mut file = match File::create(&path).await {
        Ok(file) => Some(file),
        Err(e) => {
            upload_error = Some(e);
            None
        }
    };

    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut received: u64 = 0;
    while received < expected {
        let remaining = usize::try_from(expected - received).unwrap_or(usize::MAX);
        let want = buf.len().min(remaining);
        let n = reader.read(&mut buf[..want]).await?;
        if n == 0 {
            break;
        }
        received += n as u64;

        if let Some(f) = file.as_mut() {
            if let Err(e) = f.write_all(&buf[..n]).await {
                upload_error = Some(e);
                file = None;
            }
        }
    }

    if let Some(mut f) = file {
        if let Err(e) = f.flush().await {
            upload_error = Some(e);
        }
    }

    if let Some(source) = upload_error {
        return Err(AppError::Upload {
            name: name.to_string(),
            source,
        });
    }

    if received < expected {
        warn!(
            "Upload of '{}' cut short: {} of {} bytes",
            name, received, expected
        );
        return Ok(TransferOutcome::Truncated { expected, received });
    }

    Ok(TransferOutcome::Complete { bytes: received })
}
