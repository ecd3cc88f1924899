//! Frame layer for the metadata exchange.
//!
//! Each message crosses the wire as a 4-byte big-endian length prefix
//! followed by the protobuf payload. The prefix is transport-level framing,
//! not part of the message encoding.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ConnectorError, Result};

/// Maximum accepted frame payload. An inbound length above this is rejected
/// before any payload byte is read.
pub const MAX_FRAME_LEN: usize = 10 * 1024 * 1024;

/// Write one length-prefixed frame.
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, payload: &[u8]) -> Result<()> {
    if payload.len() > MAX_FRAME_LEN {
        return Err(ConnectorError::metadata_protocol(format!(
            "outbound frame of {} bytes exceeds the {MAX_FRAME_LEN}-byte limit",
            payload.len()
        )));
    }
    let len = payload.len() as u32;
    writer
        .write_all(&len.to_be_bytes())
        .await
        .map_err(write_error)?;
    writer.write_all(payload).await.map_err(write_error)?;
    writer.flush().await.map_err(write_error)?;
    Ok(())
}

/// Read one length-prefixed frame, enforcing [`MAX_FRAME_LEN`].
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await.map_err(read_error)?;

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(ConnectorError::metadata_protocol(format!(
            "frame of {len} bytes exceeds the {MAX_FRAME_LEN}-byte limit"
        )));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await.map_err(read_error)?;
    Ok(payload)
}

fn read_error(err: std::io::Error) -> ConnectorError {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        ConnectorError::metadata_protocol("connection closed mid-frame")
    } else {
        ConnectorError::metadata_protocol(format!("frame read failed: {err}"))
    }
}

fn write_error(err: std::io::Error) -> ConnectorError {
    ConnectorError::metadata_protocol(format!("frame write failed: {err}"))
}
