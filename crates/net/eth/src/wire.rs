//! Length-prefixed message framing.
//!
//! Each frame is a big-endian `u32` body length followed by the body: one
//! message-code byte and a postcard-encoded payload.

use alloy_primitives::B256;
use hearth_net_peer::NodeId;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::ProtocolError;

/// Message code of the status message.
pub const STATUS_CODE: u8 = 0x00;

/// Largest accepted frame body.
pub const MAX_MESSAGE_SIZE: u32 = 10 * 1024 * 1024;

/// Handshake message exchanged when a session opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub protocol_version: u32,
    pub network_id: u64,
    pub head_hash: B256,
    pub genesis_hash: B256,
    pub node_id: NodeId,
}

pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    code: u8,
    payload: &[u8],
) -> Result<(), ProtocolError> {
    let len = u32::try_from(payload.len() + 1)
        .ok()
        .filter(|len| *len <= MAX_MESSAGE_SIZE)
        .ok_or(ProtocolError::MessageTooLarge(u32::MAX))?;
    writer.write_u32(len).await?;
    writer.write_u8(code).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame, returning its code and payload.
pub async fn read_message<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<(u8, Vec<u8>), ProtocolError> {
    let len = reader.read_u32().await?;
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge(len));
    }
    if len == 0 {
        return Err(ProtocolError::UnexpectedMessage(0xff));
    }
    let code = reader.read_u8().await?;
    let mut payload = vec![0u8; len as usize - 1];
    reader.read_exact(&mut payload).await?;
    Ok((code, payload))
}

pub async fn write_status<W: AsyncWrite + Unpin>(
    writer: &mut W,
    status: &Status,
) -> Result<(), ProtocolError> {
    write_message(writer, STATUS_CODE, &postcard::to_allocvec(status)?).await
}

pub async fn read_status<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Status, ProtocolError> {
    match read_message(reader).await? {
        (STATUS_CODE, payload) => Ok(postcard::from_bytes(&payload)?),
        (code, _) => Err(ProtocolError::UnexpectedMessage(code)),
    }
}
