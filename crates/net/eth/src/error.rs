use std::io;

use alloy_primitives::B256;
use hearth_net_peer::NodeId;
use hearth_node_api::ChainError;

/// Reasons a peer session ends abnormally.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("malformed message: {0}")]
    Decode(#[from] postcard::Error),
    #[error("message of {0} bytes exceeds limit")]
    MessageTooLarge(u32),
    #[error("unexpected message code {0:#04x}")]
    UnexpectedMessage(u8),
    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(u32),
    #[error("network id mismatch (ours {ours}, theirs {theirs})")]
    NetworkMismatch { ours: u64, theirs: u64 },
    #[error("genesis mismatch (ours {ours}, theirs {theirs})")]
    GenesisMismatch { ours: B256, theirs: B256 },
    #[error("peer {0} already connected")]
    AlreadyConnected(NodeId),
    #[error("too many peers")]
    TooManyPeers,
    #[error("handshake timed out")]
    HandshakeTimeout,
    #[error(transparent)]
    Chain(#[from] ChainError),
}
