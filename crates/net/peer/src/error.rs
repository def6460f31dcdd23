//! Errors produced while reading peer endpoints.

use std::path::PathBuf;

use crate::NodeId;

/// Reasons a single endpoint line is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeerParseError {
    #[error("invalid URL scheme {0:?}, want \"enode\"")]
    InvalidScheme(String),
    #[error("incomplete node: missing host and port")]
    Incomplete,
    #[error("invalid node ID: want 128 hex characters")]
    InvalidNodeId,
    #[error("invalid node ID: not a point on the secp256k1 curve")]
    NotOnCurve,
    #[error("invalid IP address {0:?}")]
    InvalidIp(String),
    #[error("invalid port {0:?}")]
    InvalidPort(String),
    #[error("invalid discport in query {0:?}")]
    InvalidDiscoveryPort(String),
    #[error("line is not valid UTF-8")]
    InvalidUtf8,
    #[error("duplicate node ID {0}")]
    Duplicate(NodeId),
}

/// Failure to read the bootnode source as a whole.
#[derive(Debug, thiserror::Error)]
pub enum BootnodeSourceError {
    /// No source path configured.
    #[error("a bootnodes file must be defined")]
    Unset,
    /// The source could not be opened or read.
    #[error("failed to read bootnodes file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
