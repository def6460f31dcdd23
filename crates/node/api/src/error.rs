use std::io;
use std::net::SocketAddr;

use alloy_primitives::B256;
use hearth_chain_primitives::GenesisError;
use hearth_storage::StorageError;

/// Errors reported by subsystem lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum SubsystemError {
    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Genesis(#[from] GenesisError),
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error("{0} already started")]
    AlreadyStarted(&'static str),
    #[error("{0} already stopped")]
    AlreadyStopped(&'static str),
    #[error("{0}")]
    Other(String),
}

pub type SubsystemResult<T> = Result<T, SubsystemError>;

/// Header verification failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsensusError {
    #[error("header {number} does not extend its parent")]
    InvalidNumber { number: u64 },
    #[error("header {number} timestamp precedes its parent")]
    InvalidTimestamp { number: u64 },
    #[error("header {number} rejected by {engine}")]
    Rejected { engine: &'static str, number: u64 },
}

/// Errors from chain engine operations.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// The engine has been stopped.
    #[error("chain engine stopped")]
    Stopped,
    #[error("missing header {0}")]
    MissingHeader(B256),
    #[error("unknown parent {0}")]
    UnknownParent(B256),
    #[error(transparent)]
    Consensus(#[from] ConsensusError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors from transaction pool admission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("transaction pool full (capacity {capacity})")]
    Full { capacity: usize },
    #[error("known transaction {0}")]
    AlreadyKnown(B256),
    #[error("transaction pool stopped")]
    Stopped,
}
