//! Subsystem traits driven by the node orchestrator.

use std::fmt::Debug;
use std::net::SocketAddr;

use alloy_primitives::B256;
use async_trait::async_trait;
use hearth_chain_primitives::{ChainConfig, Header, Transaction};

use crate::{ChainError, ConsensusError, PoolError, ProtocolDescriptor, SubsystemResult};

/// Verifies headers before they are imported.
pub trait ConsensusEngine: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    fn verify_header(&self, header: &Header, parent: &Header) -> Result<(), ConsensusError>;
}

/// Block-processing engine over the chain store.
///
/// The engine is ready once constructed. After [`stop`](Self::stop) every
/// chain operation fails with [`ChainError::Stopped`].
#[async_trait]
pub trait ChainEngine: Send + Sync + Debug {
    fn chain_config(&self) -> &ChainConfig;

    fn genesis_hash(&self) -> B256;

    /// Current canonical head.
    fn head(&self) -> Result<Header, ChainError>;

    fn header_by_number(&self, number: u64) -> Result<Option<Header>, ChainError>;

    /// Verify and store a header, extending the canonical chain when it
    /// builds on the current head. Returns the header hash.
    fn insert_header(&self, header: Header) -> Result<B256, ChainError>;

    /// Stop the engine. Idempotent.
    async fn stop(&self) -> SubsystemResult<()>;

    fn is_stopped(&self) -> bool;
}

/// Pool of pending transactions.
#[async_trait]
pub trait TransactionPool: Send + Sync + Debug {
    fn add(&self, tx: Transaction) -> Result<B256, PoolError>;

    fn pending_count(&self) -> usize;

    /// Stop the pool and drop pending transactions. Idempotent.
    async fn stop(&self) -> SubsystemResult<()>;
}

/// Wire protocol handler.
#[async_trait]
pub trait ProtocolHandler: Send + Sync + Debug {
    /// Sub-protocols served by this handler, preferred first.
    fn sub_protocols(&self) -> Vec<ProtocolDescriptor>;

    /// Begin serving peers, admitting at most `max_peers` sessions.
    async fn start(&self, max_peers: usize) -> SubsystemResult<()>;

    /// Stop serving peers and wait for background work to end. Idempotent,
    /// and a no-op when never started.
    async fn stop(&self) -> SubsystemResult<()>;

    fn peer_count(&self) -> usize;
}

/// Transport-level server accepting and dialing peers.
#[async_trait]
pub trait NetworkServer: Send + Sync + Debug {
    fn max_peers(&self) -> usize;

    async fn start(&self) -> SubsystemResult<()>;

    /// Stop handing new connections to sub-protocols. The listener stays up.
    fn seal(&self);

    /// Stop accepting and dialing. Idempotent, and safe when never started
    /// or when start failed.
    async fn stop(&self) -> SubsystemResult<()>;

    /// Bound listener address while running.
    fn local_addr(&self) -> Option<SocketAddr>;

    fn peer_count(&self) -> usize;
}
