use std::sync::Arc;

use hearth_chain_primitives::{ChainConfig, NetworkId, SyncMode};
use hearth_net_peer::NodeId;
use hearth_storage::KeyValueStore;

use crate::{ChainEngine, ConsensusEngine, EventBus, TransactionPool};

/// Everything a protocol handler is constructed from.
#[derive(Debug, Clone)]
pub struct ProtocolContext {
    pub chain_config: ChainConfig,
    pub sync_mode: SyncMode,
    pub network_id: NetworkId,
    /// Identity advertised to peers.
    pub local_id: NodeId,
    pub events: Arc<EventBus>,
    pub tx_pool: Arc<dyn TransactionPool>,
    pub consensus: Arc<dyn ConsensusEngine>,
    pub chain: Arc<dyn ChainEngine>,
    pub store: Arc<dyn KeyValueStore>,
}
