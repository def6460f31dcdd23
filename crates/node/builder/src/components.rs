use std::path::Path;
use std::sync::Arc;

use hearth_chain::{Blockchain, FakeConsensus, TxPool, TxPoolConfig};
use hearth_chain_primitives::{ExecutionConfig, Genesis, GenesisError, GenesisSetup};
use hearth_net_eth::EthHandler;
use hearth_net_peer::{NodeId, PeerEndpoint};
use hearth_net_server::TcpServer;
use hearth_node_api::{
    ChainEngine, ConsensusEngine, EventBus, ListenConfig, NetworkServer, ProtocolContext,
    ProtocolDescriptor, ProtocolHandler, SubsystemResult, TransactionPool,
};
use hearth_storage::{KeyValueStore, StorageResult, StoreOptions};
use hearth_storage_redb::RedbStore;

/// Factory for the subsystems a [`Node`](crate::Node) is built from.
///
/// Each method constructs one subsystem from the ones built before it. The
/// orchestrator owns ordering and rollback; implementations only construct.
pub trait NodeComponents: Send + Sync {
    fn open_store(
        &self,
        path: &Path,
        options: StoreOptions,
    ) -> StorageResult<Arc<dyn KeyValueStore>>;

    fn setup_genesis(
        &self,
        store: &dyn KeyValueStore,
        genesis: &Genesis,
    ) -> Result<GenesisSetup, GenesisError> {
        hearth_chain::setup_genesis(store, genesis)
    }

    fn consensus(&self) -> Arc<dyn ConsensusEngine> {
        Arc::new(FakeConsensus::new())
    }

    fn build_chain(
        &self,
        store: Arc<dyn KeyValueStore>,
        setup: &GenesisSetup,
        consensus: Arc<dyn ConsensusEngine>,
        execution: ExecutionConfig,
    ) -> SubsystemResult<Arc<dyn ChainEngine>>;

    fn build_tx_pool(
        &self,
        config: TxPoolConfig,
        chain: Arc<dyn ChainEngine>,
        events: Arc<EventBus>,
    ) -> SubsystemResult<Arc<dyn TransactionPool>>;

    fn build_handler(&self, ctx: ProtocolContext) -> SubsystemResult<Arc<dyn ProtocolHandler>>;

    fn build_server(
        &self,
        listen: ListenConfig,
        local_id: NodeId,
        bootnodes: Vec<PeerEndpoint>,
        protocols: Vec<ProtocolDescriptor>,
    ) -> SubsystemResult<Arc<dyn NetworkServer>>;
}

/// Production wiring: redb store, header chain, in-memory pool, `eth`
/// handler and TCP server.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultComponents;

impl NodeComponents for DefaultComponents {
    fn open_store(
        &self,
        path: &Path,
        options: StoreOptions,
    ) -> StorageResult<Arc<dyn KeyValueStore>> {
        Ok(Arc::new(RedbStore::open(path, options)?))
    }

    fn build_chain(
        &self,
        store: Arc<dyn KeyValueStore>,
        setup: &GenesisSetup,
        consensus: Arc<dyn ConsensusEngine>,
        execution: ExecutionConfig,
    ) -> SubsystemResult<Arc<dyn ChainEngine>> {
        let chain = Blockchain::new(
            store,
            setup.config.clone(),
            setup.genesis_hash,
            consensus,
            execution,
        )?;
        Ok(Arc::new(chain))
    }

    fn build_tx_pool(
        &self,
        config: TxPoolConfig,
        chain: Arc<dyn ChainEngine>,
        events: Arc<EventBus>,
    ) -> SubsystemResult<Arc<dyn TransactionPool>> {
        Ok(Arc::new(TxPool::new(config, chain, events)))
    }

    fn build_handler(&self, ctx: ProtocolContext) -> SubsystemResult<Arc<dyn ProtocolHandler>> {
        Ok(Arc::new(EthHandler::new(ctx)))
    }

    fn build_server(
        &self,
        listen: ListenConfig,
        local_id: NodeId,
        bootnodes: Vec<PeerEndpoint>,
        protocols: Vec<ProtocolDescriptor>,
    ) -> SubsystemResult<Arc<dyn NetworkServer>> {
        Ok(Arc::new(TcpServer::new(listen, local_id, bootnodes, protocols)))
    }
}
