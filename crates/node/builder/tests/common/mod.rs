//! Recording subsystem doubles for orchestrator tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use alloy_primitives::B256;
use async_trait::async_trait;
use hearth_chain::TxPoolConfig;
use hearth_chain_primitives::{
    ChainConfig, ExecutionConfig, Genesis, GenesisError, GenesisSetup, Header, Transaction,
};
use hearth_net_peer::{NodeId, PeerEndpoint};
use hearth_node_api::{
    ChainEngine, ChainError, ConsensusEngine, EventBus, ListenConfig, NetworkServer, PoolError,
    ProtocolContext, ProtocolDescriptor, ProtocolHandler, SubsystemError, SubsystemResult,
    TransactionPool,
};
use hearth_node_builder::NodeComponents;
use hearth_node_core::config::{GenesisPreset, NodeConfig};
use hearth_node_core::identity::NodeIdentity;
use hearth_storage::{KeyValueStore, MemoryStore, StorageError, StorageResult, StoreOptions};
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Ordered record of lifecycle calls across all doubles.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, call: impl Into<String>) {
        self.0.lock().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.0.lock().iter().filter(|c| *c == call).count()
    }

    pub fn position(&self, call: &str) -> Option<usize> {
        self.0.lock().iter().position(|c| c == call)
    }

    /// Calls whose name ends in `.stop` or `.close`.
    pub fn releases(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.ends_with(".stop") || c.ends_with(".close"))
            .collect()
    }
}

/// Which doubles misbehave.
#[derive(Debug, Clone, Default)]
pub struct Faults {
    pub handler_build: bool,
    pub server_start: bool,
    pub handler_start: bool,
    /// Subsystems whose stop returns an error ("chain", "handler", "pool",
    /// "store", "server").
    pub stop_errors: HashSet<&'static str>,
    /// Subsystem whose stop never completes.
    pub stop_hangs: Option<&'static str>,
    pub genesis: Option<fn(&Genesis) -> GenesisError>,
}

#[derive(Debug, Clone, Default)]
pub struct MockComponents {
    pub log: CallLog,
    pub faults: Faults,
}

impl MockComponents {
    pub fn with_faults(faults: Faults) -> Self {
        Self {
            log: CallLog::default(),
            faults,
        }
    }

    fn stop_result(&self, name: &'static str) -> SubsystemResult<()> {
        self.log.push(format!("{name}.stop"));
        if self.faults.stop_errors.contains(name) {
            return Err(SubsystemError::Other(format!("{name} refused to stop")));
        }
        Ok(())
    }

    async fn stop(&self, name: &'static str) -> SubsystemResult<()> {
        let result = self.stop_result(name);
        if self.faults.stop_hangs == Some(name) {
            std::future::pending::<()>().await;
        }
        result
    }
}

#[derive(Debug)]
pub struct MockStore {
    inner: MemoryStore,
    mock: MockComponents,
}

impl KeyValueStore for MockStore {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.inner.put(key, value)
    }

    fn delete(&self, key: &[u8]) -> StorageResult<()> {
        self.inner.delete(key)
    }

    fn close(&self) -> StorageResult<()> {
        self.mock.log.push("store.close");
        self.inner.close()?;
        if self.mock.faults.stop_errors.contains("store") {
            return Err(StorageError::Backend("close failed".into()));
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

#[derive(Debug)]
pub struct MockChain {
    mock: MockComponents,
    config: ChainConfig,
    genesis: Header,
    stopped: AtomicBool,
}

#[async_trait]
impl ChainEngine for MockChain {
    fn chain_config(&self) -> &ChainConfig {
        &self.config
    }

    fn genesis_hash(&self) -> B256 {
        self.genesis.hash()
    }

    fn head(&self) -> Result<Header, ChainError> {
        Ok(self.genesis.clone())
    }

    fn header_by_number(&self, number: u64) -> Result<Option<Header>, ChainError> {
        Ok((number == 0).then(|| self.genesis.clone()))
    }

    fn insert_header(&self, header: Header) -> Result<B256, ChainError> {
        Ok(header.hash())
    }

    async fn stop(&self) -> SubsystemResult<()> {
        self.stopped.store(true, Ordering::SeqCst);
        self.mock.stop("chain").await
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct MockPool {
    mock: MockComponents,
}

#[async_trait]
impl TransactionPool for MockPool {
    fn add(&self, tx: Transaction) -> Result<B256, PoolError> {
        Ok(tx.hash())
    }

    fn pending_count(&self) -> usize {
        0
    }

    async fn stop(&self) -> SubsystemResult<()> {
        self.mock.stop("pool").await
    }
}

#[derive(Debug)]
pub struct MockHandler {
    mock: MockComponents,
    dispatcher: mpsc::Sender<hearth_node_api::PeerConnection>,
}

#[async_trait]
impl ProtocolHandler for MockHandler {
    fn sub_protocols(&self) -> Vec<ProtocolDescriptor> {
        vec![ProtocolDescriptor {
            name: "mock",
            version: 1,
            length: 1,
            dispatcher: self.dispatcher.clone(),
        }]
    }

    async fn start(&self, max_peers: usize) -> SubsystemResult<()> {
        self.mock.log.push(format!("handler.start({max_peers})"));
        if self.mock.faults.handler_start {
            return Err(SubsystemError::Other("handler start failed".into()));
        }
        Ok(())
    }

    async fn stop(&self) -> SubsystemResult<()> {
        self.mock.stop("handler").await
    }

    fn peer_count(&self) -> usize {
        0
    }
}

#[derive(Debug)]
pub struct MockServer {
    mock: MockComponents,
    listen: ListenConfig,
}

#[async_trait]
impl NetworkServer for MockServer {
    fn max_peers(&self) -> usize {
        self.listen.max_peers
    }

    async fn start(&self) -> SubsystemResult<()> {
        self.mock.log.push("server.start");
        if self.mock.faults.server_start {
            return Err(SubsystemError::Bind {
                addr: self.listen.listen_addr,
                source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
            });
        }
        Ok(())
    }

    fn seal(&self) {
        self.mock.log.push("server.seal");
    }

    async fn stop(&self) -> SubsystemResult<()> {
        self.mock.stop("server").await
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        None
    }

    fn peer_count(&self) -> usize {
        0
    }
}

impl NodeComponents for MockComponents {
    fn open_store(
        &self,
        _path: &Path,
        _options: StoreOptions,
    ) -> StorageResult<Arc<dyn KeyValueStore>> {
        self.log.push("store.open");
        Ok(Arc::new(MockStore {
            inner: MemoryStore::new(),
            mock: self.clone(),
        }))
    }

    fn setup_genesis(
        &self,
        store: &dyn KeyValueStore,
        genesis: &Genesis,
    ) -> Result<GenesisSetup, GenesisError> {
        self.log.push("genesis.setup");
        match self.faults.genesis {
            Some(fault) => Err(fault(genesis)),
            None => hearth_chain::setup_genesis(store, genesis),
        }
    }

    fn build_chain(
        &self,
        _store: Arc<dyn KeyValueStore>,
        setup: &GenesisSetup,
        _consensus: Arc<dyn ConsensusEngine>,
        _execution: ExecutionConfig,
    ) -> SubsystemResult<Arc<dyn ChainEngine>> {
        self.log.push("chain.build");
        Ok(Arc::new(MockChain {
            mock: self.clone(),
            config: setup.config.clone(),
            genesis: Genesis::dev().to_header(),
            stopped: AtomicBool::new(false),
        }))
    }

    fn build_tx_pool(
        &self,
        _config: TxPoolConfig,
        _chain: Arc<dyn ChainEngine>,
        _events: Arc<EventBus>,
    ) -> SubsystemResult<Arc<dyn TransactionPool>> {
        self.log.push("pool.build");
        Ok(Arc::new(MockPool { mock: self.clone() }))
    }

    fn build_handler(&self, _ctx: ProtocolContext) -> SubsystemResult<Arc<dyn ProtocolHandler>> {
        self.log.push("handler.build");
        if self.faults.handler_build {
            return Err(SubsystemError::Other("handler construction failed".into()));
        }
        let (dispatcher, _) = mpsc::channel(1);
        Ok(Arc::new(MockHandler {
            mock: self.clone(),
            dispatcher,
        }))
    }

    fn build_server(
        &self,
        listen: ListenConfig,
        _local_id: NodeId,
        _bootnodes: Vec<PeerEndpoint>,
        _protocols: Vec<ProtocolDescriptor>,
    ) -> SubsystemResult<Arc<dyn NetworkServer>> {
        self.log.push("server.build");
        Ok(Arc::new(MockServer {
            mock: self.clone(),
            listen,
        }))
    }
}

/// A random, well-formed enode URL.
pub fn enode(port: u16) -> String {
    let id = alloy_primitives::hex::encode(NodeIdentity::random().id());
    format!("enode://{id}@127.0.0.1:{port}")
}

/// Write a bootnode file with three valid entries and one truncated line.
pub fn write_bootnodes(dir: &Path) -> PathBuf {
    let truncated = enode(30303);
    let truncated = truncated.get(..40).unwrap_or(&truncated);
    let contents = format!(
        "# seed peers\n{}\n{}\n\n{truncated}\n{}\n",
        enode(30301),
        enode(30302),
        enode(30304),
    );
    let path = dir.join("bootnodes.txt");
    fs::write(&path, contents).unwrap();
    path
}

/// A valid configuration rooted in `dir`.
pub fn config_in(dir: &TempDir) -> NodeConfig {
    let mut config = NodeConfig {
        bootnodes_path: write_bootnodes(dir.path()),
        node_database_path: dir.path().join("db"),
        ..Default::default()
    };
    config.chain.genesis = GenesisPreset::Dev;
    config.network.network_id = 1337;
    config.network.listen_addr = [127, 0, 0, 1].into();
    config.network.port = 0;
    config.shutdown.step_timeout_secs = 1;
    config
}
