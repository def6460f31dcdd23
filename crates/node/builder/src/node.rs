use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hearth_chain::TxPoolConfig;
use hearth_chain_primitives::GenesisError;
use hearth_net_peer::{BootnodeList, NodeId, PeerEndpoint};
use hearth_node_api::{
    ChainEngine, EventBus, NetworkServer, ProtocolContext, ProtocolHandler, SubsystemError,
    SubsystemResult, TransactionPool,
};
use hearth_node_core::config::NodeConfig;
use hearth_node_core::identity::NodeIdentity;
use hearth_storage::KeyValueStore;
use tracing::{debug, error, info, warn};

use crate::{NodeComponents, NodeError, StepOutcome, StopFailure, StopReport, StopStep};

/// Lifecycle state of a [`Node`]. A node that failed to build never exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum NodeState {
    Built,
    Running,
    Stopped,
}

/// A built node and the subsystems it owns.
pub struct Node {
    state: NodeState,
    config: NodeConfig,
    identity: NodeIdentity,
    bootnodes: Vec<PeerEndpoint>,
    events: Arc<EventBus>,
    store: Arc<dyn KeyValueStore>,
    chain: Arc<dyn ChainEngine>,
    tx_pool: Arc<dyn TransactionPool>,
    handler: Arc<dyn ProtocolHandler>,
    server: Arc<dyn NetworkServer>,
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("state", &self.state)
            .field("id", &self.identity.id())
            .field("bootnodes", &self.bootnodes.len())
            .finish_non_exhaustive()
    }
}

/// Subsystems acquired so far during a build, released in reverse order
/// when a later step fails.
#[derive(Default)]
struct Acquired {
    events: Option<Arc<EventBus>>,
    store: Option<Arc<dyn KeyValueStore>>,
    chain: Option<Arc<dyn ChainEngine>>,
    tx_pool: Option<Arc<dyn TransactionPool>>,
    handler: Option<Arc<dyn ProtocolHandler>>,
    server: Option<Arc<dyn NetworkServer>>,
}

impl Acquired {
    async fn release(self) {
        if let Some(server) = self.server {
            log_release("network server", server.stop().await);
        }
        if let Some(handler) = self.handler {
            log_release("protocol handler", handler.stop().await);
        }
        if let Some(tx_pool) = self.tx_pool {
            log_release("tx pool", tx_pool.stop().await);
        }
        if let Some(chain) = self.chain {
            log_release("chain engine", chain.stop().await);
        }
        if let Some(events) = self.events {
            events.stop();
        }
        if let Some(store) = self.store {
            log_release("chain store", store.close().map_err(SubsystemError::from));
        }
    }
}

fn log_release(what: &'static str, result: SubsystemResult<()>) {
    match result {
        Ok(()) => debug!(what, "Released"),
        Err(e) => warn!(what, error = %e, "Release failed"),
    }
}

impl Node {
    /// Build every subsystem in dependency order.
    ///
    /// On failure everything acquired so far is released in reverse order
    /// before the error is returned.
    pub async fn build(
        config: NodeConfig,
        components: &dyn NodeComponents,
    ) -> Result<Self, NodeError> {
        config.validate()?;

        let bootnodes = BootnodeList::load(&config.bootnodes_path)?;
        if !bootnodes.rejected().is_empty() {
            warn!(
                accepted = bootnodes.len(),
                rejected = bootnodes.rejected().len(),
                path = %config.bootnodes_path.display(),
                "Skipped malformed bootnode entries"
            );
        }
        let identity = NodeIdentity::load(config.private_key_file_path.as_deref())?;

        let endpoints = bootnodes.into_endpoints();
        let mut acquired = Acquired::default();
        match Self::assemble(config, identity, endpoints, components, &mut acquired).await {
            Ok(node) => Ok(node),
            Err(e) => {
                error!(error = %e, "Node build failed, releasing acquired subsystems");
                acquired.release().await;
                Err(e)
            }
        }
    }

    async fn assemble(
        config: NodeConfig,
        identity: NodeIdentity,
        bootnodes: Vec<PeerEndpoint>,
        components: &dyn NodeComponents,
        acquired: &mut Acquired,
    ) -> Result<Self, NodeError> {
        let events = Arc::new(EventBus::default());
        acquired.events = Some(events.clone());

        let store = components.open_store(&config.node_database_path, config.store_options())?;
        acquired.store = Some(store.clone());

        let setup = match components.setup_genesis(store.as_ref(), &config.genesis()) {
            Ok(setup) => setup,
            Err(GenesisError::Compat { setup, err }) => {
                warn!(error = %err, "Stored chain config differs, continuing with stored config");
                setup
            }
            Err(e) => return Err(NodeError::Genesis(e)),
        };
        info!(
            genesis = %setup.genesis_hash,
            chain_id = setup.config.chain_id,
            head = setup.head,
            "Initialised chain configuration"
        );

        let consensus = components.consensus();
        let chain = components
            .build_chain(
                store.clone(),
                &setup,
                consensus.clone(),
                config.execution_config(),
            )
            .map_err(NodeError::construction("chain engine"))?;
        acquired.chain = Some(chain.clone());

        let tx_pool = components
            .build_tx_pool(
                TxPoolConfig {
                    capacity: config.txpool.capacity,
                },
                chain.clone(),
                events.clone(),
            )
            .map_err(NodeError::construction("tx pool"))?;
        acquired.tx_pool = Some(tx_pool.clone());

        let handler = components
            .build_handler(ProtocolContext {
                chain_config: setup.config.clone(),
                sync_mode: config.chain.sync_mode,
                network_id: config.network.network_id,
                local_id: identity.id(),
                events: events.clone(),
                tx_pool: tx_pool.clone(),
                consensus,
                chain: chain.clone(),
                store: store.clone(),
            })
            .map_err(NodeError::construction("protocol handler"))?;
        acquired.handler = Some(handler.clone());

        let server = components
            .build_server(
                config.listen_config(),
                identity.id(),
                bootnodes.clone(),
                handler.sub_protocols(),
            )
            .map_err(NodeError::construction("network server"))?;
        acquired.server = Some(server.clone());

        info!(
            id = %identity.id(),
            bootnodes = bootnodes.len(),
            max_peers = server.max_peers(),
            "Node built"
        );

        Ok(Self {
            state: NodeState::Built,
            config,
            identity,
            bootnodes,
            events,
            store,
            chain,
            tx_pool,
            handler,
            server,
        })
    }

    /// Start the network server, then the protocol handler.
    ///
    /// On failure the node is rolled back and ends up [`NodeState::Stopped`].
    pub async fn start(&mut self) -> Result<(), NodeError> {
        if self.state != NodeState::Built {
            return Err(NodeError::InvalidState {
                op: "start",
                state: self.state,
            });
        }

        let max_peers = self.server.max_peers();
        if let Err(e) = self.server.start().await {
            error!(error = %e, "Network server failed to start");
            self.teardown().await;
            return Err(NodeError::Bind(e));
        }

        if let Err(e) = self.handler.start(max_peers).await {
            error!(error = %e, "Protocol handler failed to start");
            log_release("network server", self.server.stop().await);
            self.teardown().await;
            return Err(NodeError::HandlerStart(e));
        }

        self.state = NodeState::Running;
        info!(
            id = %self.identity.id(),
            addr = ?self.server.local_addr(),
            max_peers,
            "Node started"
        );
        Ok(())
    }

    /// Stop every subsystem in order. Calling stop on a stopped node returns
    /// an empty report.
    pub async fn stop(&mut self) -> StopReport {
        if self.state == NodeState::Stopped {
            return StopReport::default();
        }
        info!(state = %self.state, "Stopping node");
        let report = self.teardown().await;
        if report.is_clean() {
            info!("Node stopped");
        } else {
            for (step, failure) in report.failures() {
                error!(%step, %failure, "Shutdown step failed");
            }
        }
        report
    }

    async fn teardown(&mut self) -> StopReport {
        self.state = NodeState::Stopped;
        self.server.seal();

        let deadline = self.config.step_timeout();
        let mut report = StopReport::default();

        run_step(&mut report, StopStep::ChainEngine, deadline, self.chain.stop()).await;
        run_step(&mut report, StopStep::ProtocolHandler, deadline, self.handler.stop()).await;
        run_step(&mut report, StopStep::TxPool, deadline, self.tx_pool.stop()).await;
        let events = self.events.clone();
        run_step(&mut report, StopStep::EventBus, deadline, async move {
            events.stop();
            Ok(())
        })
        .await;
        let store = self.store.clone();
        run_step(&mut report, StopStep::ChainStore, deadline, async move {
            store.close().map_err(SubsystemError::from)
        })
        .await;
        run_step(&mut report, StopStep::NetworkServer, deadline, self.server.stop()).await;

        report
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn id(&self) -> NodeId {
        self.identity.id()
    }

    pub fn bootnodes(&self) -> &[PeerEndpoint] {
        &self.bootnodes
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn chain(&self) -> &Arc<dyn ChainEngine> {
        &self.chain
    }

    pub fn tx_pool(&self) -> &Arc<dyn TransactionPool> {
        &self.tx_pool
    }

    /// Listener address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.local_addr()
    }

    pub fn peer_count(&self) -> usize {
        self.handler.peer_count()
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        if self.state != NodeState::Stopped {
            warn!(state = %self.state, "Node dropped without being stopped");
        }
    }
}

async fn run_step(
    report: &mut StopReport,
    step: StopStep,
    deadline: Duration,
    fut: impl Future<Output = SubsystemResult<()>>,
) {
    let result = match tokio::time::timeout(deadline, fut).await {
        Ok(Ok(())) => {
            debug!(%step, "Stopped");
            Ok(())
        }
        Ok(Err(e)) => {
            warn!(%step, error = %e, "Stop step failed");
            Err(StopFailure::Failed(e.to_string()))
        }
        Err(_) => {
            warn!(%step, ?deadline, "Stop step timed out");
            Err(StopFailure::TimedOut(deadline))
        }
    };
    report.steps.push(StepOutcome { step, result });
}
