use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use hearth_chain_primitives::SyncMode;
use hearth_net_peer::NodeId;
use hearth_node_api::{
    Direction, Lifecycle, NodeEvent, PeerConnection, ProtocolContext, ProtocolDescriptor,
    ProtocolHandler, SubsystemError, SubsystemResult,
};
use metrics::Counter;
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, trace, warn};

use crate::wire::{self, STATUS_CODE, Status};
use crate::{ETH62, ETH63, PROTOCOL_NAME, PROTOCOL_VERSIONS, ProtocolError};

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connections queued between the server and the dispatch loop.
const DISPATCH_BUFFER: usize = 64;

/// A registered peer session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    pub addr: SocketAddr,
    pub direction: Direction,
    pub version: u32,
}

struct HandlerMetrics {
    handshakes_total: Counter,
    handshake_failures_total: Counter,
}

impl Default for HandlerMetrics {
    fn default() -> Self {
        Self {
            handshakes_total: metrics::counter!("eth.handshakes_total"),
            handshake_failures_total: metrics::counter!("eth.handshake_failures_total"),
        }
    }
}

struct Inner {
    ctx: ProtocolContext,
    sync_mode: SyncMode,
    peers: DashMap<NodeId, PeerInfo>,
    max_peers: AtomicUsize,
    metrics: HandlerMetrics,
}

/// Protocol handler serving `eth/63` and `eth/62`.
pub struct EthHandler {
    inner: Arc<Inner>,
    lifecycle: Lifecycle,
    dispatcher: mpsc::Sender<PeerConnection>,
    incoming: Mutex<Option<mpsc::Receiver<PeerConnection>>>,
    shutdown: watch::Sender<bool>,
    dispatch: Mutex<Option<JoinHandle<()>>>,
}

impl EthHandler {
    pub fn new(ctx: ProtocolContext) -> Self {
        // Fast sync only makes sense on an empty chain.
        let sync_mode = match (ctx.sync_mode, ctx.chain.head()) {
            (SyncMode::Fast, Ok(head)) if head.number > 0 => {
                warn!(head = head.number, "Blockchain not empty, fast sync disabled");
                SyncMode::Full
            }
            (mode, _) => mode,
        };
        info!(
            network_id = ctx.network_id,
            %sync_mode,
            chain_id = ctx.chain_config.chain_id,
            consensus = ctx.consensus.name(),
            "Initialising eth protocol"
        );

        let (dispatcher, incoming) = mpsc::channel(DISPATCH_BUFFER);
        let (shutdown, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                ctx,
                sync_mode,
                peers: DashMap::new(),
                max_peers: AtomicUsize::new(0),
                metrics: HandlerMetrics::default(),
            }),
            lifecycle: Lifecycle::new("protocol handler"),
            dispatcher,
            incoming: Mutex::new(Some(incoming)),
            shutdown,
            dispatch: Mutex::new(None),
        }
    }

    /// Sync mode in effect after checking the local chain.
    pub fn sync_mode(&self) -> SyncMode {
        self.inner.sync_mode
    }

    pub fn peer(&self, id: &NodeId) -> Option<PeerInfo> {
        self.inner.peers.get(id).map(|p| p.value().clone())
    }
}

impl fmt::Debug for EthHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EthHandler")
            .field("network_id", &self.inner.ctx.network_id)
            .field("sync_mode", &self.inner.sync_mode)
            .field("peers", &self.inner.peers.len())
            .field("state", &self.lifecycle.state())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ProtocolHandler for EthHandler {
    fn sub_protocols(&self) -> Vec<ProtocolDescriptor> {
        PROTOCOL_VERSIONS
            .iter()
            .map(|&(version, length)| ProtocolDescriptor {
                name: PROTOCOL_NAME,
                version,
                length,
                dispatcher: self.dispatcher.clone(),
            })
            .collect()
    }

    async fn start(&self, max_peers: usize) -> SubsystemResult<()> {
        self.lifecycle.try_start()?;
        let incoming = self
            .incoming
            .lock()
            .take()
            .ok_or_else(|| SubsystemError::Other("dispatch channel already taken".into()))?;

        self.inner.max_peers.store(max_peers, Ordering::SeqCst);
        let task = tokio::spawn(dispatch_loop(
            self.inner.clone(),
            incoming,
            self.shutdown.subscribe(),
        ));
        *self.dispatch.lock() = Some(task);

        info!(max_peers, "eth protocol started");
        Ok(())
    }

    async fn stop(&self) -> SubsystemResult<()> {
        if !self.lifecycle.stop_needs_teardown() {
            return Ok(());
        }

        self.shutdown.send_replace(true);
        let task = self.dispatch.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "eth dispatch loop failed");
            }
        }
        info!("eth protocol stopped");
        Ok(())
    }

    fn peer_count(&self) -> usize {
        self.inner.peers.len()
    }
}

async fn dispatch_loop(
    inner: Arc<Inner>,
    mut incoming: mpsc::Receiver<PeerConnection>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut sessions = JoinSet::new();
    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            Some(done) = sessions.join_next(), if !sessions.is_empty() => {
                if let Err(e) = done {
                    warn!(error = %e, "Peer session panicked");
                }
            }
            conn = incoming.recv() => match conn {
                Some(conn) => {
                    sessions.spawn(run_session(inner.clone(), conn));
                }
                None => break,
            },
        }
    }

    // Aborting drops each session, which deregisters its peer.
    sessions.shutdown().await;
    debug!("eth dispatch loop exited");
}

/// Removes the peer from the set when the session ends, however it ends.
struct SessionGuard {
    inner: Arc<Inner>,
    id: NodeId,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.inner.peers.remove(&self.id).is_some() {
            self.inner
                .ctx
                .events
                .publish(NodeEvent::PeerDisconnected { id: self.id });
        }
    }
}

async fn run_session(inner: Arc<Inner>, conn: PeerConnection) {
    let PeerConnection {
        mut stream,
        remote_addr,
        direction,
        slot,
    } = conn;

    let session = async {
        let status = tokio::time::timeout(HANDSHAKE_TIMEOUT, inner.handshake(&mut stream))
            .await
            .map_err(|_| ProtocolError::HandshakeTimeout)??;
        let version = status.protocol_version.min(ETH63);
        let info = PeerInfo {
            addr: remote_addr,
            direction,
            version,
        };
        let _guard = inner.register(status.node_id, info)?;

        debug!(
            peer = %short(&status.node_id),
            %remote_addr,
            %direction,
            version,
            pending_txs = inner.ctx.tx_pool.pending_count(),
            "Peer connected"
        );
        inner.read_messages(&mut stream).await
    };

    if let Err(e) = session.await {
        debug!(%remote_addr, error = %e, "Peer session ended");
    }
    drop(slot);
}

impl Inner {
    fn local_status(&self) -> Result<Status, ProtocolError> {
        Ok(Status {
            protocol_version: ETH63,
            network_id: self.ctx.network_id,
            head_hash: self.ctx.chain.head()?.hash(),
            genesis_hash: self.ctx.chain.genesis_hash(),
            node_id: self.ctx.local_id,
        })
    }

    async fn handshake(&self, stream: &mut TcpStream) -> Result<Status, ProtocolError> {
        let ours = self.local_status()?;
        wire::write_status(stream, &ours).await?;
        let theirs = match wire::read_status(stream).await {
            Ok(status) => status,
            Err(e) => {
                self.metrics.handshake_failures_total.increment(1);
                return Err(e);
            }
        };

        let verdict = if !(ETH62..=ETH63).contains(&theirs.protocol_version) {
            Err(ProtocolError::UnsupportedVersion(theirs.protocol_version))
        } else if theirs.network_id != ours.network_id {
            Err(ProtocolError::NetworkMismatch {
                ours: ours.network_id,
                theirs: theirs.network_id,
            })
        } else if theirs.genesis_hash != ours.genesis_hash {
            Err(ProtocolError::GenesisMismatch {
                ours: ours.genesis_hash,
                theirs: theirs.genesis_hash,
            })
        } else {
            Ok(theirs)
        };

        match &verdict {
            Ok(_) => self.metrics.handshakes_total.increment(1),
            Err(_) => self.metrics.handshake_failures_total.increment(1),
        }
        verdict
    }

    fn register(
        self: &Arc<Self>,
        id: NodeId,
        info: PeerInfo,
    ) -> Result<SessionGuard, ProtocolError> {
        if self.peers.len() >= self.max_peers.load(Ordering::SeqCst) {
            return Err(ProtocolError::TooManyPeers);
        }
        match self.peers.entry(id) {
            Entry::Occupied(_) => return Err(ProtocolError::AlreadyConnected(id)),
            Entry::Vacant(entry) => {
                entry.insert(info.clone());
            }
        }
        self.ctx.events.publish(NodeEvent::PeerConnected {
            id,
            addr: info.addr,
        });
        Ok(SessionGuard {
            inner: self.clone(),
            id,
        })
    }

    /// Drain messages until the peer disconnects.
    async fn read_messages(&self, stream: &mut TcpStream) -> Result<(), ProtocolError> {
        loop {
            match wire::read_message(stream).await {
                Ok((STATUS_CODE, _)) => {
                    return Err(ProtocolError::UnexpectedMessage(STATUS_CODE));
                }
                Ok((code, payload)) => trace!(code, len = payload.len(), "Ignoring message"),
                Err(ProtocolError::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn short(id: &NodeId) -> String {
    id.to_string().chars().take(18).collect()
}
