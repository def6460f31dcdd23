use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashSet;
use hearth_net_peer::{NodeId, PeerEndpoint};
use hearth_node_api::{
    Direction, Lifecycle, ListenConfig, NetworkServer, PeerConnection, PeerSlot,
    ProtocolDescriptor, SubsystemError, SubsystemResult,
};
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::metrics::ServerMetrics;

/// TCP server that accepts peers and dials bootnodes.
pub struct TcpServer {
    shared: Arc<Shared>,
    lifecycle: Lifecycle,
    shutdown: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

struct Shared {
    config: ListenConfig,
    local_id: NodeId,
    bootnodes: Vec<PeerEndpoint>,
    protocols: Vec<ProtocolDescriptor>,
    peers: AtomicUsize,
    /// Bootnodes with a live outbound session.
    dialed: DashSet<NodeId>,
    sealed: AtomicBool,
    local_addr: Mutex<Option<SocketAddr>>,
    metrics: ServerMetrics,
}

impl TcpServer {
    pub fn new(
        config: ListenConfig,
        local_id: NodeId,
        bootnodes: Vec<PeerEndpoint>,
        protocols: Vec<ProtocolDescriptor>,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                config,
                local_id,
                bootnodes,
                protocols,
                peers: AtomicUsize::new(0),
                dialed: DashSet::new(),
                sealed: AtomicBool::new(false),
                local_addr: Mutex::new(None),
                metrics: ServerMetrics::default(),
            }),
            lifecycle: Lifecycle::new("network server"),
            shutdown,
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.shared.sealed.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for TcpServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TcpServer")
            .field("config", &self.shared.config)
            .field("protocols", &self.shared.protocols.len())
            .field("bootnodes", &self.shared.bootnodes.len())
            .field("state", &self.lifecycle.state())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl NetworkServer for TcpServer {
    fn max_peers(&self) -> usize {
        self.shared.config.max_peers
    }

    async fn start(&self) -> SubsystemResult<()> {
        self.lifecycle.try_start()?;

        let addr = self.shared.config.listen_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| SubsystemError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| SubsystemError::Bind { addr, source })?;
        *self.shared.local_addr.lock() = Some(local_addr);

        info!(
            %local_addr,
            max_peers = self.shared.config.max_peers,
            protocols = ?self.shared.protocols.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "Network server listening"
        );

        let mut tasks = self.tasks.lock();
        tasks.push(tokio::spawn(accept_loop(
            self.shared.clone(),
            listener,
            self.shutdown.subscribe(),
        )));
        if !self.shared.config.no_dial && !self.shared.bootnodes.is_empty() {
            tasks.push(tokio::spawn(dial_loop(
                self.shared.clone(),
                self.shutdown.subscribe(),
            )));
        }
        Ok(())
    }

    fn seal(&self) {
        if !self.shared.sealed.swap(true, Ordering::SeqCst) {
            debug!("Network server sealed");
        }
    }

    async fn stop(&self) -> SubsystemResult<()> {
        if !self.lifecycle.stop_needs_teardown() {
            return Ok(());
        }

        self.seal();
        self.shutdown.send_replace(true);
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Network server task failed");
            }
        }
        self.shared.local_addr.lock().take();
        info!("Network server stopped");
        Ok(())
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        *self.shared.local_addr.lock()
    }

    fn peer_count(&self) -> usize {
        self.shared.peers.load(Ordering::SeqCst)
    }
}

impl Shared {
    fn acquire_slot(self: &Arc<Self>, dialed: Option<NodeId>) -> Option<PeerSlot> {
        let max = self.config.max_peers;
        self.peers
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < max).then_some(n + 1)
            })
            .ok()?;
        self.metrics
            .peers
            .set(self.peers.load(Ordering::SeqCst) as f64);
        if let Some(id) = dialed {
            self.dialed.insert(id);
        }

        let shared = self.clone();
        Some(PeerSlot::new(move || {
            let remaining = shared.peers.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
            shared.metrics.peers.set(remaining as f64);
            if let Some(id) = dialed {
                shared.dialed.remove(&id);
            }
        }))
    }

    /// Route a connection to the preferred sub-protocol, or drop it.
    fn hand_off(
        self: &Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        direction: Direction,
        dialed: Option<NodeId>,
    ) {
        if self.sealed.load(Ordering::SeqCst) {
            trace!(%remote_addr, "Server sealed, dropping connection");
            self.metrics.rejected_total.increment(1);
            return;
        }
        let Some(protocol) = self.protocols.first() else {
            debug!(%remote_addr, "No sub-protocols, dropping connection");
            self.metrics.rejected_total.increment(1);
            return;
        };
        let Some(slot) = self.acquire_slot(dialed) else {
            debug!(%remote_addr, max_peers = self.config.max_peers, "Too many peers");
            self.metrics.rejected_total.increment(1);
            return;
        };

        let conn = PeerConnection::new(stream, remote_addr, direction, slot);
        match protocol.dispatcher.try_send(conn) {
            Ok(()) => debug!(%remote_addr, %direction, %protocol, "Handed off connection"),
            Err(e) => {
                debug!(
                    %remote_addr,
                    %protocol,
                    error = %e,
                    "Sub-protocol not accepting connections"
                );
                self.metrics.rejected_total.increment(1);
            }
        }
    }
}

async fn accept_loop(
    shared: Arc<Shared>,
    listener: TcpListener,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, remote_addr)) => {
                    shared.metrics.accepted_total.increment(1);
                    shared.hand_off(stream, remote_addr, Direction::Inbound, None);
                }
                Err(e) => warn!(error = %e, "Accept failed"),
            },
        }
    }
    debug!("Accept loop exited");
}

async fn dial_loop(shared: Arc<Shared>, mut shutdown: watch::Receiver<bool>) {
    loop {
        for bootnode in &shared.bootnodes {
            if shared.sealed.load(Ordering::SeqCst) {
                break;
            }
            let id = *bootnode.id();
            if id == shared.local_id || shared.dialed.contains(&id) {
                continue;
            }

            shared.metrics.dials_total.increment(1);
            let addr = bootnode.tcp_addr();
            let dial = tokio::time::timeout(shared.config.dial_timeout, TcpStream::connect(addr));
            tokio::select! {
                biased;
                _ = shutdown.changed() => return,
                result = dial => match result {
                    Ok(Ok(stream)) => shared.hand_off(stream, addr, Direction::Outbound, Some(id)),
                    Ok(Err(e)) => debug!(peer = %bootnode.short_id(), %addr, error = %e, "Dial failed"),
                    Err(_) => debug!(peer = %bootnode.short_id(), %addr, "Dial timed out"),
                },
            }
        }

        tokio::select! {
            biased;
            _ = shutdown.changed() => return,
            _ = tokio::time::sleep(shared.config.redial_interval) => {}
        }
    }
}
