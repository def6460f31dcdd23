//! Node-wide event bus.

use std::net::SocketAddr;

use alloy_primitives::B256;
use hearth_net_peer::NodeId;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Default buffer of the event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Events published by node subsystems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEvent {
    PeerConnected { id: NodeId, addr: SocketAddr },
    PeerDisconnected { id: NodeId },
    TxAdded { hash: B256 },
    ChainHead { number: u64, hash: B256 },
}

/// Broadcast channel for [`NodeEvent`]s.
///
/// One bus is created per node and passed explicitly to every subsystem
/// that publishes or listens. After [`stop`](Self::stop) publishing is a
/// no-op and subscribers observe the channel as closed.
#[derive(Debug)]
pub struct EventBus {
    sender: RwLock<Option<broadcast::Sender<NodeEvent>>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: RwLock::new(Some(sender)),
        }
    }

    /// Subscribe to future events, or `None` once the bus is stopped.
    pub fn subscribe(&self) -> Option<broadcast::Receiver<NodeEvent>> {
        self.sender.read().as_ref().map(broadcast::Sender::subscribe)
    }

    /// Publish an event. Returns the number of subscribers that received it.
    pub fn publish(&self, event: NodeEvent) -> usize {
        match self.sender.read().as_ref() {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => {
                trace!(?event, "event bus stopped, dropping event");
                0
            }
        }
    }

    /// Close the bus. Idempotent.
    pub fn stop(&self) {
        if self.sender.write().take().is_some() {
            debug!("event bus stopped");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.sender.read().is_none()
    }
}
