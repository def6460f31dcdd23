//! Sub-protocol descriptors and the connections the server hands to them.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::mpsc;

/// Which side initiated a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// A peer slot held for the lifetime of a session. Dropping it releases the
/// slot back to the server.
pub struct PeerSlot {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl PeerSlot {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A slot not accounted against any server.
    pub fn detached() -> Self {
        Self { release: None }
    }
}

impl Drop for PeerSlot {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for PeerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerSlot")
            .field("attached", &self.release.is_some())
            .finish()
    }
}

/// An established transport connection handed to a sub-protocol.
#[derive(Debug)]
pub struct PeerConnection {
    pub stream: TcpStream,
    pub remote_addr: SocketAddr,
    pub direction: Direction,
    pub slot: PeerSlot,
}

impl PeerConnection {
    pub fn new(
        stream: TcpStream,
        remote_addr: SocketAddr,
        direction: Direction,
        slot: PeerSlot,
    ) -> Self {
        Self {
            stream,
            remote_addr,
            direction,
            slot,
        }
    }
}

/// A sub-protocol the network server can route connections to.
#[derive(Debug, Clone)]
pub struct ProtocolDescriptor {
    pub name: &'static str,
    pub version: u32,
    /// Number of message codes the protocol uses.
    pub length: u64,
    pub dispatcher: mpsc::Sender<PeerConnection>,
}

impl fmt::Display for ProtocolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

/// Listener and dialer settings of a network server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenConfig {
    pub listen_addr: SocketAddr,
    pub max_peers: usize,
    /// Do not dial bootnodes; accept inbound connections only.
    pub no_dial: bool,
    pub dial_timeout: Duration,
    pub redial_interval: Duration,
}
