//! `eth` wire protocol handler.
//!
//! The handler exposes the `eth/63` and `eth/62` sub-protocols to the network
//! server. Each connection the server hands over runs a status exchange:
//!
//! ```text
//! local                               remote
//!   │──── Status{version, network, ─────►│
//!   │       head, genesis, node id}      │
//!   │◄─────────────── Status ────────────│
//!   │  network or genesis differ: drop   │
//! ```
//!
//! After the exchange the session is registered in the peer set until the
//! remote side disconnects or the handler stops.

mod error;
mod handler;
pub mod wire;

pub use error::ProtocolError;
pub use handler::{EthHandler, PeerInfo};

/// Sub-protocol name.
pub const PROTOCOL_NAME: &str = "eth";

/// `eth/63`: adds state sync messages.
pub const ETH63: u32 = 63;

/// `eth/62`: headers and bodies.
pub const ETH62: u32 = 62;

/// Supported versions with their message-code counts, preferred first.
pub const PROTOCOL_VERSIONS: [(u32, u64); 2] = [(ETH63, 17), (ETH62, 8)];
