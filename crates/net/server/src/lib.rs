//! Plain TCP network server.
//!
//! The server accepts inbound connections, dials the configured bootnodes,
//! and hands every established connection to the preferred sub-protocol
//! together with a [`PeerSlot`](hearth_node_api::PeerSlot) that counts
//! against `max_peers` until the session drops it.

mod metrics;
mod server;

pub use server::TcpServer;
