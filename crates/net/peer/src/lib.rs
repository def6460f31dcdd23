//! Peer endpoints and bootnode list loading.
//!
//! - [`PeerEndpoint`] - identity plus network address, parsed from enode URLs
//! - [`BootnodeList`] - validated seed peers loaded from a text source

mod bootnodes;
mod endpoint;
mod error;

pub use bootnodes::{BootnodeList, MalformedEntry};
pub use endpoint::{ENODE_SCHEME, NodeId, PeerEndpoint, node_id_from_key};
pub use error::{BootnodeSourceError, PeerParseError};
