//! Chain primitives shared by the chain engine, the protocol handler and the
//! node orchestrator.

mod config;
mod genesis;
mod header;

pub use config::{ChainConfig, ConfigCompatError};
pub use genesis::{Genesis, GenesisError, GenesisSetup};
pub use header::{Header, Transaction};

use serde::{Deserialize, Serialize};

/// Network identifier advertised to peers.
pub type NetworkId = u64;

/// How the node intends to synchronise the chain.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SyncMode {
    /// Download and execute every block.
    Full,
    /// Download state at a recent pivot, then execute.
    #[default]
    Fast,
    /// Headers only.
    Light,
}

/// Settings for block execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Record SHA3 preimages of keys during execution.
    pub enable_preimage_recording: bool,
}
