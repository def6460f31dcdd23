use clap::Args;
use hearth_chain_primitives::SyncMode;
use serde::Serialize;

use crate::config::GenesisPreset;

/// Chain selection and execution.
#[derive(Debug, Args, Clone, Default, Serialize)]
#[command(next_help_heading = "Chain")]
pub struct ChainArgs {
    /// Genesis to start from (mainnet, dev).
    #[arg(long, value_name = "PRESET")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genesis: Option<GenesisPreset>,

    /// Synchronisation mode (full, fast, light).
    #[arg(long = "syncmode", value_name = "MODE")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_mode: Option<SyncMode>,

    /// Record SHA3 preimages during execution.
    #[arg(long = "vm.preimages")]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub enable_preimage_recording: bool,
}

#[derive(Debug, Args, Clone, Default, Serialize)]
#[command(next_help_heading = "Transaction pool")]
pub struct TxPoolArgs {
    /// Maximum number of pending transactions.
    #[arg(long = "txpool.capacity", value_name = "N")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<usize>,
}

#[derive(Debug, Args, Clone, Default, Serialize)]
#[command(next_help_heading = "Shutdown")]
pub struct ShutdownArgs {
    /// Deadline in seconds for each shutdown step.
    #[arg(long = "shutdown.timeout", value_name = "SECS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_timeout_secs: Option<u64>,
}
