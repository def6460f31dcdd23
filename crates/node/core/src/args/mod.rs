//! CLI argument structs for node configuration.
//!
//! These args serve dual purposes:
//! - CLI parsing via clap (`#[derive(Args)]`)
//! - Configuration overrides via serde (`#[derive(Serialize)]`)
//!
//! Unset flags are skipped when serialised, so [`NodeArgs`] can be merged as
//! the top layer of a [`NodeConfig`](crate::config::NodeConfig) figment
//! without masking values from the environment or the config file.

mod chain;
mod database;
mod log;
mod network;

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

pub use chain::{ChainArgs, ShutdownArgs, TxPoolArgs};
pub use database::DatabaseArgs;
pub use log::LogArgs;
pub use network::NetworkArgs;

/// All node configuration flags.
#[derive(Debug, Args, Clone, Default, Serialize)]
pub struct NodeArgs {
    /// File listing bootnode enode URLs, one per line.
    #[arg(long = "bootnodes", value_name = "FILE")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootnodes_path: Option<PathBuf>,

    /// Directory holding the chain database.
    #[arg(long = "datadir", value_name = "PATH")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_database_path: Option<PathBuf>,

    /// File holding the hex-encoded secp256k1 node key.
    #[arg(long = "nodekey", value_name = "FILE")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key_file_path: Option<PathBuf>,

    #[command(flatten)]
    #[serde(flatten)]
    pub log: LogArgs,

    #[command(flatten)]
    pub network: NetworkArgs,

    #[command(flatten)]
    pub database: DatabaseArgs,

    #[command(flatten)]
    pub chain: ChainArgs,

    #[command(flatten)]
    pub txpool: TxPoolArgs,

    #[command(flatten)]
    pub shutdown: ShutdownArgs,
}
