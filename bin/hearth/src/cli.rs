//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;
use hearth_node_core::args::NodeArgs;

/// hearth - a minimal Ethereum execution node
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// TOML configuration file. Flags override its values.
    #[arg(long, value_name = "FILE", env = "HEARTH_CONFIG")]
    pub(crate) config: Option<PathBuf>,

    #[command(flatten)]
    pub(crate) node: NodeArgs,
}
