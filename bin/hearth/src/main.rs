//! hearth node binary.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use eyre::Result;
use hearth_node_builder::{DefaultComponents, Node};
use hearth_node_core::config::NodeConfig;
use hearth_node_core::logging::init_logging;
use hearth_node_core::version::{CLIENT_VERSION, GIT_SHA};
use tracing::{error, info, warn};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let config = match NodeConfig::load(cli.config.as_deref(), &cli.node)
        .and_then(|config| config.validate().map(|()| config))
    {
        Ok(config) => config,
        Err(e) => {
            // Logging is not set up yet.
            eprintln!("Fatal: {e}");
            return Ok(ExitCode::FAILURE);
        }
    };
    init_logging(&config)?;
    info!(version = CLIENT_VERSION, commit = GIT_SHA, "Starting node");

    let mut node = match Node::build(config, &DefaultComponents).await {
        Ok(node) => node,
        Err(e) if e.is_misconfiguration() => {
            error!(error = %e, "Fatal configuration error");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };
    node.start().await?;

    tokio::signal::ctrl_c().await?;
    info!("Received interrupt, shutting down");

    let report = node.stop().await;
    if !report.is_clean() {
        warn!(failed = report.failures().count(), "Shutdown finished with errors");
    }
    Ok(ExitCode::SUCCESS)
}
