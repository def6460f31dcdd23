//! Logging CLI arguments.

use clap::Args;
use serde::Serialize;

use crate::constants::MAX_VERBOSITY;

/// Logging configuration.
#[derive(Debug, Args, Clone, Default, Serialize)]
#[command(next_help_heading = "Logging")]
pub struct LogArgs {
    /// Logging verbosity: 0=silent, 1=error, 2=warn, 3=info, 4=debug, 5=trace.
    #[arg(
        long,
        value_name = "LEVEL",
        value_parser = clap::value_parser!(u8).range(0..=i64::from(MAX_VERBOSITY))
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<u8>,

    /// Per-module verbosity (e.g. "hearth_net_eth=5,hearth_chain=4").
    #[arg(long, value_name = "PATTERN")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vmodule: Option<String>,

    /// Use JSON format for log output.
    #[arg(long = "log.json")]
    #[serde(rename = "log_json", skip_serializing_if = "std::ops::Not::not")]
    pub json: bool,
}
