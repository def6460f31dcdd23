use std::net::IpAddr;

use clap::Args;
use serde::Serialize;

/// Parameters for configuring the network
#[derive(Debug, Clone, Default, Args, Serialize)]
#[command(next_help_heading = "Networking")]
pub struct NetworkArgs {
    /// Address to listen on for peer connections.
    #[arg(long = "addr", value_name = "IP")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listen_addr: Option<IpAddr>,

    /// TCP port to listen on.
    #[arg(long, value_name = "PORT")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Maximum number of connected peers.
    #[arg(long = "maxpeers", value_name = "N")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_peers: Option<usize>,

    /// Network identifier exchanged with peers.
    #[arg(long = "networkid", value_name = "ID")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_id: Option<u64>,

    /// Do not dial bootnodes.
    #[arg(long = "nodial")]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub no_dial: bool,
}
