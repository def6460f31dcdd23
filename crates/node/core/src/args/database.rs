//! Database CLI arguments.

use clap::Args;
use serde::Serialize;

/// Database configuration.
#[derive(Debug, Args, Clone, Default, Serialize)]
#[command(next_help_heading = "Database")]
pub struct DatabaseArgs {
    /// Database cache size in megabytes.
    #[arg(long = "db.cache", value_name = "MB")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_mb: Option<u64>,

    /// Open file handle allowance of the database (advisory, unused by redb).
    #[arg(long = "db.handles", value_name = "N")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handles: Option<u32>,
}
