//! Default values for node configuration.

// =============================================================================
// Network
// =============================================================================

/// Default TCP port for peer connections.
pub const DEFAULT_P2P_PORT: u16 = 30303;

/// Default listen address (all interfaces).
pub const DEFAULT_LISTEN_ADDR: [u8; 4] = [0, 0, 0, 0];

/// Default maximum number of peers.
pub const DEFAULT_MAX_PEERS: usize = 25;

/// Default network identifier (mainnet).
pub const DEFAULT_NETWORK_ID: u64 = 1;

/// Default timeout for a single bootnode dial.
pub const DEFAULT_DIAL_TIMEOUT_SECS: u64 = 15;

/// Default delay between bootnode dial rounds.
pub const DEFAULT_REDIAL_INTERVAL_SECS: u64 = 30;

// =============================================================================
// Logging
// =============================================================================

/// Highest verbosity level (trace).
pub const MAX_VERBOSITY: u8 = 5;

/// Default verbosity level (info).
pub const DEFAULT_VERBOSITY: u8 = 3;

// =============================================================================
// Lifecycle
// =============================================================================

/// Default deadline for each shutdown step.
pub const DEFAULT_STEP_TIMEOUT_SECS: u64 = 10;

/// Default number of pending transactions held in memory.
pub const DEFAULT_TX_POOL_CAPACITY: usize = 4096;

// =============================================================================
// Configuration
// =============================================================================

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "HEARTH_";

/// Separator between nested keys in environment variable names,
/// e.g. `HEARTH_NETWORK__MAX_PEERS`.
pub const ENV_SEPARATOR: &str = "__";
