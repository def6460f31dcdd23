//! Figment-based configuration loading.
//!
//! Configuration priority (highest wins):
//! 1. CLI arguments
//! 2. Config file (TOML)
//! 3. Environment variables (`HEARTH_` prefix, `__` between nested keys)
//! 4. Defaults

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use hearth_chain_primitives::{ExecutionConfig, Genesis, NetworkId, SyncMode};
use hearth_node_api::ListenConfig;
use hearth_storage::{DEFAULT_CACHE_SIZE_MB, DEFAULT_MAX_FILE_HANDLES, StoreOptions};
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::logging::{LogDirectiveError, parse_vmodule};

/// Configuration errors. Any of these aborts startup before a subsystem is
/// touched.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
    #[error("bootnodes path is not set")]
    MissingBootnodesPath,
    #[error("node database path is not set")]
    MissingDatabasePath,
    #[error("verbosity {0} out of range 0..=5")]
    InvalidVerbosity(u8),
    #[error("invalid vmodule: {0}")]
    InvalidVmodule(#[from] LogDirectiveError),
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Built-in genesis specifications.
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
pub enum GenesisPreset {
    #[default]
    Mainnet,
    Dev,
}

impl GenesisPreset {
    pub fn genesis(self) -> Genesis {
        match self {
            Self::Mainnet => Genesis::mainnet(),
            Self::Dev => Genesis::dev(),
        }
    }
}

/// Network server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub listen_addr: IpAddr,
    pub port: u16,
    pub max_peers: usize,
    pub network_id: NetworkId,
    pub no_dial: bool,
    pub dial_timeout_secs: u64,
    pub redial_interval_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_addr: IpAddr::from(DEFAULT_LISTEN_ADDR),
            port: DEFAULT_P2P_PORT,
            max_peers: DEFAULT_MAX_PEERS,
            network_id: DEFAULT_NETWORK_ID,
            no_dial: false,
            dial_timeout_secs: DEFAULT_DIAL_TIMEOUT_SECS,
            redial_interval_secs: DEFAULT_REDIAL_INTERVAL_SECS,
        }
    }
}

/// Chain store tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub cache_mb: u64,
    pub handles: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            cache_mb: DEFAULT_CACHE_SIZE_MB,
            handles: DEFAULT_MAX_FILE_HANDLES,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainSection {
    pub genesis: GenesisPreset,
    pub sync_mode: SyncMode,
    pub enable_preimage_recording: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxPoolSection {
    pub capacity: usize,
}

impl Default for TxPoolSection {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_TX_POOL_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShutdownSection {
    pub step_timeout_secs: u64,
}

impl Default for ShutdownSection {
    fn default() -> Self {
        Self {
            step_timeout_secs: DEFAULT_STEP_TIMEOUT_SECS,
        }
    }
}

/// Complete node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// File listing bootnode enode URLs. Required.
    pub bootnodes_path: PathBuf,
    /// Chain database directory. Required.
    pub node_database_path: PathBuf,
    /// Hex-encoded node key. A fresh key is generated when unset.
    pub private_key_file_path: Option<PathBuf>,
    pub verbosity: u8,
    pub vmodule: String,
    pub log_json: bool,
    pub network: NetworkConfig,
    pub database: DatabaseConfig,
    pub chain: ChainSection,
    pub txpool: TxPoolSection,
    pub shutdown: ShutdownSection,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bootnodes_path: PathBuf::new(),
            node_database_path: PathBuf::new(),
            private_key_file_path: None,
            verbosity: DEFAULT_VERBOSITY,
            vmodule: String::new(),
            log_json: false,
            network: NetworkConfig::default(),
            database: DatabaseConfig::default(),
            chain: ChainSection::default(),
            txpool: TxPoolSection::default(),
            shutdown: ShutdownSection::default(),
        }
    }
}

impl NodeConfig {
    /// Load configuration from defaults, environment, an optional config file
    /// and `overrides` (normally the parsed CLI arguments).
    pub fn load(
        config_path: Option<&Path>,
        overrides: &impl Serialize,
    ) -> Result<Self, ConfigError> {
        Self::figment(config_path, overrides)
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    fn figment(config_path: Option<&Path>, overrides: &impl Serialize) -> Figment {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(NodeConfig::default()))
            .merge(Env::prefixed(ENV_PREFIX).split(ENV_SEPARATOR));

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Serialized::defaults(overrides))
    }

    /// Check required fields and ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bootnodes_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingBootnodesPath);
        }
        if self.node_database_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingDatabasePath);
        }
        if self.verbosity > MAX_VERBOSITY {
            return Err(ConfigError::InvalidVerbosity(self.verbosity));
        }
        parse_vmodule(&self.vmodule)?;
        if self.txpool.capacity == 0 {
            return Err(ConfigError::Zero("txpool.capacity"));
        }
        if self.shutdown.step_timeout_secs == 0 {
            return Err(ConfigError::Zero("shutdown.step_timeout_secs"));
        }
        Ok(())
    }

    pub fn listen_config(&self) -> ListenConfig {
        ListenConfig {
            listen_addr: SocketAddr::new(self.network.listen_addr, self.network.port),
            max_peers: self.network.max_peers,
            no_dial: self.network.no_dial,
            dial_timeout: Duration::from_secs(self.network.dial_timeout_secs),
            redial_interval: Duration::from_secs(self.network.redial_interval_secs),
        }
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            cache_size_mb: self.database.cache_mb,
            max_file_handles: self.database.handles,
        }
    }

    pub fn genesis(&self) -> Genesis {
        self.chain.genesis.genesis()
    }

    pub fn execution_config(&self) -> ExecutionConfig {
        ExecutionConfig {
            enable_preimage_recording: self.chain.enable_preimage_recording,
        }
    }

    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown.step_timeout_secs)
    }
}
