//! Genesis blocks and genesis setup outcomes.

use alloy_primitives::{B256, Bytes, U256, hex};
use hearth_storage::StorageError;
use serde::{Deserialize, Serialize};

use crate::{ChainConfig, ConfigCompatError, Header};

/// Genesis block specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genesis {
    pub config: ChainConfig,
    pub nonce: u64,
    pub timestamp: u64,
    pub extra_data: Bytes,
    pub gas_limit: u64,
    pub difficulty: U256,
}

impl Genesis {
    /// Mainnet genesis header parameters (account allocations are not
    /// carried).
    pub fn mainnet() -> Self {
        Self {
            config: ChainConfig::mainnet(),
            nonce: 66,
            timestamp: 0,
            extra_data: Bytes::from(hex!(
                "11bbe8db4e347b4e8c937c1c8370e4b5ed33adb3db69cbdb7a38e1e50b1b82fa"
            )),
            gas_limit: 5000,
            difficulty: U256::from(17_179_869_184u64),
        }
    }

    /// Single-node development genesis.
    pub fn dev() -> Self {
        Self {
            config: ChainConfig::dev(),
            nonce: 0,
            timestamp: 0,
            extra_data: Bytes::new(),
            gas_limit: 8_000_000,
            difficulty: U256::from(1u64),
        }
    }

    /// Header of block zero.
    pub fn to_header(&self) -> Header {
        Header {
            parent_hash: B256::ZERO,
            number: 0,
            timestamp: self.timestamp,
            difficulty: self.difficulty,
            gas_limit: self.gas_limit,
            extra_data: self.extra_data.clone(),
            nonce: self.nonce,
        }
    }

    pub fn hash(&self) -> B256 {
        self.to_header().hash()
    }
}

/// Result of reconciling a genesis spec with the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisSetup {
    /// Chain config the node will run with.
    pub config: ChainConfig,
    pub genesis_hash: B256,
    /// Head block number found in the database.
    pub head: u64,
}

/// Errors from genesis setup.
#[derive(Debug, thiserror::Error)]
pub enum GenesisError {
    /// The database holds a different genesis block.
    #[error("database contains incompatible genesis (have {stored}, new {new})")]
    Mismatch { stored: B256, new: B256 },
    /// The stored fork schedule differs in an upgradeable way. The database
    /// keeps its stored config, which `setup` carries.
    #[error("{err}")]
    Compat {
        setup: GenesisSetup,
        err: ConfigCompatError,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl GenesisError {
    /// Whether node startup must abort.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Compat { .. })
    }
}
