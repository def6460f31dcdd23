//! Block headers and transactions.

use alloy_primitives::{B256, Bytes, U256, keccak256};
use serde::{Deserialize, Serialize};

/// Block header fields the node tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub parent_hash: B256,
    pub number: u64,
    pub timestamp: u64,
    pub difficulty: U256,
    pub gas_limit: u64,
    pub extra_data: Bytes,
    pub nonce: u64,
}

impl Header {
    /// Keccak-256 over the fixed-order field encoding.
    pub fn hash(&self) -> B256 {
        let mut buf = Vec::with_capacity(32 + 8 * 4 + 32 + self.extra_data.len());
        buf.extend_from_slice(self.parent_hash.as_slice());
        buf.extend_from_slice(&self.number.to_be_bytes());
        buf.extend_from_slice(&self.timestamp.to_be_bytes());
        buf.extend_from_slice(&self.difficulty.to_be_bytes::<32>());
        buf.extend_from_slice(&self.gas_limit.to_be_bytes());
        buf.extend_from_slice(&self.extra_data);
        buf.extend_from_slice(&self.nonce.to_be_bytes());
        keccak256(buf)
    }
}

/// A pending transaction as held by the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub nonce: u64,
    pub gas_price: u64,
    pub payload: Bytes,
}

impl Transaction {
    pub fn hash(&self) -> B256 {
        let mut buf = Vec::with_capacity(16 + self.payload.len());
        buf.extend_from_slice(&self.nonce.to_be_bytes());
        buf.extend_from_slice(&self.gas_price.to_be_bytes());
        buf.extend_from_slice(&self.payload);
        keccak256(buf)
    }
}
