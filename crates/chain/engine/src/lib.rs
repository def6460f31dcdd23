//! Chain engine for the hearth node.
//!
//! - [`setup_genesis`] reconciles the requested genesis with the database
//! - [`Blockchain`] stores headers and tracks the canonical head
//! - [`TxPool`] holds pending transactions in memory
//! - [`FakeConsensus`] accepts every header, for development networks

mod blockchain;
mod consensus;
mod genesis;
mod schema;
mod txpool;

pub use blockchain::Blockchain;
pub use consensus::FakeConsensus;
pub use genesis::setup_genesis;
pub use txpool::{DEFAULT_TX_POOL_CAPACITY, TxPool, TxPoolConfig};
