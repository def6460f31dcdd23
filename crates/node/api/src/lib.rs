//! Contracts between the node orchestrator and the subsystems it drives.
//!
//! ```text
//! chain store ──► ChainEngine ──► TransactionPool
//!                      │                │
//!                      ▼                ▼
//!                 ProtocolHandler ◄── EventBus
//!                      │ sub_protocols()
//!                      ▼
//!                 NetworkServer
//! ```
//!
//! Every long-lived subsystem embeds a [`Lifecycle`] so that start and stop
//! happen exactly once, and stop on a never-started subsystem is a no-op.

mod context;
mod error;
mod events;
mod lifecycle;
mod protocol;
mod traits;

pub use context::ProtocolContext;
pub use error::{ChainError, ConsensusError, PoolError, SubsystemError, SubsystemResult};
pub use events::{DEFAULT_EVENT_CAPACITY, EventBus, NodeEvent};
pub use lifecycle::{Lifecycle, SubsystemState};
pub use protocol::{Direction, ListenConfig, PeerConnection, PeerSlot, ProtocolDescriptor};
pub use traits::{ChainEngine, ConsensusEngine, NetworkServer, ProtocolHandler, TransactionPool};

pub use async_trait::async_trait;
