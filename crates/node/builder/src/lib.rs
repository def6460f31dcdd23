//! Node orchestrator.
//!
//! A [`Node`] is obtained from [`Node::build`], which wires the subsystems in
//! dependency order:
//!
//! ```text
//! config ─► bootnodes ─► chain store ─► genesis ─► chain engine ─► tx pool
//!                                                        │            │
//!                                                        ▼            ▼
//!                                  network server ◄── protocol handler
//! ```
//!
//! and then moves through `Built -> Running -> Stopped`:
//!
//! ```ignore
//! let mut node = Node::build(config, &DefaultComponents).await?;
//! node.start().await?;
//! tokio::signal::ctrl_c().await?;
//! let report = node.stop().await;
//! ```

mod components;
mod error;
mod node;
mod report;

pub use components::{DefaultComponents, NodeComponents};
pub use error::NodeError;
pub use node::{Node, NodeState};
pub use report::{StepOutcome, StopFailure, StopReport, StopStep};
