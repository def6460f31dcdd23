use hearth_chain_primitives::GenesisError;
use hearth_net_peer::BootnodeSourceError;
use hearth_node_api::SubsystemError;
use hearth_node_core::config::ConfigError;
use hearth_node_core::identity::IdentityError;
use hearth_storage::StorageError;

use crate::NodeState;

/// Errors from building or starting a node.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigError),
    #[error("bootnode source: {0}")]
    SourceOpen(#[from] BootnodeSourceError),
    #[error("node key: {0}")]
    Identity(#[from] IdentityError),
    #[error("chain store: {0}")]
    Storage(#[from] StorageError),
    #[error("genesis: {0}")]
    Genesis(#[source] GenesisError),
    #[error("network server failed to start: {0}")]
    Bind(#[source] SubsystemError),
    #[error("protocol handler failed to start: {0}")]
    HandlerStart(#[source] SubsystemError),
    #[error("failed to construct {component}: {source}")]
    Construction {
        component: &'static str,
        #[source]
        source: SubsystemError,
    },
    #[error("cannot {op} a node in state {state}")]
    InvalidState { op: &'static str, state: NodeState },
}

impl NodeError {
    /// Whether the error stems from operator input (configuration or the
    /// bootnode source) rather than a runtime failure.
    pub fn is_misconfiguration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::SourceOpen(_))
    }

    pub(crate) fn construction(component: &'static str) -> impl FnOnce(SubsystemError) -> Self {
        move |source| Self::Construction { component, source }
    }
}
