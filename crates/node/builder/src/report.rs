use std::time::Duration;

/// Ordered shutdown steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum StopStep {
    ChainEngine,
    ProtocolHandler,
    TxPool,
    EventBus,
    ChainStore,
    NetworkServer,
}

impl StopStep {
    /// Every step, in execution order.
    pub const ORDER: [StopStep; 6] = [
        Self::ChainEngine,
        Self::ProtocolHandler,
        Self::TxPool,
        Self::EventBus,
        Self::ChainStore,
        Self::NetworkServer,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StopFailure {
    #[error("{0}")]
    Failed(String),
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: StopStep,
    pub result: Result<(), StopFailure>,
}

/// What happened during [`Node::stop`](crate::Node::stop).
///
/// Empty when the node was already stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopReport {
    pub steps: Vec<StepOutcome>,
}

impl StopReport {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether every step completed without error.
    pub fn is_clean(&self) -> bool {
        self.steps.iter().all(|s| s.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (StopStep, &StopFailure)> {
        self.steps
            .iter()
            .filter_map(|s| s.result.as_ref().err().map(|e| (s.step, e)))
    }

    /// Steps in the order they ran.
    pub fn order(&self) -> Vec<StopStep> {
        self.steps.iter().map(|s| s.step).collect()
    }
}
