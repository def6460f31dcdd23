use hearth_chain_primitives::Header;
use hearth_node_api::{ConsensusEngine, ConsensusError};

/// Consensus engine that accepts every well-linked header.
///
/// `failing_at` makes the engine reject the header with that number, which
/// exercises import failure paths.
#[derive(Debug, Clone, Default)]
pub struct FakeConsensus {
    fail_at: Option<u64>,
}

impl FakeConsensus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(number: u64) -> Self {
        Self {
            fail_at: Some(number),
        }
    }
}

impl ConsensusEngine for FakeConsensus {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn verify_header(&self, header: &Header, parent: &Header) -> Result<(), ConsensusError> {
        if Some(header.number) == self.fail_at {
            return Err(ConsensusError::Rejected {
                engine: self.name(),
                number: header.number,
            });
        }
        if parent.number.checked_add(1) != Some(header.number) {
            return Err(ConsensusError::InvalidNumber {
                number: header.number,
            });
        }
        if header.timestamp < parent.timestamp {
            return Err(ConsensusError::InvalidTimestamp {
                number: header.number,
            });
        }
        Ok(())
    }
}
