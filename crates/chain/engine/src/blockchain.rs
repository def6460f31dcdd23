use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use alloy_primitives::B256;
use async_trait::async_trait;
use hearth_chain_primitives::{ChainConfig, ExecutionConfig, Header};
use hearth_node_api::{ChainEngine, ChainError, ConsensusEngine, SubsystemResult};
use hearth_storage::KeyValueStore;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::schema;

/// Header chain backed by a [`KeyValueStore`].
pub struct Blockchain {
    store: Arc<dyn KeyValueStore>,
    config: ChainConfig,
    genesis_hash: B256,
    consensus: Arc<dyn ConsensusEngine>,
    execution: ExecutionConfig,
    head: RwLock<Header>,
    stopped: AtomicBool,
}

impl std::fmt::Debug for Blockchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blockchain")
            .field("chain_id", &self.config.chain_id)
            .field("genesis_hash", &self.genesis_hash)
            .field("consensus", &self.consensus.name())
            .field("execution", &self.execution)
            .field("stopped", &self.stopped.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl Blockchain {
    /// Load the chain from `store`. The database must already hold the
    /// genesis block (see [`setup_genesis`](crate::setup_genesis)).
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        config: ChainConfig,
        genesis_hash: B256,
        consensus: Arc<dyn ConsensusEngine>,
        execution: ExecutionConfig,
    ) -> Result<Self, ChainError> {
        let head_hash = schema::read_head_hash(store.as_ref())?.unwrap_or(genesis_hash);
        let head = schema::read_header(store.as_ref(), head_hash)?
            .ok_or(ChainError::MissingHeader(head_hash))?;

        info!(
            number = head.number,
            hash = %head_hash,
            consensus = consensus.name(),
            preimages = execution.enable_preimage_recording,
            "Loaded chain head"
        );

        Ok(Self {
            store,
            config,
            genesis_hash,
            consensus,
            execution,
            head: RwLock::new(head),
            stopped: AtomicBool::new(false),
        })
    }

    pub fn execution_config(&self) -> ExecutionConfig {
        self.execution
    }

    fn ensure_running(&self) -> Result<(), ChainError> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(ChainError::Stopped);
        }
        Ok(())
    }
}

#[async_trait]
impl ChainEngine for Blockchain {
    fn chain_config(&self) -> &ChainConfig {
        &self.config
    }

    fn genesis_hash(&self) -> B256 {
        self.genesis_hash
    }

    fn head(&self) -> Result<Header, ChainError> {
        self.ensure_running()?;
        Ok(self.head.read().clone())
    }

    fn header_by_number(&self, number: u64) -> Result<Option<Header>, ChainError> {
        self.ensure_running()?;
        let Some(hash) = schema::read_canonical_hash(self.store.as_ref(), number)? else {
            return Ok(None);
        };
        Ok(schema::read_header(self.store.as_ref(), hash)?)
    }

    fn insert_header(&self, header: Header) -> Result<B256, ChainError> {
        self.ensure_running()?;

        let parent = schema::read_header(self.store.as_ref(), header.parent_hash)?
            .ok_or(ChainError::UnknownParent(header.parent_hash))?;
        self.consensus.verify_header(&header, &parent)?;

        let mut head = self.head.write();
        let hash = schema::write_header(self.store.as_ref(), &header)?;
        if header.parent_hash == head.hash() {
            schema::write_canonical_hash(self.store.as_ref(), header.number, hash)?;
            schema::write_head_hash(self.store.as_ref(), hash)?;
            debug!(number = header.number, %hash, "Extended canonical chain");
            *head = header;
        } else {
            debug!(number = header.number, %hash, "Stored side-chain header");
        }
        Ok(hash)
    }

    async fn stop(&self) -> SubsystemResult<()> {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            info!(head = self.head.read().number, "Blockchain stopped");
        }
        Ok(())
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FakeConsensus, setup_genesis};
    use assert_matches::assert_matches;
    use hearth_chain_primitives::Genesis;
    use hearth_node_api::ConsensusError;
    use hearth_storage::MemoryStore;

    fn chain_with(consensus: FakeConsensus) -> Blockchain {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let setup = setup_genesis(store.as_ref(), &Genesis::dev()).unwrap();
        Blockchain::new(
            store,
            setup.config,
            setup.genesis_hash,
            Arc::new(consensus),
            ExecutionConfig::default(),
        )
        .unwrap()
    }

    fn child_of(parent: &Header) -> Header {
        Header {
            parent_hash: parent.hash(),
            number: parent.number + 1,
            timestamp: parent.timestamp + 15,
            ..parent.clone()
        }
    }

    #[tokio::test]
    async fn test_insert_extends_head() {
        let chain = chain_with(FakeConsensus::new());
        let genesis = chain.head().unwrap();
        assert_eq!(genesis.hash(), chain.genesis_hash());

        let block1 = child_of(&genesis);
        let hash = chain.insert_header(block1.clone()).unwrap();

        assert_eq!(chain.head().unwrap().hash(), hash);
        assert_eq!(chain.header_by_number(1).unwrap(), Some(block1));
        assert_eq!(chain.header_by_number(2).unwrap(), None);
    }

    #[tokio::test]
    async fn test_insert_rejects_unknown_parent_and_consensus_failure() {
        let chain = chain_with(FakeConsensus::failing_at(1));
        let genesis = chain.head().unwrap();

        let mut orphan = child_of(&genesis);
        orphan.parent_hash = B256::repeat_byte(7);
        assert_matches!(chain.insert_header(orphan), Err(ChainError::UnknownParent(_)));

        assert_matches!(
            chain.insert_header(child_of(&genesis)),
            Err(ChainError::Consensus(ConsensusError::Rejected { number: 1, .. }))
        );
        assert_eq!(chain.head().unwrap(), genesis);
    }

    #[tokio::test]
    async fn test_operations_fail_after_stop() {
        let chain = chain_with(FakeConsensus::new());
        let genesis = chain.head().unwrap();

        chain.stop().await.unwrap();
        chain.stop().await.unwrap();

        assert!(chain.is_stopped());
        assert_matches!(chain.head(), Err(ChainError::Stopped));
        assert_matches!(chain.header_by_number(0), Err(ChainError::Stopped));
        assert_matches!(chain.insert_header(child_of(&genesis)), Err(ChainError::Stopped));
    }

    #[test]
    fn test_new_without_genesis_fails() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let result = Blockchain::new(
            store,
            ChainConfig::dev(),
            B256::ZERO,
            Arc::new(FakeConsensus::new()),
            ExecutionConfig::default(),
        );
        assert_matches!(result, Err(ChainError::MissingHeader(hash)) if hash == B256::ZERO);
    }
}
