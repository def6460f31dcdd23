use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use alloy_primitives::B256;
use async_trait::async_trait;
use dashmap::DashMap;
use hearth_chain_primitives::Transaction;
use hearth_node_api::{
    ChainEngine, EventBus, NodeEvent, PoolError, SubsystemResult, TransactionPool,
};
use metrics::{Counter, Gauge};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

/// Default number of pending transactions the pool holds.
pub const DEFAULT_TX_POOL_CAPACITY: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxPoolConfig {
    pub capacity: usize,
}

impl Default for TxPoolConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_TX_POOL_CAPACITY,
        }
    }
}

struct TxPoolMetrics {
    added: Counter,
    rejected: Counter,
    pending: Gauge,
}

impl Default for TxPoolMetrics {
    fn default() -> Self {
        Self {
            added: metrics::counter!("txpool.added_total"),
            rejected: metrics::counter!("txpool.rejected_total"),
            pending: metrics::gauge!("txpool.pending"),
        }
    }
}

/// Bounded in-memory transaction pool.
pub struct TxPool {
    config: TxPoolConfig,
    chain: Arc<dyn ChainEngine>,
    events: Arc<EventBus>,
    pending: DashMap<B256, Transaction>,
    // Serialises admission so the capacity bound holds.
    admit: Mutex<()>,
    stopped: AtomicBool,
    metrics: TxPoolMetrics,
}

impl std::fmt::Debug for TxPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxPool")
            .field("config", &self.config)
            .field("pending", &self.pending.len())
            .field("stopped", &self.stopped.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl TxPool {
    pub fn new(config: TxPoolConfig, chain: Arc<dyn ChainEngine>, events: Arc<EventBus>) -> Self {
        debug!(
            capacity = config.capacity,
            chain_id = chain.chain_config().chain_id,
            "Created transaction pool"
        );
        Self {
            config,
            chain,
            events,
            pending: DashMap::new(),
            admit: Mutex::new(()),
            stopped: AtomicBool::new(false),
            metrics: TxPoolMetrics::default(),
        }
    }

    pub fn get(&self, hash: &B256) -> Option<Transaction> {
        self.pending.get(hash).map(|tx| tx.value().clone())
    }
}

#[async_trait]
impl TransactionPool for TxPool {
    fn add(&self, tx: Transaction) -> Result<B256, PoolError> {
        let hash = tx.hash();
        {
            let _admit = self.admit.lock();
            if self.stopped.load(Ordering::SeqCst) {
                return Err(PoolError::Stopped);
            }
            if self.pending.contains_key(&hash) {
                self.metrics.rejected.increment(1);
                return Err(PoolError::AlreadyKnown(hash));
            }
            if self.pending.len() >= self.config.capacity {
                self.metrics.rejected.increment(1);
                return Err(PoolError::Full {
                    capacity: self.config.capacity,
                });
            }
            self.pending.insert(hash, tx);
        }

        self.metrics.added.increment(1);
        self.metrics.pending.set(self.pending.len() as f64);
        trace!(%hash, "Added transaction");
        self.events.publish(NodeEvent::TxAdded { hash });
        Ok(hash)
    }

    fn pending_count(&self) -> usize {
        self.pending.len()
    }

    async fn stop(&self) -> SubsystemResult<()> {
        let _admit = self.admit.lock();
        if !self.stopped.swap(true, Ordering::SeqCst) {
            let dropped = self.pending.len();
            self.pending.clear();
            self.metrics.pending.set(0.0);
            info!(
                dropped,
                chain_stopped = self.chain.is_stopped(),
                "Transaction pool stopped"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Blockchain, FakeConsensus, setup_genesis};
    use alloy_primitives::Bytes;
    use assert_matches::assert_matches;
    use hearth_chain_primitives::{ExecutionConfig, Genesis};
    use hearth_storage::{KeyValueStore, MemoryStore};

    fn pool(capacity: usize) -> (TxPool, Arc<EventBus>) {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let setup = setup_genesis(store.as_ref(), &Genesis::dev()).unwrap();
        let chain = Blockchain::new(
            store,
            setup.config,
            setup.genesis_hash,
            Arc::new(FakeConsensus::new()),
            ExecutionConfig::default(),
        )
        .unwrap();
        let events = Arc::new(EventBus::new(16));
        let pool = TxPool::new(TxPoolConfig { capacity }, Arc::new(chain), events.clone());
        (pool, events)
    }

    fn tx(nonce: u64) -> Transaction {
        Transaction {
            nonce,
            gas_price: 1,
            payload: Bytes::new(),
        }
    }

    #[tokio::test]
    async fn test_add_publishes_event() {
        let (pool, events) = pool(4);
        let mut rx = events.subscribe().unwrap();

        let hash = pool.add(tx(0)).unwrap();
        assert_eq!(rx.recv().await.unwrap(), NodeEvent::TxAdded { hash });
        assert_eq!(pool.get(&hash), Some(tx(0)));
        assert_matches!(pool.add(tx(0)), Err(PoolError::AlreadyKnown(h)) if h == hash);
    }

    #[tokio::test]
    async fn test_capacity_is_enforced() {
        let (pool, _events) = pool(2);
        pool.add(tx(0)).unwrap();
        pool.add(tx(1)).unwrap();

        assert_matches!(pool.add(tx(2)), Err(PoolError::Full { capacity: 2 }));
        assert_eq!(pool.pending_count(), 2);
    }

    #[tokio::test]
    async fn test_stop_drops_pending() {
        let (pool, _events) = pool(2);
        pool.add(tx(0)).unwrap();

        pool.stop().await.unwrap();
        pool.stop().await.unwrap();

        assert_eq!(pool.pending_count(), 0);
        assert_matches!(pool.add(tx(1)), Err(PoolError::Stopped));
    }
}
