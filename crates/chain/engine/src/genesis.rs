use hearth_chain_primitives::{Genesis, GenesisError, GenesisSetup};
use hearth_storage::KeyValueStore;
use tracing::{info, warn};

use crate::schema;

/// Reconcile `genesis` with the contents of `store`.
///
/// | database                      | outcome                                   |
/// |-------------------------------|-------------------------------------------|
/// | empty                         | genesis committed, new config             |
/// | different genesis hash        | [`GenesisError::Mismatch`]                |
/// | stored config, forks passed   | [`GenesisError::Compat`], stored config   |
/// | stored config, compatible     | new config persisted                      |
pub fn setup_genesis(
    store: &dyn KeyValueStore,
    genesis: &Genesis,
) -> Result<GenesisSetup, GenesisError> {
    let genesis_hash = genesis.hash();

    let Some(stored_hash) = schema::read_canonical_hash(store, 0)? else {
        info!(hash = %genesis_hash, chain_id = genesis.config.chain_id, "Writing genesis block");
        let header = genesis.to_header();
        schema::write_header(store, &header)?;
        schema::write_canonical_hash(store, 0, genesis_hash)?;
        schema::write_head_hash(store, genesis_hash)?;
        schema::write_chain_config(store, genesis_hash, &genesis.config)?;
        return Ok(GenesisSetup {
            config: genesis.config.clone(),
            genesis_hash,
            head: 0,
        });
    };

    if stored_hash != genesis_hash {
        return Err(GenesisError::Mismatch {
            stored: stored_hash,
            new: genesis_hash,
        });
    }

    let head = match schema::read_head_hash(store)? {
        Some(hash) => schema::read_header(store, hash)?.map_or(0, |h| h.number),
        None => 0,
    };

    let Some(stored_config) = schema::read_chain_config(store, stored_hash)? else {
        warn!(hash = %stored_hash, "Found genesis block without chain config");
        schema::write_chain_config(store, stored_hash, &genesis.config)?;
        return Ok(GenesisSetup {
            config: genesis.config.clone(),
            genesis_hash,
            head,
        });
    };

    if let Some(err) = stored_config.check_compatible(&genesis.config, head) {
        return Err(GenesisError::Compat {
            setup: GenesisSetup {
                config: stored_config,
                genesis_hash,
                head,
            },
            err,
        });
    }

    schema::write_chain_config(store, stored_hash, &genesis.config)?;
    Ok(GenesisSetup {
        config: genesis.config.clone(),
        genesis_hash,
        head,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;
    use assert_matches::assert_matches;
    use hearth_chain_primitives::Header;
    use hearth_storage::{MemoryStore, StorageError};

    fn extend_head(store: &MemoryStore, number: u64) {
        let header = Header {
            parent_hash: B256::ZERO,
            number,
            timestamp: number,
            difficulty: Default::default(),
            gas_limit: 0,
            extra_data: Default::default(),
            nonce: 0,
        };
        let hash = schema::write_header(store, &header).unwrap();
        schema::write_head_hash(store, hash).unwrap();
    }

    #[test]
    fn test_fresh_database_commits_genesis() {
        let store = MemoryStore::new();
        let genesis = Genesis::dev();

        let setup = setup_genesis(&store, &genesis).unwrap();
        assert_eq!(setup.genesis_hash, genesis.hash());
        assert_eq!(setup.head, 0);
        assert_eq!(
            schema::read_canonical_hash(&store, 0).unwrap(),
            Some(genesis.hash())
        );

        // Re-running against the same database is a no-op.
        assert_eq!(setup_genesis(&store, &genesis).unwrap(), setup);
    }

    #[test]
    fn test_other_genesis_is_fatal_mismatch() {
        let store = MemoryStore::new();
        setup_genesis(&store, &Genesis::dev()).unwrap();

        let err = setup_genesis(&store, &Genesis::mainnet()).unwrap_err();
        assert!(err.is_fatal());
        assert_matches!(err, GenesisError::Mismatch { stored, new } => {
            assert_eq!(stored, Genesis::dev().hash());
            assert_eq!(new, Genesis::mainnet().hash());
        });
    }

    #[test]
    fn test_passed_fork_change_is_tolerated_with_stored_config() {
        let store = MemoryStore::new();
        let genesis = Genesis::mainnet();
        setup_genesis(&store, &genesis).unwrap();
        extend_head(&store, 2_000_000);

        let mut changed = genesis.clone();
        changed.config.homestead_block = Some(1_500_000);

        let err = setup_genesis(&store, &changed).unwrap_err();
        assert!(!err.is_fatal());
        assert_matches!(err, GenesisError::Compat { setup, err } => {
            assert_eq!(setup.config, genesis.config);
            assert_eq!(setup.head, 2_000_000);
            assert_eq!(err.what, "Homestead fork block");
        });
    }

    #[test]
    fn test_future_fork_change_is_persisted() {
        let store = MemoryStore::new();
        let genesis = Genesis::mainnet();
        setup_genesis(&store, &genesis).unwrap();

        let mut changed = genesis.clone();
        changed.config.constantinople_block = Some(9_000_000);

        let setup = setup_genesis(&store, &changed).unwrap();
        assert_eq!(setup.config, changed.config);
        assert_eq!(
            schema::read_chain_config(&store, genesis.hash()).unwrap(),
            Some(changed.config)
        );
    }

    #[test]
    fn test_closed_store_is_storage_error() {
        let store = MemoryStore::new();
        store.close().unwrap();

        let err = setup_genesis(&store, &Genesis::dev()).unwrap_err();
        assert!(err.is_fatal());
        assert_matches!(err, GenesisError::Storage(StorageError::Closed));
    }
}
