//! Key layout of chain data in the key-value store.

use alloy_primitives::B256;
use hearth_chain_primitives::{ChainConfig, Header};
use hearth_storage::{KeyValueStore, StorageError, StorageResult};
use serde::{Serialize, de::DeserializeOwned};

const HEADER_PREFIX: &[u8] = b"h";
const CANONICAL_PREFIX: &[u8] = b"c";
const CONFIG_PREFIX: &[u8] = b"ethereum-config-";
const HEAD_HEADER_KEY: &[u8] = b"LastHeader";

fn prefixed(prefix: &[u8], suffix: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + suffix.len());
    key.extend_from_slice(prefix);
    key.extend_from_slice(suffix);
    key
}

fn header_key(hash: B256) -> Vec<u8> {
    prefixed(HEADER_PREFIX, hash.as_slice())
}

fn canonical_key(number: u64) -> Vec<u8> {
    prefixed(CANONICAL_PREFIX, &number.to_be_bytes())
}

fn config_key(genesis: B256) -> Vec<u8> {
    prefixed(CONFIG_PREFIX, genesis.as_slice())
}

fn encode<T: Serialize>(value: &T) -> StorageResult<Vec<u8>> {
    postcard::to_allocvec(value).map_err(StorageError::backend)
}

fn decode<T: DeserializeOwned>(key: &[u8], bytes: &[u8]) -> StorageResult<T> {
    postcard::from_bytes(bytes).map_err(|e| StorageError::Decode {
        key: String::from_utf8_lossy(key).into_owned(),
        reason: e.to_string(),
    })
}

fn read_hash(store: &dyn KeyValueStore, key: &[u8]) -> StorageResult<Option<B256>> {
    match store.get(key)? {
        Some(bytes) if bytes.len() == B256::len_bytes() => Ok(Some(B256::from_slice(&bytes))),
        Some(bytes) => Err(StorageError::Decode {
            key: String::from_utf8_lossy(key).into_owned(),
            reason: format!("expected 32 byte hash, found {} bytes", bytes.len()),
        }),
        None => Ok(None),
    }
}

pub(crate) fn read_header(store: &dyn KeyValueStore, hash: B256) -> StorageResult<Option<Header>> {
    let key = header_key(hash);
    store.get(&key)?.map(|bytes| decode(&key, &bytes)).transpose()
}

pub(crate) fn write_header(store: &dyn KeyValueStore, header: &Header) -> StorageResult<B256> {
    let hash = header.hash();
    store.put(&header_key(hash), &encode(header)?)?;
    Ok(hash)
}

pub(crate) fn read_canonical_hash(
    store: &dyn KeyValueStore,
    number: u64,
) -> StorageResult<Option<B256>> {
    read_hash(store, &canonical_key(number))
}

pub(crate) fn write_canonical_hash(
    store: &dyn KeyValueStore,
    number: u64,
    hash: B256,
) -> StorageResult<()> {
    store.put(&canonical_key(number), hash.as_slice())
}

pub(crate) fn read_head_hash(store: &dyn KeyValueStore) -> StorageResult<Option<B256>> {
    read_hash(store, HEAD_HEADER_KEY)
}

pub(crate) fn write_head_hash(store: &dyn KeyValueStore, hash: B256) -> StorageResult<()> {
    store.put(HEAD_HEADER_KEY, hash.as_slice())
}

pub(crate) fn read_chain_config(
    store: &dyn KeyValueStore,
    genesis: B256,
) -> StorageResult<Option<ChainConfig>> {
    let key = config_key(genesis);
    store.get(&key)?.map(|bytes| decode(&key, &bytes)).transpose()
}

pub(crate) fn write_chain_config(
    store: &dyn KeyValueStore,
    genesis: B256,
    config: &ChainConfig,
) -> StorageResult<()> {
    store.put(&config_key(genesis), &encode(config)?)
}
