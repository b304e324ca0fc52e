//! Key/value store seam
//!
//! The four passthrough operations behind a trait, with an agent-backed
//! implementation ([`crate::agent::AgentClient`]) and an in-memory store for
//! tests and agent-free development. Neither implementation caches or
//! resolves conflicts; that stays with the backend.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{Error, Result};

/// Flags value stamped on every written key
pub(crate) const KV_PUT_FLAGS: u64 = 42;

/// A key with its stored value and flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvPair {
    pub key: String,
    pub value: Bytes,
    pub flags: u64,
}

/// Key/value operations against a discovery backend's store
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch a value by key
    ///
    /// Returns `Ok(None)` when the key is absent; infrastructure failures
    /// are errors, never collapsed into absence.
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// List all pairs whose key starts with `prefix`, in key order
    async fn list(&self, prefix: &str) -> Result<Vec<KvPair>>;

    /// Write a value under a key
    async fn put(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Delete a key
    ///
    /// Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// In-memory key/value store
///
/// Thread-safe ordered storage for tests and local development; mirrors the
/// agent store's semantics (flags stamping, absent-key delete).
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: RwLock<BTreeMap<String, KvPair>>,
}

impl MemoryKv {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| Error::KeyValue("store lock poisoned".to_string()))?;
        Ok(entries.get(key).map(|pair| pair.value.clone()))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<KvPair>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| Error::KeyValue("store lock poisoned".to_string()))?;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(_, pair)| pair.clone())
            .collect())
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| Error::KeyValue("store lock poisoned".to_string()))?;
        entries.insert(
            key.to_string(),
            KvPair {
                key: key.to_string(),
                value: Bytes::copy_from_slice(value),
                flags: KV_PUT_FLAGS,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| Error::KeyValue("store lock poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}
