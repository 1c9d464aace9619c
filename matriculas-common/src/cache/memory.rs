//! In-process key-value store with a per-value size ceiling
//!
//! Serves as the fast capped tier. Size is measured as the UTF-8 byte
//! length of the stored text, so non-ASCII payloads count at their real
//! encoded size.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::KeyValueStore;
use crate::{Error, Result};

/// Capped tier ceiling: 4 MiB per value
pub const DEFAULT_CAPPED_LIMIT_BYTES: usize = 4 * 1024 * 1024;

pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    limit: Option<usize>,
}

impl MemoryStore {
    /// Store rejecting values larger than `limit` bytes
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            limit: Some(limit),
        }
    }

    /// Store without a size ceiling
    pub fn unlimited() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            limit: None,
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_limit(DEFAULT_CAPPED_LIMIT_BYTES)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> Result<()> {
        if let Some(limit) = self.limit {
            if value.len() > limit {
                // A rejected write must not leave an older value behind
                self.entries.write().await.remove(key);
                return Err(Error::CapacityExceeded {
                    key: key.to_string(),
                    size: value.len(),
                    limit,
                });
            }
        }
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}
