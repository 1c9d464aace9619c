//! Two-tier dataset cache
//!
//! Lookups try the capped tier first and fall through to the uncapped tier,
//! which is the source of truth. Writes go to the uncapped tier first; the
//! capped tier is best-effort and may refuse large values.
//!
//! Tiers are independent [`KeyValueStore`] instances holding serialized JSON
//! text. There is no cross-tier atomicity: a reader may see the uncapped tier
//! updated before the capped tier.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{Error, Result};

pub mod memory;
pub mod sqlite;

pub use memory::{MemoryStore, DEFAULT_CAPPED_LIMIT_BYTES};
pub use sqlite::SqliteStore;

/// Key-value store holding serialized documents
///
/// Implementations serialize their own reads and writes. A capacity-limited
/// store answers oversized writes with [`Error::CapacityExceeded`].
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Store name used in log output
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn put(&self, key: &str, value: String) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    async fn clear(&self) -> Result<()>;
}

/// Capped tier in front of an uncapped tier
#[derive(Clone)]
pub struct TieredCache {
    capped: Arc<dyn KeyValueStore>,
    uncapped: Arc<dyn KeyValueStore>,
}

impl TieredCache {
    pub fn new(capped: Arc<dyn KeyValueStore>, uncapped: Arc<dyn KeyValueStore>) -> Self {
        Self { capped, uncapped }
    }

    /// Look up a document
    ///
    /// Capped-tier failures are logged and treated as a miss. Uncapped-tier
    /// failures propagate. A hit in the uncapped tier is copied back into the
    /// capped tier, ignoring any failure.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.capped.get(key).await {
            Ok(Some(text)) => match serde_json::from_str::<T>(&text) {
                Ok(value) => {
                    debug!(key, tier = self.capped.name(), "Cache hit");
                    return Ok(Some(value));
                }
                Err(e) => {
                    warn!(key, tier = self.capped.name(), error = %e, "Evicting corrupt cache entry");
                    if let Err(e) = self.capped.delete(key).await {
                        warn!(key, tier = self.capped.name(), error = %e, "Capped tier delete failed");
                    }
                }
            },
            Ok(None) => {}
            Err(e) => {
                warn!(key, tier = self.capped.name(), error = %e, "Capped tier read failed");
            }
        }

        let text = match self.uncapped.get(key).await? {
            Some(text) => text,
            None => {
                debug!(key, "Cache miss");
                return Ok(None);
            }
        };

        let value = match serde_json::from_str::<T>(&text) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, tier = self.uncapped.name(), error = %e, "Evicting corrupt cache entry");
                self.uncapped.delete(key).await?;
                return Ok(None);
            }
        };

        debug!(key, tier = self.uncapped.name(), "Cache hit");
        self.put_capped(key, text).await;
        Ok(Some(value))
    }

    /// Store a document in both tiers
    ///
    /// Fails only when the uncapped tier fails.
    pub async fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let text = serde_json::to_string(value)
            .map_err(|e| Error::Internal(format!("Failed to serialize {}: {}", key, e)))?;

        self.uncapped.put(key, text.clone()).await?;
        self.put_capped(key, text).await;
        Ok(())
    }

    /// Remove one key from both tiers, or everything when `key` is `None`
    pub async fn clear(&self, key: Option<&str>) -> Result<()> {
        match key {
            Some(key) => {
                self.uncapped.delete(key).await?;
                if let Err(e) = self.capped.delete(key).await {
                    warn!(key, tier = self.capped.name(), error = %e, "Capped tier delete failed");
                }
            }
            None => {
                self.uncapped.clear().await?;
                if let Err(e) = self.capped.clear().await {
                    warn!(tier = self.capped.name(), error = %e, "Capped tier clear failed");
                }
            }
        }
        Ok(())
    }

    async fn put_capped(&self, key: &str, text: String) {
        match self.capped.put(key, text).await {
            Ok(()) => {}
            Err(Error::CapacityExceeded { size, limit, .. }) => {
                warn!(
                    key,
                    size,
                    limit,
                    "Value exceeds capped tier limit, keeping it in the uncapped tier only"
                );
            }
            Err(e) => {
                warn!(key, tier = self.capped.name(), error = %e, "Capped tier write failed");
            }
        }
    }
}
