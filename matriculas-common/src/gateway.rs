//! Dataset access gateway
//!
//! Cache lookup → remote fetch → r1 enrichment → cache population, plus
//! invalidation and the permission predicate. Fetch failures are absorbed
//! into `Ok(None)`; only uncapped cache tier failures reach the caller as
//! errors. Nothing here retries.

use futures::future::join_all;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::cache::TieredCache;
use crate::datasets::DatasetKey;
use crate::enrich::enrich;
use crate::record::Dataset;
use crate::roles::{self, Role};
use crate::source::DataSource;
use crate::users::User;
use crate::Result;

/// Fetch lifecycle of one dataset key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchState {
    Unfetched,
    /// Last request was served from the cache
    Cached,
    Fetching,
    /// Last request fetched and cached a fresh payload
    Fetched,
    Failed,
}

impl FetchState {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Fetching)
    }
}

pub struct DatasetGateway {
    cache: TieredCache,
    source: Arc<dyn DataSource>,
    states: Mutex<HashMap<DatasetKey, FetchState>>,
}

impl DatasetGateway {
    pub fn new(cache: TieredCache, source: Arc<dyn DataSource>) -> Self {
        Self {
            cache,
            source,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch one dataset, preferring the cache
    ///
    /// Returns `Ok(None)` when the remote fetch or parse fails; nothing is
    /// cached in that case and the caller may simply call again.
    pub async fn fetch_dataset(&self, key: DatasetKey) -> Result<Option<Dataset>> {
        let cache_key = key.cache_key();

        if let Some(dataset) = self.cache.get::<Dataset>(&cache_key).await? {
            self.set_state(key, FetchState::Cached).await;
            return Ok(Some(dataset));
        }

        self.set_state(key, FetchState::Fetching).await;
        let outcome = self.fetch_and_store(key, &cache_key).await;

        let state = match &outcome {
            Ok(Some(_)) => FetchState::Fetched,
            _ => FetchState::Failed,
        };
        self.set_state(key, state).await;

        outcome
    }

    async fn fetch_and_store(&self, key: DatasetKey, cache_key: &str) -> Result<Option<Dataset>> {
        let dataset = match self.fetch_remote(key).await {
            Ok(dataset) => dataset,
            Err(e) if e.is_fetch_failure() => {
                error!(dataset = %key, error = %e, "Error fetching dataset");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        self.cache.put(cache_key, &dataset).await?;
        info!(dataset = %key, records = dataset.len(), "Fetched and cached dataset");
        Ok(Some(dataset))
    }

    async fn fetch_remote(&self, key: DatasetKey) -> Result<Dataset> {
        let dataset = self.source.fetch(key).await?;
        if key != DatasetKey::R1 {
            return Ok(dataset);
        }

        // r2 is always fetched live here; its own cache entry is not consulted
        let secondary = self.source.fetch(DatasetKey::R2).await?;
        Ok(enrich(&dataset, &secondary))
    }

    /// Fetch all nine datasets concurrently
    ///
    /// A key that fails maps to `None` without affecting the others.
    pub async fn fetch_all(&self) -> BTreeMap<DatasetKey, Option<Dataset>> {
        let results = join_all(DatasetKey::ALL.iter().map(|&key| async move {
            let result = self.fetch_dataset(key).await;
            (key, result)
        }))
        .await;

        results
            .into_iter()
            .map(|(key, result)| {
                let dataset = result.unwrap_or_else(|e| {
                    error!(dataset = %key, error = %e, "Cache failure while fetching dataset");
                    None
                });
                (key, dataset)
            })
            .collect()
    }

    /// Drop the cached copy of one dataset and fetch it again
    pub async fn refresh(&self, key: DatasetKey) -> Result<Option<Dataset>> {
        self.clear_cache(Some(key)).await?;
        self.fetch_dataset(key).await
    }

    /// Drop every cached dataset and fetch all nine again
    ///
    /// A fetch already in flight may still repopulate the cache after the
    /// clear; that staleness is accepted.
    pub async fn refresh_all(&self) -> Result<BTreeMap<DatasetKey, Option<Dataset>>> {
        self.clear_cache(None).await?;
        Ok(self.fetch_all().await)
    }

    /// Remove one dataset, or all datasets, from both cache tiers
    pub async fn clear_cache(&self, key: Option<DatasetKey>) -> Result<()> {
        match key {
            Some(key) => {
                self.cache.clear(Some(&key.cache_key())).await?;
                info!(dataset = %key, "Cleared dataset cache");
            }
            None => {
                self.cache.clear(None).await?;
                info!("Cleared all dataset caches");
            }
        }
        Ok(())
    }

    /// Permission check for the current user; no user counts as viewer
    pub fn has_permission(&self, current_user: Option<&User>, required: Role) -> bool {
        roles::has_permission(current_user.map(|u| u.role), required)
    }

    pub async fn fetch_state(&self, key: DatasetKey) -> FetchState {
        self.states
            .lock()
            .await
            .get(&key)
            .copied()
            .unwrap_or(FetchState::Unfetched)
    }

    pub async fn is_loading(&self, key: DatasetKey) -> bool {
        self.fetch_state(key).await.is_loading()
    }

    async fn set_state(&self, key: DatasetKey, state: FetchState) {
        self.states.lock().await.insert(key, state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{KeyValueStore, MemoryStore};
    use crate::record::Record;
    use crate::Error;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl DataSource for CountingSource {
        async fn fetch(&self, key: DatasetKey) -> Result<Dataset> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::Network("connection refused".to_string()));
            }
            Ok(Dataset::new(vec![Record::from_pairs([("origen", key.as_str())])]))
        }
    }

    fn gateway(fail: bool) -> (Arc<CountingSource>, DatasetGateway) {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            fail,
        });
        let cache = TieredCache::new(
            Arc::new(MemoryStore::default()),
            Arc::new(MemoryStore::unlimited()),
        );
        (source.clone(), DatasetGateway::new(cache, source))
    }

    #[tokio::test]
    async fn test_second_fetch_served_from_cache() {
        let (source, gateway) = gateway(false);

        let first = gateway.fetch_dataset(DatasetKey::Cica).await.unwrap();
        assert_eq!(gateway.fetch_state(DatasetKey::Cica).await, FetchState::Fetched);
        let second = gateway.fetch_dataset(DatasetKey::Cica).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.fetch_state(DatasetKey::Cica).await, FetchState::Cached);
    }

    #[tokio::test]
    async fn test_failure_returns_none_and_clears_loading() {
        let (_source, gateway) = gateway(true);

        let result = gateway.fetch_dataset(DatasetKey::VurGeneral).await.unwrap();
        assert!(result.is_none());
        assert!(!gateway.is_loading(DatasetKey::VurGeneral).await);
        assert_eq!(gateway.fetch_state(DatasetKey::VurGeneral).await, FetchState::Failed);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let (source, gateway) = gateway(true);

        gateway.fetch_dataset(DatasetKey::Cica).await.unwrap();
        gateway.fetch_dataset(DatasetKey::Cica).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_r1_fetch_pulls_r2_live() {
        let (source, gateway) = gateway(false);

        let r1 = gateway.fetch_dataset(DatasetKey::R1).await.unwrap().unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert!(r1.data[0].get("MATRICULA_INMOBILIARIA").is_some());
    }

    #[tokio::test]
    async fn test_refresh_bypasses_cache() {
        let (source, gateway) = gateway(false);

        gateway.fetch_dataset(DatasetKey::Cica).await.unwrap();
        gateway.refresh(DatasetKey::Cica).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    /// Uncapped tier whose reads or writes can be made to fail
    struct BrokenStore {
        inner: MemoryStore,
        fail_get: bool,
        fail_put: bool,
    }

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn get(&self, key: &str) -> Result<Option<String>> {
            if self.fail_get {
                return Err(Error::CacheBackend("disk I/O error".to_string()));
            }
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, value: String) -> Result<()> {
            if self.fail_put {
                return Err(Error::CacheBackend("database is locked".to_string()));
            }
            self.inner.put(key, value).await
        }

        async fn delete(&self, key: &str) -> Result<()> {
            self.inner.delete(key).await
        }

        async fn clear(&self) -> Result<()> {
            self.inner.clear().await
        }
    }

    fn gateway_over(uncapped: BrokenStore) -> (Arc<CountingSource>, Arc<MemoryStore>, DatasetGateway) {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let capped = Arc::new(MemoryStore::default());
        let cache = TieredCache::new(capped.clone(), Arc::new(uncapped));
        (source.clone(), capped, DatasetGateway::new(cache, source))
    }

    #[tokio::test]
    async fn test_uncapped_read_failure_is_returned_without_fetching() {
        let (source, _capped, gateway) = gateway_over(BrokenStore {
            inner: MemoryStore::unlimited(),
            fail_get: true,
            fail_put: false,
        });

        let result = gateway.fetch_dataset(DatasetKey::Cica).await;

        assert!(matches!(result, Err(Error::CacheBackend(_))));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        assert!(!gateway.is_loading(DatasetKey::Cica).await);
    }

    #[tokio::test]
    async fn test_uncapped_write_failure_caches_nothing_and_clears_loading() {
        let (source, capped, gateway) = gateway_over(BrokenStore {
            inner: MemoryStore::unlimited(),
            fail_get: false,
            fail_put: true,
        });

        let result = gateway.fetch_dataset(DatasetKey::Cica).await;

        assert!(matches!(result, Err(Error::CacheBackend(_))));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.fetch_state(DatasetKey::Cica).await, FetchState::Failed);
        assert!(!gateway.is_loading(DatasetKey::Cica).await);
        assert!(capped.is_empty().await);

        // Nothing was cached, so the next call goes back to the source
        let _ = gateway.fetch_dataset(DatasetKey::Cica).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unfetched_by_default() {
        let (_source, gateway) = gateway(false);
        assert_eq!(gateway.fetch_state(DatasetKey::R2).await, FetchState::Unfetched);
    }

    #[tokio::test]
    async fn test_has_permission_uses_user_role() {
        let (_source, gateway) = gateway(false);
        let root = User {
            email: "root@x.org".to_string(),
            role: Role::Root,
        };
        let recognizer = User {
            email: "rec@x.org".to_string(),
            role: Role::Recognizer,
        };

        assert!(gateway.has_permission(Some(&root), Role::Admin));
        assert!(!gateway.has_permission(Some(&recognizer), Role::Admin));
        assert!(gateway.has_permission(None, Role::Viewer));
        assert!(!gateway.has_permission(None, Role::Recognizer));
    }
}
