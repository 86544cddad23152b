use std::{
    collections::HashMap,
    future::Future,
    sync::Arc,
    time::{Duration, Instant},
};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

const ENABLE_LOGS: bool = true;
use crate::log_debug;

/// Queries whose results screens share.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    PlantList,
    PlantDetail(String),
}

struct CacheEntry {
    value: Value,
    fetched_at: Instant,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<QueryKey, CacheEntry>,
    /// Bumped on every invalidation so a fetch that started earlier cannot
    /// write its now-stale answer back.
    generations: HashMap<QueryKey, u64>,
}

impl CacheState {
    fn generation(&self, key: &QueryKey) -> u64 {
        self.generations.get(key).copied().unwrap_or(0)
    }
}

/// In-memory query cache with time-based staleness and explicit invalidation.
///
/// Saving or editing a plant invalidates the affected keys; the next read of
/// those keys goes back to the server.
#[derive(Clone)]
pub struct QueryCache {
    state: Arc<Mutex<CacheState>>,
    stale_after: Duration,
}

impl QueryCache {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState::default())),
            stale_after,
        }
    }

    /// Fresh cached value for `key`, if any.
    pub async fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let state = self.state.lock().await;
        let entry = state.entries.get(key)?;
        if entry.fetched_at.elapsed() > self.stale_after {
            return None;
        }
        serde_json::from_value(entry.value.clone()).ok()
    }

    pub async fn put<T: Serialize>(&self, key: QueryKey, value: &T) {
        let Ok(value) = serde_json::to_value(value) else {
            return;
        };
        let mut state = self.state.lock().await;
        state.entries.insert(
            key,
            CacheEntry {
                value,
                fetched_at: Instant::now(),
            },
        );
    }

    pub async fn invalidate(&self, key: &QueryKey) {
        let mut state = self.state.lock().await;
        state.entries.remove(key);
        *state.generations.entry(key.clone()).or_insert(0) += 1;
        log_debug!("invalidated query {:?}", key);
    }

    /// Drops everything derived from one plant: its detail and the list.
    pub async fn invalidate_plant(&self, id: &str) {
        self.invalidate(&QueryKey::PlantDetail(id.to_string())).await;
        self.invalidate(&QueryKey::PlantList).await;
    }

    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        let keys: Vec<QueryKey> = state.entries.keys().cloned().collect();
        state.entries.clear();
        for key in keys {
            *state.generations.entry(key).or_insert(0) += 1;
        }
    }

    /// Cached value when fresh, otherwise `fetch` and remember the result.
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.get::<T>(&key).await {
            return Ok(cached);
        }

        let generation = self.state.lock().await.generation(&key);
        let value = fetch().await?;

        let serialized = serde_json::to_value(&value).ok();
        let mut state = self.state.lock().await;
        if let Some(serialized) = serialized {
            if state.generation(&key) == generation {
                state.entries.insert(
                    key,
                    CacheEntry {
                        value: serialized,
                        fetched_at: Instant::now(),
                    },
                );
            }
        }
        Ok(value)
    }
}
