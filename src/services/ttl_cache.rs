//! Process-local time-based cache.
//!
//! Entries are keyed by call arguments and served until `ttl` has elapsed
//! since they were fetched. Key count is unbounded; an expired entry is only
//! replaced by the next successful fetch for its key.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Validity window of the tracker accessors (5 minutes).
pub const DEFAULT_TTL_SECS: u64 = 300;

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    fetched_at: Instant,
}

/// Cache of fetched values with a fixed validity window.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The cached value for `key`, if it is still fresh.
    pub async fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.lock().await;
        entries
            .get(key)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    /// Store a freshly fetched value.
    pub async fn insert(&self, key: K, value: V) {
        let entry = CacheEntry {
            value,
            fetched_at: Instant::now(),
        };
        self.entries.lock().await.insert(key, entry);
    }

    /// Return the fresh cached value or run `fetch` and cache its result.
    ///
    /// The lock is not held while `fetch` runs. Errors are returned as-is and
    /// leave any stale entry untouched.
    pub async fn get_or_try_fetch<F, Fut, E>(&self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key).await {
            log::debug!("Cache hit for {:?}", key);
            return Ok(value);
        }

        log::debug!("Cache miss for {:?}", key);
        let value = fetch().await?;
        self.insert(key, value.clone()).await;
        Ok(value)
    }

    /// Number of stored entries, fresh or expired.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TTL_SECS))
    }
}
