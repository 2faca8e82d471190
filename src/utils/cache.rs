//! Short-lived response cache keyed by the requested URL

use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Default lifetime of a cached extraction
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

#[derive(Clone)]
struct CachedResponse<V> {
    value: V,
    stored_at: Instant,
}

/// Async TTL cache over moka
#[derive(Clone)]
pub struct ResponseCache<V> {
    cache: Cache<String, CachedResponse<V>>,
    ttl: Duration,
}

/// Snapshot of the cache contents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatus {
    pub total_entries: usize,
    /// Entry lifetime in seconds
    pub cache_duration: u64,
    pub entries: Vec<CacheEntryStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntryStatus {
    pub key: String,
    /// Seconds since the entry was stored
    pub age: u64,
    pub is_valid: bool,
}

impl<V> ResponseCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder().time_to_live(ttl).build(),
            ttl,
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        let cached = self.cache.get(key).await?;
        if cached.stored_at.elapsed() >= self.ttl {
            return None;
        }
        debug!("Cache hit for {}", key);
        Some(cached.value)
    }

    pub async fn insert(&self, key: impl Into<String>, value: V) {
        let cached = CachedResponse {
            value,
            stored_at: Instant::now(),
        };
        self.cache.insert(key.into(), cached).await;
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.cache.invalidate_all();
        info!("Response cache cleared");
    }

    pub fn status(&self) -> CacheStatus {
        let mut entries: Vec<CacheEntryStatus> = self
            .cache
            .iter()
            .map(|(key, cached)| {
                let age = cached.stored_at.elapsed();
                CacheEntryStatus {
                    key: key.as_ref().clone(),
                    age: age.as_secs(),
                    is_valid: age < self.ttl,
                }
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        CacheStatus {
            total_entries: entries.len(),
            cache_duration: self.ttl.as_secs(),
            entries,
        }
    }
}

impl<V> Default for ResponseCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_get() {
        let cache: ResponseCache<String> = ResponseCache::default();
        assert_eq!(cache.status().cache_duration, 60);

        cache.insert("https://a", "first".to_string()).await;
        assert_eq!(cache.get("https://a").await, Some("first".to_string()));
        assert_eq!(cache.get("https://b").await, None);
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let cache: ResponseCache<u32> = ResponseCache::new(Duration::from_millis(100));
        cache.insert("k", 1).await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache: ResponseCache<u32> = ResponseCache::default();
        cache.insert("k", 1).await;
        cache.clear();
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn test_status() {
        let cache: ResponseCache<u32> = ResponseCache::default();
        cache.insert("b", 2).await;
        cache.insert("a", 1).await;

        let status = cache.status();
        assert_eq!(status.total_entries, 2);
        assert_eq!(status.cache_duration, 60);
        assert_eq!(status.entries[0].key, "a");
        assert!(status.entries.iter().all(|e| e.is_valid && e.age < 60));
    }
}
