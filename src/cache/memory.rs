//! In-memory cache implementation using moka
//!
//! Provides a fast, thread-safe in-memory cache with TTL support and
//! glob-style pattern matching for bulk deletion.

use super::CacheLayer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use moka::future::Cache;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Default maximum cache capacity (number of entries)
pub const DEFAULT_MAX_CAPACITY: u64 = 10_000;

/// Default TTL for cache entries (1 hour)
const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Cache entry wrapper that stores serialized JSON data, so any
/// serializable type can share one cache instance.
#[derive(Clone)]
struct CacheEntry {
    /// JSON-serialized value
    data: Arc<String>,
}

impl CacheEntry {
    fn new<T: Serialize>(value: &T) -> Result<Self> {
        let json = serde_json::to_string(value).context("Failed to serialize cache value")?;
        Ok(Self {
            data: Arc::new(json),
        })
    }

    fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.data).context("Failed to deserialize cache value")
    }
}

/// In-memory cache using moka.
///
/// Values are stored as JSON strings to support generic types. Entries
/// expire after the cache-wide TTL; per-call TTLs shorter than that are
/// not enforced individually.
pub struct MemoryCache {
    cache: Cache<String, CacheEntry>,
    default_ttl: Duration,
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entry_count", &self.cache.entry_count())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

impl MemoryCache {
    /// Create a new memory cache with default settings
    pub fn new() -> Self {
        Self::with_capacity_and_ttl(DEFAULT_MAX_CAPACITY, DEFAULT_TTL)
    }

    /// Create a new memory cache with custom capacity and TTL
    pub fn with_capacity_and_ttl(max_capacity: u64, default_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(default_ttl)
            .build();

        Self { cache, default_ttl }
    }

    /// Get the default TTL for this cache
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Get the current number of entries in the cache
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Glob-style pattern matching: `*` matches any sequence, `?` any
    /// single character.
    fn pattern_matches(pattern: &str, key: &str) -> bool {
        let pattern_chars: Vec<char> = pattern.chars().collect();
        let key_chars: Vec<char> = key.chars().collect();
        Self::glob_match(&pattern_chars, &key_chars, 0, 0)
    }

    fn glob_match(pattern: &[char], key: &[char], pi: usize, ki: usize) -> bool {
        if pi == pattern.len() {
            return ki == key.len();
        }

        match pattern[pi] {
            '*' => {
                if Self::glob_match(pattern, key, pi + 1, ki) {
                    return true;
                }
                if ki < key.len() && Self::glob_match(pattern, key, pi, ki + 1) {
                    return true;
                }
                false
            }
            '?' => {
                if ki < key.len() {
                    Self::glob_match(pattern, key, pi + 1, ki + 1)
                } else {
                    false
                }
            }
            p => {
                if ki < key.len() && key[ki] == p {
                    Self::glob_match(pattern, key, pi + 1, ki + 1)
                } else {
                    false
                }
            }
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheLayer for MemoryCache {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        match self.cache.get(key).await {
            Some(entry) => {
                let value = entry.deserialize()?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        let entry = CacheEntry::new(value)?;
        self.cache.insert(key.to_string(), entry).await;
        // Entries expire via the cache-wide time_to_live; the per-call
        // TTL is honored only as an upper bound.
        let _ = ttl;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<()> {
        let keys_to_delete: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, _)| Self::pattern_matches(pattern, key.as_ref()))
            .map(|(key, _)| (*key).clone())
            .collect();

        for key in keys_to_delete {
            self.cache.invalidate(&key).await;
        }

        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.cache.invalidate_all();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let cache = MemoryCache::new();
        cache
            .set("article:1", &42i64, Duration::from_secs(60))
            .await
            .unwrap();

        let value: Option<i64> = cache.get("article:1").await.unwrap();
        assert_eq!(value, Some(42));

        let missing: Option<i64> = cache.get("article:2").await.unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = MemoryCache::new();
        cache
            .set("key", &"v".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        cache.delete("key").await.unwrap();

        let value: Option<String> = cache.get("key").await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_delete_pattern() {
        let cache = MemoryCache::new();
        for key in ["news:1", "news:2", "podcast:1"] {
            cache
                .set(key, &"v".to_string(), Duration::from_secs(60))
                .await
                .unwrap();
        }

        cache.delete_pattern("news:*").await.unwrap();

        let news: Option<String> = cache.get("news:1").await.unwrap();
        let podcast: Option<String> = cache.get("podcast:1").await.unwrap();
        assert!(news.is_none());
        assert!(podcast.is_some());
    }

    #[test]
    fn test_pattern_matching() {
        assert!(MemoryCache::pattern_matches("news:*", "news:123"));
        assert!(MemoryCache::pattern_matches("news:?", "news:1"));
        assert!(!MemoryCache::pattern_matches("news:?", "news:12"));
        assert!(!MemoryCache::pattern_matches("news:*", "podcast:1"));
        assert!(MemoryCache::pattern_matches("*", "anything"));
    }
}
