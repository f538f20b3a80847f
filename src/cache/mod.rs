//! Cache layer
//!
//! Caching abstraction for published content and renderer lookups.
//! It supports:
//! - In-memory cache (moka) - default, for single-instance deployment
//! - Redis cache - optional, for distributed deployment
//!
//! The cache driver is selected based on configuration.

pub mod memory;
#[cfg(feature = "redis-cache")]
pub mod redis;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{CacheConfig, CacheDriver};

/// Cache layer trait
///
/// Note: due to the generic methods this trait cannot be used as a trait
/// object (`dyn CacheLayer`); use the `Cache` enum for runtime
/// polymorphism.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Set a value in cache with TTL
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()>;

    /// Delete a value from cache
    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete all values matching a glob-style pattern
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;

    /// Clear all cache entries
    async fn clear(&self) -> Result<()>;
}

pub use memory::MemoryCache;
#[cfg(feature = "redis-cache")]
pub use redis::RedisCache;

/// Unified cache enum for runtime polymorphism
#[derive(Debug)]
pub enum Cache {
    /// In-memory cache using moka
    Memory(MemoryCache),
    /// Redis cache for distributed deployment
    #[cfg(feature = "redis-cache")]
    Redis(RedisCache),
}

#[async_trait]
impl CacheLayer for Cache {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        match self {
            Cache::Memory(cache) => cache.get(key).await,
            #[cfg(feature = "redis-cache")]
            Cache::Redis(cache) => cache.get(key).await,
        }
    }

    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        match self {
            Cache::Memory(cache) => cache.set(key, value, ttl).await,
            #[cfg(feature = "redis-cache")]
            Cache::Redis(cache) => cache.set(key, value, ttl).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match self {
            Cache::Memory(cache) => cache.delete(key).await,
            #[cfg(feature = "redis-cache")]
            Cache::Redis(cache) => cache.delete(key).await,
        }
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<()> {
        match self {
            Cache::Memory(cache) => cache.delete_pattern(pattern).await,
            #[cfg(feature = "redis-cache")]
            Cache::Redis(cache) => cache.delete_pattern(pattern).await,
        }
    }

    async fn clear(&self) -> Result<()> {
        match self {
            Cache::Memory(cache) => cache.clear().await,
            #[cfg(feature = "redis-cache")]
            Cache::Redis(cache) => cache.clear().await,
        }
    }
}

/// Create a cache instance based on configuration.
///
/// - `CacheDriver::Memory` - in-memory cache using moka
/// - `CacheDriver::Redis` - Redis cache (requires the `redis-cache`
///   feature; falls back to memory with a warning otherwise)
pub async fn create_cache(config: &CacheConfig) -> Result<Arc<Cache>> {
    let ttl = Duration::from_secs(config.ttl_seconds);

    match config.driver {
        CacheDriver::Memory => Ok(Arc::new(Cache::Memory(
            MemoryCache::with_capacity_and_ttl(memory::DEFAULT_MAX_CAPACITY, ttl),
        ))),
        CacheDriver::Redis => {
            #[cfg(feature = "redis-cache")]
            {
                let url = config
                    .redis_url
                    .as_deref()
                    .unwrap_or("redis://127.0.0.1:6379");
                let cache = RedisCache::with_ttl(url, ttl).await?;
                Ok(Arc::new(Cache::Redis(cache)))
            }
            #[cfg(not(feature = "redis-cache"))]
            {
                tracing::warn!(
                    "Redis cache requested but the redis-cache feature is disabled; using memory cache"
                );
                Ok(Arc::new(Cache::Memory(MemoryCache::with_capacity_and_ttl(
                    memory::DEFAULT_MAX_CAPACITY,
                    ttl,
                ))))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_memory_cache() {
        let config = CacheConfig::default();
        let cache = create_cache(&config).await.expect("Failed to create cache");

        cache
            .set("key", &"value".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        let value: Option<String> = cache.get("key").await.unwrap();
        assert_eq!(value, Some("value".to_string()));
    }
}
