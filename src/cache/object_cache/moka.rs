use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::cache::{CacheResult, ObjectCache};
use crate::config::AppConfig;
use crate::declare_object_cache_plugin;

declare_object_cache_plugin!("moka", MokaCacheWrapper);

#[derive(Clone)]
struct Entry {
    value: String,
    ttl: Duration,
}

/// 按条目记录的 TTL 过期
struct EntryExpiry;

impl Expiry<String, Entry> for EntryExpiry {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _now: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }
}

pub struct MokaCacheWrapper {
    inner: Cache<String, Entry>,
    default_ttl: Duration,
}

impl MokaCacheWrapper {
    pub fn new() -> Result<Self, String> {
        let config = AppConfig::get();
        Ok(Self::with_settings(
            config.cache.memory.max_capacity,
            config.cache.default_ttl,
        ))
    }

    pub fn with_settings(max_capacity: u64, default_ttl_secs: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryExpiry)
            .build();
        debug!(
            "MokaCacheWrapper initialized with max capacity: {}",
            max_capacity
        );
        Self {
            inner,
            default_ttl: Duration::from_secs(default_ttl_secs),
        }
    }
}

#[async_trait]
impl ObjectCache for MokaCacheWrapper {
    async fn get_raw(&self, key: &str) -> CacheResult<String> {
        match self.inner.get(key).await {
            Some(entry) => CacheResult::Found(entry.value),
            None => {
                debug!("Key not found in cache: {}", key);
                CacheResult::NotFound
            }
        }
    }

    async fn insert_raw(&self, key: String, value: String, ttl: u64) {
        let ttl = if ttl == 0 {
            self.default_ttl
        } else {
            Duration::from_secs(ttl)
        };
        self.inner.insert(key, Entry { value, ttl }).await;
    }

    async fn remove(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    async fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_get_remove() {
        let cache = MokaCacheWrapper::with_settings(100, 60);
        cache
            .insert_raw("user:7".to_string(), "{\"id\":7}".to_string(), 0)
            .await;
        assert_eq!(
            cache.get_raw("user:7").await,
            CacheResult::Found("{\"id\":7}".to_string())
        );
        cache.remove("user:7").await;
        assert_eq!(cache.get_raw("user:7").await, CacheResult::NotFound);
    }

    #[tokio::test]
    async fn test_json_helpers_drop_bad_entries() {
        let cache: Box<dyn ObjectCache> = Box::new(MokaCacheWrapper::with_settings(100, 60));
        cache
            .insert_raw("n".to_string(), "not json".to_string(), 0)
            .await;
        assert_eq!(cache.get_json::<Vec<i64>>("n").await, None);
        assert_eq!(cache.get_raw("n").await, CacheResult::NotFound);

        cache.insert_json("ids".to_string(), &vec![1_i64, 2], 0).await;
        assert_eq!(cache.get_json::<Vec<i64>>("ids").await, Some(vec![1, 2]));
    }
}
