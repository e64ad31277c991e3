//! # 缓存抽象层
//!
//! 提供统一的缓存接口与进程内内存实现

use crate::config::CacheConfig;
use crate::error::{DormError, Result};
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// 缓存项
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    expires_at: Option<Instant>,
}

impl<T> CacheEntry<T> {
    fn new(value: T, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|t| Instant::now() + t),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| Instant::now() > expires_at)
    }
}

/// 缓存抽象trait
#[async_trait]
pub trait CacheProvider: Send + Sync {
    /// 设置缓存值
    async fn set<T>(&self, key: &str, value: T, ttl: Option<Duration>) -> Result<()>
    where
        T: Serialize + Send;

    /// 获取缓存值
    async fn get<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send;

    /// 删除缓存值
    async fn delete(&self, key: &str) -> Result<()>;

    /// 检查键是否存在
    async fn exists(&self, key: &str) -> Result<bool>;

    /// 清空所有缓存
    async fn clear(&self) -> Result<()>;

    /// 获取缓存统计信息
    async fn stats(&self) -> Result<CacheStats>;
}

/// 缓存统计信息
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub total_keys: usize,
    pub hit_count: u64,
    pub miss_count: u64,
    pub cache_type: String,
}

impl CacheStats {
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            {
                self.hit_count as f64 / total as f64
            }
        }
    }
}

/// 内存缓存实现
pub struct MemoryCache {
    data: Arc<RwLock<HashMap<String, CacheEntry<Vec<u8>>>>>,
    max_entries: usize,
    hit_count: Arc<RwLock<u64>>,
    miss_count: Arc<RwLock<u64>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            max_entries,
            hit_count: Arc::new(RwLock::new(0)),
            miss_count: Arc::new(RwLock::new(0)),
        }
    }

    fn cleanup_expired(&self) {
        let mut data = self.data.write().unwrap();
        data.retain(|_, entry| !entry.is_expired());
    }

    fn ensure_capacity(&self) {
        let mut data = self.data.write().unwrap();
        if data.len() >= self.max_entries {
            // 先尝试移除过期项，没有则移除任意一项
            let mut to_remove = None;

            for (key, entry) in data.iter() {
                if entry.is_expired() {
                    to_remove = Some(key.clone());
                    break;
                }
            }

            if to_remove.is_none() {
                to_remove = data.keys().next().cloned();
            }

            if let Some(key) = to_remove {
                data.remove(&key);
            }
        }
    }
}

#[async_trait]
impl CacheProvider for MemoryCache {
    async fn set<T>(&self, key: &str, value: T, ttl: Option<Duration>) -> Result<()>
    where
        T: Serialize + Send,
    {
        let serialized = serde_json::to_vec(&value)
            .map_err(|e| DormError::cache_with_source("序列化缓存值失败", e))?;

        self.ensure_capacity();

        let entry = CacheEntry::new(serialized, ttl);
        let mut data = self.data.write().unwrap();
        data.insert(key.to_string(), entry);

        Ok(())
    }

    async fn get<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        self.cleanup_expired();

        let data = self.data.read().unwrap();
        if let Some(entry) = data.get(key) {
            if entry.is_expired() {
                *self.miss_count.write().unwrap() += 1;
                Ok(None)
            } else {
                *self.hit_count.write().unwrap() += 1;
                let value = serde_json::from_slice(&entry.value)
                    .map_err(|e| DormError::cache_with_source("反序列化缓存值失败", e))?;
                Ok(Some(value))
            }
        } else {
            *self.miss_count.write().unwrap() += 1;
            Ok(None)
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut data = self.data.write().unwrap();
        data.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.cleanup_expired();
        let data = self.data.read().unwrap();
        Ok(data.get(key).is_some_and(|entry| !entry.is_expired()))
    }

    async fn clear(&self) -> Result<()> {
        let mut data = self.data.write().unwrap();
        data.clear();
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats> {
        self.cleanup_expired();
        let data = self.data.read().unwrap();
        Ok(CacheStats {
            total_keys: data.len(),
            hit_count: *self.hit_count.read().unwrap(),
            miss_count: *self.miss_count.read().unwrap(),
            cache_type: "memory".to_string(),
        })
    }
}

/// 根据配置创建缓存实例
#[must_use]
pub fn create_cache(config: &CacheConfig) -> Arc<MemoryCache> {
    Arc::new(MemoryCache::new(config.memory_max_entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_delete_round_trip() {
        let cache = MemoryCache::new(16);
        cache.set("k1", "v1", None).await.unwrap();

        let value: Option<String> = cache.get("k1").await.unwrap();
        assert_eq!(value.as_deref(), Some("v1"));
        assert!(cache.exists("k1").await.unwrap());

        cache.delete("k1").await.unwrap();
        let value: Option<String> = cache.get("k1").await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn expired_entries_are_missed() {
        let cache = MemoryCache::new(16);
        cache
            .set("short", 42_u32, Some(Duration::from_millis(10)))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;

        let value: Option<u32> = cache.get("short").await.unwrap();
        assert!(value.is_none());
        assert!(!cache.exists("short").await.unwrap());
    }

    #[tokio::test]
    async fn capacity_is_bounded() {
        let cache = MemoryCache::new(2);
        cache.set("a", 1_u32, None).await.unwrap();
        cache.set("b", 2_u32, None).await.unwrap();
        cache.set("c", 3_u32, None).await.unwrap();

        let stats = cache.stats().await.unwrap();
        assert!(stats.total_keys <= 2);
    }

    #[tokio::test]
    async fn stats_track_hits_and_misses() {
        let cache = MemoryCache::new(16);
        cache.set("k", "v", None).await.unwrap();

        let _: Option<String> = cache.get("k").await.unwrap();
        let _: Option<String> = cache.get("absent").await.unwrap();

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }
}
