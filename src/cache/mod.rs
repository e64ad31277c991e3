//! # 缓存模块
//!
//! 统一的 TTL 键值缓存接口与内存实现

pub mod abstract_cache;
pub mod keys;

pub use abstract_cache::{CacheProvider, CacheStats, MemoryCache, create_cache};
pub use keys::CacheKey;
