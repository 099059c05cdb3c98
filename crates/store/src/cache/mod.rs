//! Cache stores holding JSON documents with per-key TTLs.

mod memory;
mod query;
mod redis_cache;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::CacheResult;

pub use self::memory::InMemoryCache;
pub use self::query::{
    DEFAULT_SEARCH_LIMIT, FieldKind, IndexDefinition, IndexField, MAX_SEARCH_LIMIT,
    MAX_SEARCH_WINDOW, SearchFilter, SearchQuery,
};
pub use self::redis_cache::RedisCache;

/// Key/value cache of JSON documents with TTL expiry and secondary-index
/// search.
///
/// Keys are plain strings; expired entries behave as if absent.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the document stored under `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> CacheResult<Option<Value>>;

    /// Stores `value` under `key`, expiring after `ttl`.
    async fn set(&self, key: &str, value: &Value, ttl: Duration) -> CacheResult<()>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Resets the TTL of `key`. Returns false if the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> CacheResult<bool>;

    /// Declares a search index over documents whose keys start with the
    /// definition's prefix. Re-creating an existing index is a no-op.
    async fn create_index(&self, index: &IndexDefinition) -> CacheResult<()>;

    /// Returns documents of `index` matching every filter of `query`.
    async fn search(&self, index: &str, query: &SearchQuery) -> CacheResult<Vec<Value>>;
}

#[async_trait]
impl<T: CacheStore + ?Sized> CacheStore for Arc<T> {
    async fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &Value, ttl: Duration) -> CacheResult<()> {
        (**self).set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        (**self).delete(key).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> CacheResult<bool> {
        (**self).expire(key, ttl).await
    }

    async fn create_index(&self, index: &IndexDefinition) -> CacheResult<()> {
        (**self).create_index(index).await
    }

    async fn search(&self, index: &str, query: &SearchQuery) -> CacheResult<Vec<Value>> {
        (**self).search(index, query).await
    }
}
