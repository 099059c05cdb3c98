use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::{CacheStore, IndexDefinition, SearchQuery};
use crate::{CacheError, CacheResult};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-memory cache store for tests and single-process runs.
///
/// Expiry uses `tokio::time`, so paused-clock tests can advance past TTLs.
/// Expired entries are dropped when read and swept on every write, so keys
/// that are written once and never read again do not accumulate.
#[derive(Clone, Default)]
pub struct InMemoryCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    indexes: Arc<RwLock<HashMap<String, IndexDefinition>>>,
}

impl InMemoryCache {
    /// Creates a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| e.is_live(now))
            .count()
    }

    /// Returns true if there are no live entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Returns the remaining TTL of `key`, if it is live.
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.expires_at - now)
    }

    /// Removes all entries and indexes.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
        self.indexes.write().await.clear();
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired: evict so the map does not grow without bound.
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| !e.is_live(now)) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &Value, ttl: Duration) -> CacheResult<()> {
        let now = Instant::now();
        let entry = CacheEntry {
            value: value.clone(),
            expires_at: now + ttl,
        };

        let mut entries = self.entries.write().await;
        entries.retain(|_, e| e.is_live(now));
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> CacheResult<bool> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        match entries.get_mut(key) {
            Some(entry) if entry.is_live(now) => {
                entry.expires_at = now + ttl;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn create_index(&self, index: &IndexDefinition) -> CacheResult<()> {
        self.indexes
            .write()
            .await
            .entry(index.name.clone())
            .or_insert_with(|| index.clone());
        Ok(())
    }

    async fn search(&self, index: &str, query: &SearchQuery) -> CacheResult<Vec<Value>> {
        let definition = self
            .indexes
            .read()
            .await
            .get(index)
            .cloned()
            .ok_or_else(|| CacheError::UnknownIndex(index.to_string()))?;

        let now = Instant::now();
        let entries = self.entries.read().await;
        let mut matches: Vec<(&String, &Value)> = entries
            .iter()
            .filter(|(key, entry)| key.starts_with(&definition.prefix) && entry.is_live(now))
            .filter(|(_, entry)| query.matches(&definition, &entry.value))
            .map(|(key, entry)| (key, &entry.value))
            .collect();
        matches.sort_by(|a, b| a.0.cmp(b.0));

        Ok(matches
            .into_iter()
            .skip(query.effective_offset())
            .take(query.effective_limit())
            .map(|(_, value)| value.clone())
            .collect())
    }
}
