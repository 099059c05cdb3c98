//! Cache-aside decorator over a durable [`Repository`].
//!
//! The inner repository is the source of truth. Reads go through the cache
//! and populate it on a miss; writes hit the store first and refresh the
//! cache only once the store accepted them. Cache failures on these
//! best-effort paths are logged and counted, never returned.

use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;

use crate::{CacheStore, Entity, Repository, Result};

/// Default time-to-live of cached entities.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Expiry policy applied to every cache write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub ttl: Duration,
}

impl CachePolicy {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

/// Key prefix shared by all cached entities of type `E` (e.g. `order:`).
pub fn cache_prefix<E: Entity>() -> String {
    format!("{}:", E::entity_type().to_lowercase())
}

/// Cache key of the entity `id` (e.g. `order:OR001`).
pub fn cache_key<E: Entity>(id: &str) -> String {
    format!("{}{id}", cache_prefix::<E>())
}

/// A [`Repository`] that reads through and writes behind a [`CacheStore`].
pub struct CachedRepository<E, R, C> {
    inner: R,
    cache: C,
    policy: CachePolicy,
    _entity: PhantomData<fn() -> E>,
}

impl<E, R: Clone, C: Clone> Clone for CachedRepository<E, R, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            cache: self.cache.clone(),
            policy: self.policy,
            _entity: PhantomData,
        }
    }
}

impl<E, R, C> CachedRepository<E, R, C>
where
    E: Entity,
    R: Repository<E>,
    C: CacheStore,
{
    /// Wraps `inner` with `cache`, expiring entries per `policy`.
    pub fn new(inner: R, cache: C, policy: CachePolicy) -> Self {
        Self {
            inner,
            cache,
            policy,
            _entity: PhantomData,
        }
    }

    /// Returns the durable repository.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Returns the cache store.
    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    async fn lookup(&self, key: &str) -> Option<E> {
        let value = match self.cache.get(key).await {
            Ok(Some(value)) => value,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cache read failed, falling back to store");
                metrics::counter!("cache_errors_total", "entity" => E::entity_type(), "op" => "get")
                    .increment(1);
                return None;
            }
        };

        match serde_json::from_value(value) {
            Ok(entity) => Some(entity),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "discarding undecodable cache entry");
                metrics::counter!("cache_errors_total", "entity" => E::entity_type(), "op" => "decode")
                    .increment(1);
                None
            }
        }
    }

    async fn populate(&self, entity: &E) {
        let key = cache_key::<E>(entity.id());
        let value = match serde_json::to_value(entity) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to encode entity for cache");
                metrics::counter!("cache_errors_total", "entity" => E::entity_type(), "op" => "encode")
                    .increment(1);
                return;
            }
        };

        if let Err(e) = self.cache.set(&key, &value, self.policy.ttl).await {
            tracing::warn!(key = %key, error = %e, "cache write failed");
            metrics::counter!("cache_errors_total", "entity" => E::entity_type(), "op" => "set")
                .increment(1);
        }
    }

    async fn evict(&self, id: &str) {
        let key = cache_key::<E>(id);
        if let Err(e) = self.cache.delete(&key).await {
            tracing::warn!(key = %key, error = %e, "cache eviction failed, entry expires with its TTL");
            metrics::counter!("cache_errors_total", "entity" => E::entity_type(), "op" => "delete")
                .increment(1);
        }
    }
}

#[async_trait]
impl<E, R, C> Repository<E> for CachedRepository<E, R, C>
where
    E: Entity,
    R: Repository<E>,
    C: CacheStore,
{
    async fn find_by_id(&self, id: &str) -> Result<E> {
        let key = cache_key::<E>(id);
        if let Some(entity) = self.lookup(&key).await {
            tracing::debug!(key = %key, "cache hit");
            metrics::counter!("cache_hits_total", "entity" => E::entity_type()).increment(1);
            return Ok(entity);
        }

        tracing::debug!(key = %key, "cache miss");
        metrics::counter!("cache_misses_total", "entity" => E::entity_type()).increment(1);

        let entity = self.inner.find_by_id(id).await?;
        self.populate(&entity).await;
        Ok(entity)
    }

    async fn find_all(&self) -> Result<Vec<E>> {
        let entities = self.inner.find_all().await?;
        join_all(entities.iter().map(|entity| self.populate(entity))).await;
        Ok(entities)
    }

    async fn save(&self, entity: &E) -> Result<()> {
        self.inner.save(entity).await?;
        self.populate(entity).await;
        Ok(())
    }

    async fn update(&self, entity: &E) -> Result<()> {
        self.inner.update(entity).await?;
        self.populate(entity).await;
        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        self.inner.delete_by_id(id).await?;
        self.evict(id).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Order {
        id: String,
    }

    impl Entity for Order {
        fn entity_type() -> &'static str {
            "Order"
        }

        fn table_name() -> &'static str {
            "orders"
        }

        fn id(&self) -> &str {
            &self.id
        }
    }

    #[test]
    fn keys_use_lowercase_entity_type() {
        assert_eq!(cache_prefix::<Order>(), "order:");
        assert_eq!(cache_key::<Order>("OR001"), "order:OR001");
    }

    #[test]
    fn default_policy_is_one_hour() {
        assert_eq!(CachePolicy::default().ttl, Duration::from_secs(3600));
        assert_eq!(CachePolicy::from_secs(5).ttl, Duration::from_secs(5));
    }
}
