//! Cache-aside behaviour of `CachedRepository` over in-memory backends.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use store::{
    CacheError, CachePolicy, CacheResult, CacheStore, CachedRepository, Entity, InMemoryCache,
    InMemoryRepository, IndexDefinition, Repository, RepositoryError, Result, SearchQuery,
    cache_key,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Parcel {
    id: String,
    weight: u32,
}

impl Entity for Parcel {
    fn entity_type() -> &'static str {
        "Parcel"
    }

    fn table_name() -> &'static str {
        "parcels"
    }

    fn id(&self) -> &str {
        &self.id
    }
}

fn parcel(id: &str, weight: u32) -> Parcel {
    Parcel {
        id: id.to_string(),
        weight,
    }
}

/// Counts durable reads on top of an in-memory repository.
#[derive(Clone, Default)]
struct CountingRepository {
    inner: InMemoryRepository<Parcel>,
    reads: Arc<AtomicUsize>,
}

impl CountingRepository {
    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Repository<Parcel> for CountingRepository {
    async fn find_by_id(&self, id: &str) -> Result<Parcel> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_id(id).await
    }

    async fn find_all(&self) -> Result<Vec<Parcel>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.find_all().await
    }

    async fn save(&self, entity: &Parcel) -> Result<()> {
        self.inner.save(entity).await
    }

    async fn update(&self, entity: &Parcel) -> Result<()> {
        self.inner.update(entity).await
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        self.inner.delete_by_id(id).await
    }
}

/// Store whose writes always fail.
struct FailingRepository;

#[async_trait]
impl Repository<Parcel> for FailingRepository {
    async fn find_by_id(&self, id: &str) -> Result<Parcel> {
        Err(RepositoryError::not_found("Parcel", id))
    }

    async fn find_all(&self) -> Result<Vec<Parcel>> {
        Ok(Vec::new())
    }

    async fn save(&self, entity: &Parcel) -> Result<()> {
        Err(RepositoryError::Database(sqlx::Error::Protocol(format!(
            "write rejected for {}",
            entity.id
        ))))
    }

    async fn update(&self, entity: &Parcel) -> Result<()> {
        Err(RepositoryError::not_found("Parcel", &entity.id))
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        Err(RepositoryError::not_found("Parcel", id))
    }
}

/// Cache that is unreachable for every operation.
struct BrokenCache;

fn unreachable_cache() -> CacheError {
    CacheError::UnexpectedReply("connection refused".to_string())
}

#[async_trait]
impl CacheStore for BrokenCache {
    async fn get(&self, _key: &str) -> CacheResult<Option<Value>> {
        Err(unreachable_cache())
    }

    async fn set(&self, _key: &str, _value: &Value, _ttl: Duration) -> CacheResult<()> {
        Err(unreachable_cache())
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Err(unreachable_cache())
    }

    async fn expire(&self, _key: &str, _ttl: Duration) -> CacheResult<bool> {
        Err(unreachable_cache())
    }

    async fn create_index(&self, _index: &IndexDefinition) -> CacheResult<()> {
        Err(unreachable_cache())
    }

    async fn search(&self, _index: &str, _query: &SearchQuery) -> CacheResult<Vec<Value>> {
        Err(unreachable_cache())
    }
}

type Cached = CachedRepository<Parcel, CountingRepository, InMemoryCache>;

fn cached() -> (Cached, CountingRepository, InMemoryCache) {
    let store = CountingRepository::default();
    let cache = InMemoryCache::new();
    let repo = CachedRepository::new(store.clone(), cache.clone(), CachePolicy::from_secs(60));
    (repo, store, cache)
}

#[tokio::test]
async fn miss_reads_store_once_then_hits_cache() {
    let (repo, store, cache) = cached();
    store.inner.save(&parcel("X", 3)).await.unwrap();

    let first = repo.find_by_id("X").await.unwrap();
    assert_eq!(store.reads(), 1);
    assert!(cache.get(&cache_key::<Parcel>("X")).await.unwrap().is_some());

    let second = repo.find_by_id("X").await.unwrap();
    assert_eq!(store.reads(), 1);
    assert_eq!(first, second);
}

#[tokio::test]
async fn hit_serves_cached_value_without_store_read() {
    let (repo, store, cache) = cached();
    cache
        .set(
            &cache_key::<Parcel>("X"),
            &json!({"id": "X", "weight": 9}),
            Duration::from_secs(60),
        )
        .await
        .unwrap();

    let found = repo.find_by_id("X").await.unwrap();
    assert_eq!(found, parcel("X", 9));
    assert_eq!(store.reads(), 0);
}

#[tokio::test]
async fn missing_entity_is_not_cached() {
    let (repo, store, cache) = cached();

    let result = repo.find_by_id("nope").await;
    assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
    assert_eq!(store.reads(), 1);
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn undecodable_cache_entry_falls_back_to_store() {
    let (repo, store, cache) = cached();
    store.inner.save(&parcel("X", 3)).await.unwrap();
    cache
        .set(
            &cache_key::<Parcel>("X"),
            &json!({"unexpected": true}),
            Duration::from_secs(60),
        )
        .await
        .unwrap();

    let found = repo.find_by_id("X").await.unwrap();
    assert_eq!(found, parcel("X", 3));
    assert_eq!(store.reads(), 1);

    // The store value replaced the bad entry.
    let cached = cache.get(&cache_key::<Parcel>("X")).await.unwrap();
    assert_eq!(cached, Some(json!({"id": "X", "weight": 3})));
}

#[tokio::test]
async fn save_writes_store_then_cache() {
    let (repo, store, cache) = cached();

    repo.save(&parcel("A", 1)).await.unwrap();

    assert_eq!(store.inner.len().await, 1);
    let cached = cache.get(&cache_key::<Parcel>("A")).await.unwrap();
    assert_eq!(cached, Some(json!({"id": "A", "weight": 1})));
}

#[tokio::test]
async fn update_refreshes_cache_entry() {
    let (repo, _store, cache) = cached();
    repo.save(&parcel("A", 1)).await.unwrap();

    repo.update(&parcel("A", 2)).await.unwrap();

    let cached = cache.get(&cache_key::<Parcel>("A")).await.unwrap();
    assert_eq!(cached, Some(json!({"id": "A", "weight": 2})));
}

#[tokio::test]
async fn failed_save_leaves_cache_untouched() {
    let cache = InMemoryCache::new();
    let repo = CachedRepository::new(FailingRepository, cache.clone(), CachePolicy::default());

    let result = repo.save(&parcel("A", 1)).await;

    assert!(matches!(result, Err(RepositoryError::Database(_))));
    assert!(cache.get(&cache_key::<Parcel>("A")).await.unwrap().is_none());
}

#[tokio::test]
async fn failed_update_keeps_previous_cache_entry() {
    let cache = InMemoryCache::new();
    let key = cache_key::<Parcel>("A");
    let previous = json!({"id": "A", "weight": 1});
    cache
        .set(&key, &previous, Duration::from_secs(60))
        .await
        .unwrap();
    let repo = CachedRepository::new(FailingRepository, cache.clone(), CachePolicy::default());

    let result = repo.update(&parcel("A", 2)).await;

    assert!(result.unwrap_err().is_not_found());
    assert_eq!(cache.get(&key).await.unwrap(), Some(previous));
}

#[tokio::test]
async fn delete_evicts_cache_entry() {
    let (repo, store, cache) = cached();
    repo.save(&parcel("A", 1)).await.unwrap();

    repo.delete_by_id("A").await.unwrap();

    assert!(store.inner.is_empty().await);
    assert!(cache.get(&cache_key::<Parcel>("A")).await.unwrap().is_none());
}

#[tokio::test]
async fn failed_delete_keeps_cache_entry() {
    let cache = InMemoryCache::new();
    let key = cache_key::<Parcel>("A");
    cache
        .set(&key, &json!({"id": "A", "weight": 1}), Duration::from_secs(60))
        .await
        .unwrap();
    let repo = CachedRepository::new(FailingRepository, cache.clone(), CachePolicy::default());

    assert!(repo.delete_by_id("A").await.is_err());
    assert!(cache.get(&key).await.unwrap().is_some());
}

#[tokio::test]
async fn find_all_bypasses_cache_and_backfills() {
    let (repo, store, cache) = cached();
    store.inner.save(&parcel("A", 1)).await.unwrap();
    store.inner.save(&parcel("B", 2)).await.unwrap();
    // A stale cache entry must not leak into find_all.
    cache
        .set(
            &cache_key::<Parcel>("A"),
            &json!({"id": "A", "weight": 100}),
            Duration::from_secs(60),
        )
        .await
        .unwrap();

    let all = repo.find_all().await.unwrap();

    assert_eq!(all, vec![parcel("A", 1), parcel("B", 2)]);
    assert_eq!(store.reads(), 1);
    assert_eq!(cache.len().await, 2);
    assert_eq!(
        cache.get(&cache_key::<Parcel>("A")).await.unwrap(),
        Some(json!({"id": "A", "weight": 1}))
    );
}

#[tokio::test]
async fn broken_cache_does_not_fail_operations() {
    let store = CountingRepository::default();
    let repo = CachedRepository::new(store.clone(), BrokenCache, CachePolicy::default());

    repo.save(&parcel("A", 1)).await.unwrap();
    assert_eq!(repo.find_by_id("A").await.unwrap(), parcel("A", 1));
    assert_eq!(repo.find_by_id("A").await.unwrap(), parcel("A", 1));
    assert_eq!(store.reads(), 2);

    repo.update(&parcel("A", 2)).await.unwrap();
    assert_eq!(repo.find_all().await.unwrap(), vec![parcel("A", 2)]);
    repo.delete_by_id("A").await.unwrap();
    assert!(store.inner.is_empty().await);
}

#[tokio::test]
async fn shared_repository_through_arc() {
    let (repo, store, _cache) = cached();
    let repo: Arc<dyn Repository<Parcel>> = Arc::new(repo);

    repo.save(&parcel("A", 1)).await.unwrap();
    assert_eq!(repo.find_by_id("A").await.unwrap(), parcel("A", 1));
    assert_eq!(store.reads(), 0);
}

#[tokio::test(start_paused = true)]
async fn expired_entry_triggers_store_read() {
    let (repo, store, _cache) = cached();
    store.inner.save(&parcel("X", 3)).await.unwrap();

    repo.find_by_id("X").await.unwrap();
    tokio::time::advance(Duration::from_secs(59)).await;
    repo.find_by_id("X").await.unwrap();
    assert_eq!(store.reads(), 1);

    tokio::time::advance(Duration::from_secs(1)).await;
    repo.find_by_id("X").await.unwrap();
    assert_eq!(store.reads(), 2);
}
