//! Shared application state and backend wiring.

use std::sync::Arc;

use domain::{Order, OrderSearch, OrderService, UseCaseError};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use store::{
    CacheError, CachePolicy, CacheStore, CachedRepository, InMemoryCache, InMemoryRepository,
    PostgresRepository, RedisCache, Repository, RepositoryError,
};
use thiserror::Error;

use crate::config::Config;

/// Durable store behind the cache.
pub type OrderStore = Arc<dyn Repository<Order>>;

/// Cache shared by the repository decorator and order search.
pub type OrderCache = Arc<dyn CacheStore>;

/// The repository the API runs its use cases against.
pub type OrderRepository = CachedRepository<Order, OrderStore, OrderCache>;

/// Names of the backends the server is running on, reported by `/health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Backends {
    pub store: &'static str,
    pub cache: &'static str,
}

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub order_service: OrderService<OrderRepository>,
    pub order_search: OrderSearch<OrderCache>,
    pub backends: Backends,
}

/// Errors raised while connecting to backends at startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to connect to Postgres: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to prepare the order store: {0}")]
    Repository(#[from] RepositoryError),

    #[error("failed to connect to Redis: {0}")]
    Cache(#[from] CacheError),

    #[error("failed to create the order search index: {0}")]
    Search(#[from] UseCaseError),
}

/// Wires the order service and search over the given backends.
pub fn create_state(
    store: OrderStore,
    cache: OrderCache,
    policy: CachePolicy,
    backends: Backends,
) -> Arc<AppState> {
    let repository = CachedRepository::new(store, cache.clone(), policy);

    Arc::new(AppState {
        order_service: OrderService::new(repository),
        order_search: OrderSearch::new(cache),
        backends,
    })
}

/// Creates state over an in-memory store and cache.
pub fn create_in_memory_state(policy: CachePolicy) -> Arc<AppState> {
    create_state(
        Arc::new(InMemoryRepository::<Order>::new()),
        Arc::new(InMemoryCache::new()),
        policy,
        Backends {
            store: "memory",
            cache: "memory",
        },
    )
}

/// Connects to the configured backends and prepares them for use.
///
/// Postgres is used when `DATABASE_URL` is set and Redis when `REDIS_URL`
/// is set; either falls back to its in-memory counterpart otherwise.
pub async fn connect(config: &Config) -> Result<Arc<AppState>, StartupError> {
    let (store, store_name) = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .connect(url)
                .await?;
            let repository = PostgresRepository::<Order>::new(pool);
            repository.run_migrations().await?;
            tracing::info!(max_connections = config.db_max_connections, "connected to Postgres");
            (Arc::new(repository) as OrderStore, "postgres")
        }
        None => {
            tracing::warn!("DATABASE_URL not set, orders are kept in memory");
            (
                Arc::new(InMemoryRepository::<Order>::new()) as OrderStore,
                "memory",
            )
        }
    };

    let (cache, cache_name) = match &config.redis_url {
        Some(url) => {
            let cache = RedisCache::connect(url, config.cache_key_prefix.clone()).await?;
            cache.ping().await?;
            tracing::info!(prefix = %cache.prefix(), "connected to Redis");
            (Arc::new(cache) as OrderCache, "redis")
        }
        None => {
            tracing::warn!("REDIS_URL not set, using the in-memory cache");
            (Arc::new(InMemoryCache::new()) as OrderCache, "memory")
        }
    };

    let state = create_state(
        store,
        cache,
        config.cache_policy(),
        Backends {
            store: store_name,
            cache: cache_name,
        },
    );
    state.order_search.ensure_index().await?;

    Ok(state)
}
