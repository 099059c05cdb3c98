//! Storage layer for the order service.
//!
//! - [`Repository`]: durable CRUD contract with in-memory and PostgreSQL
//!   implementations
//! - [`CacheStore`]: key/value cache with TTLs and secondary-index search,
//!   with in-memory and Redis implementations
//! - [`CachedRepository`]: cache-aside decorator combining the two

pub mod cache;
pub mod cached;
pub mod entity;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod repository;

pub use cache::{
    CacheStore, DEFAULT_SEARCH_LIMIT, FieldKind, InMemoryCache, IndexDefinition, IndexField,
    MAX_SEARCH_LIMIT, MAX_SEARCH_WINDOW, RedisCache, SearchFilter, SearchQuery,
};
pub use cached::{CachePolicy, CachedRepository, DEFAULT_CACHE_TTL, cache_key, cache_prefix};
pub use entity::Entity;
pub use error::{CacheError, CacheResult, RepositoryError, Result};
pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;
pub use repository::Repository;
