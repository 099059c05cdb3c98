use std::sync::Arc;

use async_trait::async_trait;

use crate::{Entity, Result};

/// Durable CRUD contract for entities.
///
/// Expected conditions (missing or duplicate ids) are reported as
/// [`RepositoryError`](crate::RepositoryError) variants rather than panics.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// Loads an entity by id.
    ///
    /// Fails with `NotFound` if no entity has this id.
    async fn find_by_id(&self, id: &str) -> Result<E>;

    /// Loads every stored entity.
    async fn find_all(&self) -> Result<Vec<E>>;

    /// Persists a new entity.
    ///
    /// Fails with `AlreadyExists` if the id is taken.
    async fn save(&self, entity: &E) -> Result<()>;

    /// Replaces an existing entity.
    ///
    /// Fails with `NotFound` if the id is unknown.
    async fn update(&self, entity: &E) -> Result<()>;

    /// Removes an entity by id.
    ///
    /// Fails with `NotFound` if the id is unknown.
    async fn delete_by_id(&self, id: &str) -> Result<()>;
}

#[async_trait]
impl<E, T> Repository<E> for Arc<T>
where
    E: Entity,
    T: Repository<E> + ?Sized,
{
    async fn find_by_id(&self, id: &str) -> Result<E> {
        (**self).find_by_id(id).await
    }

    async fn find_all(&self) -> Result<Vec<E>> {
        (**self).find_all().await
    }

    async fn save(&self, entity: &E) -> Result<()> {
        (**self).save(entity).await
    }

    async fn update(&self, entity: &E) -> Result<()> {
        (**self).update(entity).await
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        (**self).delete_by_id(id).await
    }
}
