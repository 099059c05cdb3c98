use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{Entity, Repository, RepositoryError, Result};

/// In-memory repository implementation for tests and local runs.
///
/// Entities are kept ordered by id so `find_all` is deterministic.
#[derive(Clone)]
pub struct InMemoryRepository<E: Entity> {
    entities: Arc<RwLock<BTreeMap<String, E>>>,
}

impl<E: Entity> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self {
            entities: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }
}

impl<E: Entity> InMemoryRepository<E> {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entities.
    pub async fn len(&self) -> usize {
        self.entities.read().await.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.entities.read().await.is_empty()
    }

    /// Removes all entities.
    pub async fn clear(&self) {
        self.entities.write().await.clear();
    }
}

#[async_trait]
impl<E: Entity> Repository<E> for InMemoryRepository<E> {
    async fn find_by_id(&self, id: &str) -> Result<E> {
        self.entities
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(E::entity_type(), id))
    }

    async fn find_all(&self) -> Result<Vec<E>> {
        Ok(self.entities.read().await.values().cloned().collect())
    }

    async fn save(&self, entity: &E) -> Result<()> {
        let mut entities = self.entities.write().await;
        if entities.contains_key(entity.id()) {
            return Err(RepositoryError::already_exists(
                E::entity_type(),
                entity.id(),
            ));
        }
        entities.insert(entity.id().to_string(), entity.clone());
        Ok(())
    }

    async fn update(&self, entity: &E) -> Result<()> {
        let mut entities = self.entities.write().await;
        match entities.get_mut(entity.id()) {
            Some(existing) => {
                *existing = entity.clone();
                Ok(())
            }
            None => Err(RepositoryError::not_found(E::entity_type(), entity.id())),
        }
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        self.entities
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::not_found(E::entity_type(), id))
    }
}
