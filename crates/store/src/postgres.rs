use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{Entity, Repository, RepositoryError, Result};

/// PostgreSQL-backed repository.
///
/// Each entity type lives in its own table (`E::table_name()`) with the
/// columns `id TEXT PRIMARY KEY`, `document JSONB`, `created_at` and
/// `updated_at`. See `migrations/` for the schema.
pub struct PostgresRepository<E: Entity> {
    pool: PgPool,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for PostgresRepository<E> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

impl<E: Entity> PostgresRepository<E> {
    /// Creates a new PostgreSQL repository.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_entity(row: PgRow) -> Result<E> {
        let document: serde_json::Value = row.try_get("document")?;
        Ok(serde_json::from_value(document)?)
    }
}

#[async_trait]
impl<E: Entity> Repository<E> for PostgresRepository<E> {
    async fn find_by_id(&self, id: &str) -> Result<E> {
        let sql = format!("SELECT document FROM {} WHERE id = $1", E::table_name());
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::not_found(E::entity_type(), id))?;

        Self::row_to_entity(row)
    }

    async fn find_all(&self) -> Result<Vec<E>> {
        let sql = format!(
            "SELECT document FROM {} ORDER BY created_at ASC, id ASC",
            E::table_name()
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.into_iter().map(Self::row_to_entity).collect()
    }

    async fn save(&self, entity: &E) -> Result<()> {
        let document = serde_json::to_value(entity)?;
        let sql = format!(
            "INSERT INTO {} (id, document) VALUES ($1, $2)",
            E::table_name()
        );

        sqlx::query(&sql)
            .bind(entity.id())
            .bind(document)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return RepositoryError::already_exists(E::entity_type(), entity.id());
                }
                RepositoryError::Database(e)
            })?;

        Ok(())
    }

    async fn update(&self, entity: &E) -> Result<()> {
        let document = serde_json::to_value(entity)?;
        let sql = format!(
            "UPDATE {} SET document = $2, updated_at = now() WHERE id = $1",
            E::table_name()
        );

        let result = sqlx::query(&sql)
            .bind(entity.id())
            .bind(document)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found(E::entity_type(), entity.id()));
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE id = $1", E::table_name());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found(E::entity_type(), id));
        }
        Ok(())
    }
}
