//! Operations on the `worlds` table.

use std::collections::BTreeMap;
use std::sync::Mutex;

use rpgkernel_types::{World, WorldId};
use sqlx::PgPool;

use crate::error::DbError;

/// Typed access to world records, backed by either Postgres or memory.
pub trait WorldRepository {
    /// Insert a newly generated world.
    ///
    /// # Errors
    /// Returns [`DbError::Postgres`] (Postgres backend only) if the insert fails.
    async fn create(&self, world: &World) -> Result<(), DbError>;

    /// Fetch a world by id.
    ///
    /// # Errors
    /// Returns [`DbError::NotFound`] if no world with `id` exists.
    async fn get(&self, id: WorldId) -> Result<World, DbError>;

    /// Persist changes to an existing world (e.g. `updated_at`, `environment`).
    ///
    /// # Errors
    /// Returns [`DbError::NotFound`] if no world with `world.id` exists.
    async fn update(&self, world: &World) -> Result<(), DbError>;
}

/// A row from the `worlds` table, decoded 1:1 into [`World`].
#[derive(Debug, Clone, sqlx::FromRow)]
struct WorldRow {
    id: uuid::Uuid,
    name: String,
    seed: String,
    width: i32,
    height: i32,
    environment: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<WorldRow> for World {
    type Error = DbError;

    fn try_from(row: WorldRow) -> Result<Self, DbError> {
        Ok(Self {
            id: WorldId::from(row.id),
            name: row.name,
            seed: row.seed,
            width: u32::try_from(row.width).map_err(|e| DbError::MalformedRow { table: "worlds", reason: e.to_string() })?,
            height: u32::try_from(row.height).map_err(|e| DbError::MalformedRow { table: "worlds", reason: e.to_string() })?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            environment: row.environment,
        })
    }
}

/// Postgres-backed world repository.
pub struct PgWorldRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PgWorldRepository<'a> {
    /// Bind a repository to a connection pool.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl WorldRepository for PgWorldRepository<'_> {
    async fn create(&self, world: &World) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO worlds (id, name, seed, width, height, environment, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(world.id.into_inner())
        .bind(&world.name)
        .bind(&world.seed)
        .bind(i32::try_from(world.width).unwrap_or(i32::MAX))
        .bind(i32::try_from(world.height).unwrap_or(i32::MAX))
        .bind(&world.environment)
        .bind(world.created_at)
        .bind(world.updated_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: WorldId) -> Result<World, DbError> {
        let row = sqlx::query_as::<_, WorldRow>("SELECT * FROM worlds WHERE id = $1")
            .bind(id.into_inner())
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound { entity: "world", id: id.to_string() })?;
        row.try_into()
    }

    async fn update(&self, world: &World) -> Result<(), DbError> {
        let result = sqlx::query(
            "UPDATE worlds SET name = $2, environment = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(world.id.into_inner())
        .bind(&world.name)
        .bind(&world.environment)
        .bind(world.updated_at)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound { entity: "world", id: world.id.to_string() });
        }
        Ok(())
    }
}

/// In-memory world repository, used when `NODE_ENV=test`.
#[derive(Default)]
pub struct InMemoryWorldRepository {
    rows: Mutex<BTreeMap<WorldId, World>>,
}

impl WorldRepository for InMemoryWorldRepository {
    async fn create(&self, world: &World) -> Result<(), DbError> {
        let mut rows = self.rows.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        rows.insert(world.id, world.clone());
        Ok(())
    }

    async fn get(&self, id: WorldId) -> Result<World, DbError> {
        let rows = self.rows.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        rows.get(&id)
            .cloned()
            .ok_or_else(|| DbError::NotFound { entity: "world", id: id.to_string() })
    }

    async fn update(&self, world: &World) -> Result<(), DbError> {
        let mut rows = self.rows.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if !rows.contains_key(&world.id) {
            return Err(DbError::NotFound { entity: "world", id: world.id.to_string() });
        }
        rows.insert(world.id, world.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_world() -> World {
        World {
            id: WorldId::new(),
            name: "Test World".to_owned(),
            seed: "seed-1".to_owned(),
            width: 50,
            height: 50,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            environment: None,
        }
    }

    #[tokio::test]
    async fn in_memory_roundtrips_a_world() {
        let repo = InMemoryWorldRepository::default();
        let world = make_world();
        repo.create(&world).await.expect("create");
        let fetched = repo.get(world.id).await.expect("get");
        assert_eq!(fetched, world);
    }

    #[tokio::test]
    async fn in_memory_get_missing_world_fails() {
        let repo = InMemoryWorldRepository::default();
        assert!(repo.get(WorldId::new()).await.is_err());
    }

    #[tokio::test]
    async fn in_memory_update_missing_world_fails() {
        let repo = InMemoryWorldRepository::default();
        assert!(repo.update(&make_world()).await.is_err());
    }
}
