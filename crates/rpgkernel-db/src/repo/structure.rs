//! Operations on the `structures` table.

use std::collections::BTreeMap;
use std::sync::Mutex;

use rpgkernel_types::{Structure, StructureId, StructureType, WorldId};
use sqlx::PgPool;

use crate::error::DbError;

/// Typed access to structure records, backed by either Postgres or memory.
pub trait StructureRepository {
    /// Bulk-insert a world's placed structures.
    ///
    /// # Errors
    /// Returns [`DbError::Postgres`] (Postgres backend only) if any insert fails.
    async fn save_many(&self, structures: &[Structure]) -> Result<(), DbError>;

    /// List every structure belonging to a world.
    ///
    /// # Errors
    /// Returns [`DbError::Postgres`] (Postgres backend only) if the query fails.
    async fn list_by_world(&self, world_id: WorldId) -> Result<Vec<Structure>, DbError>;

    /// Fetch a single structure by id.
    ///
    /// # Errors
    /// Returns [`DbError::NotFound`] if no structure with `id` exists.
    async fn get(&self, id: StructureId) -> Result<Structure, DbError>;

    /// Persist a structure's new position (used by `MOVE_STRUCTURE` patch commands).
    ///
    /// # Errors
    /// Returns [`DbError::NotFound`] if no structure with `structure.id` exists.
    async fn update(&self, structure: &Structure) -> Result<(), DbError>;
}

fn structure_type_to_db(structure_type: StructureType) -> &'static str {
    match structure_type {
        StructureType::City => "city",
        StructureType::Town => "town",
        StructureType::Village => "village",
        StructureType::Castle => "castle",
        StructureType::Ruins => "ruins",
        StructureType::Dungeon => "dungeon",
        StructureType::Temple => "temple",
    }
}

fn structure_type_from_db(raw: &str) -> Result<StructureType, DbError> {
    match raw {
        "city" => Ok(StructureType::City),
        "town" => Ok(StructureType::Town),
        "village" => Ok(StructureType::Village),
        "castle" => Ok(StructureType::Castle),
        "ruins" => Ok(StructureType::Ruins),
        "dungeon" => Ok(StructureType::Dungeon),
        "temple" => Ok(StructureType::Temple),
        other => Err(DbError::MalformedRow { table: "structures", reason: format!("unknown structure_type {other:?}") }),
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct StructureRow {
    id: uuid::Uuid,
    world_id: uuid::Uuid,
    structure_type: String,
    x: i32,
    y: i32,
    name: String,
    population: Option<i32>,
}

impl TryFrom<StructureRow> for Structure {
    type Error = DbError;

    fn try_from(row: StructureRow) -> Result<Self, DbError> {
        let population = row
            .population
            .map(|p| u32::try_from(p).map_err(|e| DbError::MalformedRow { table: "structures", reason: e.to_string() }))
            .transpose()?;
        Ok(Self {
            id: StructureId::from(row.id),
            world_id: WorldId::from(row.world_id),
            structure_type: structure_type_from_db(&row.structure_type)?,
            x: row.x,
            y: row.y,
            name: row.name,
            population,
        })
    }
}

/// Postgres-backed structure repository.
pub struct PgStructureRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PgStructureRepository<'a> {
    /// Bind a repository to a connection pool.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl StructureRepository for PgStructureRepository<'_> {
    async fn save_many(&self, structures: &[Structure]) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        for structure in structures {
            sqlx::query(
                "INSERT INTO structures (id, world_id, structure_type, x, y, name, population)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(structure.id.into_inner())
            .bind(structure.world_id.into_inner())
            .bind(structure_type_to_db(structure.structure_type))
            .bind(structure.x)
            .bind(structure.y)
            .bind(&structure.name)
            .bind(structure.population.map(|p| i32::try_from(p).unwrap_or(i32::MAX)))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn list_by_world(&self, world_id: WorldId) -> Result<Vec<Structure>, DbError> {
        let rows = sqlx::query_as::<_, StructureRow>("SELECT * FROM structures WHERE world_id = $1")
            .bind(world_id.into_inner())
            .fetch_all(self.pool)
            .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn get(&self, id: StructureId) -> Result<Structure, DbError> {
        let row = sqlx::query_as::<_, StructureRow>("SELECT * FROM structures WHERE id = $1")
            .bind(id.into_inner())
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound { entity: "structure", id: id.to_string() })?;
        row.try_into()
    }

    async fn update(&self, structure: &Structure) -> Result<(), DbError> {
        let result = sqlx::query(
            "UPDATE structures SET x = $2, y = $3, name = $4, population = $5 WHERE id = $1",
        )
        .bind(structure.id.into_inner())
        .bind(structure.x)
        .bind(structure.y)
        .bind(&structure.name)
        .bind(structure.population.map(|p| i32::try_from(p).unwrap_or(i32::MAX)))
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound { entity: "structure", id: structure.id.to_string() });
        }
        Ok(())
    }
}

/// In-memory structure repository, used when `NODE_ENV=test`.
#[derive(Default)]
pub struct InMemoryStructureRepository {
    rows: Mutex<BTreeMap<StructureId, Structure>>,
}

impl StructureRepository for InMemoryStructureRepository {
    async fn save_many(&self, structures: &[Structure]) -> Result<(), DbError> {
        let mut rows = self.rows.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        for structure in structures {
            rows.insert(structure.id, structure.clone());
        }
        Ok(())
    }

    async fn list_by_world(&self, world_id: WorldId) -> Result<Vec<Structure>, DbError> {
        let rows = self.rows.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(rows.values().filter(|s| s.world_id == world_id).cloned().collect())
    }

    async fn get(&self, id: StructureId) -> Result<Structure, DbError> {
        let rows = self.rows.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        rows.get(&id).cloned().ok_or_else(|| DbError::NotFound { entity: "structure", id: id.to_string() })
    }

    async fn update(&self, structure: &Structure) -> Result<(), DbError> {
        let mut rows = self.rows.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if !rows.contains_key(&structure.id) {
            return Err(DbError::NotFound { entity: "structure", id: structure.id.to_string() });
        }
        rows.insert(structure.id, structure.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_structure(world_id: WorldId) -> Structure {
        Structure {
            id: StructureId::new(),
            world_id,
            structure_type: StructureType::Village,
            x: 3,
            y: 4,
            name: "Oakhollow".to_owned(),
            population: Some(200),
        }
    }

    #[tokio::test]
    async fn in_memory_roundtrips_and_lists_by_world() {
        let repo = InMemoryStructureRepository::default();
        let world_id = WorldId::new();
        let structure = make_structure(world_id);
        repo.save_many(&[structure.clone()]).await.expect("save");
        let fetched = repo.get(structure.id).await.expect("get");
        assert_eq!(fetched, structure);
        assert_eq!(repo.list_by_world(world_id).await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn in_memory_update_moves_structure() {
        let repo = InMemoryStructureRepository::default();
        let world_id = WorldId::new();
        let structure = make_structure(world_id);
        repo.save_many(&[structure.clone()]).await.expect("save");
        let mut moved = structure.clone();
        moved.x = 9;
        moved.y = 9;
        repo.update(&moved).await.expect("update");
        let fetched = repo.get(structure.id).await.expect("get");
        assert_eq!((fetched.x, fetched.y), (9, 9));
    }

    #[tokio::test]
    async fn in_memory_update_missing_structure_fails() {
        let repo = InMemoryStructureRepository::default();
        assert!(repo.update(&make_structure(WorldId::new())).await.is_err());
    }
}
