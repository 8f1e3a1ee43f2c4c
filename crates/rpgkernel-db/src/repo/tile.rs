//! Operations on the `tiles` table.

use std::collections::BTreeMap;
use std::sync::Mutex;

use rpgkernel_types::{Biome, Tile, WorldId};
use sqlx::PgPool;

use crate::error::DbError;

/// Typed access to tile records, backed by either Postgres or memory.
pub trait TileRepository {
    /// Bulk-insert a freshly generated world's tile grid.
    ///
    /// # Errors
    /// Returns [`DbError::Postgres`] (Postgres backend only) if any insert fails.
    async fn save_many(&self, tiles: &[Tile]) -> Result<(), DbError>;

    /// List every tile belonging to a world.
    ///
    /// # Errors
    /// Returns [`DbError::Postgres`] (Postgres backend only) if the query fails.
    async fn list_by_world(&self, world_id: WorldId) -> Result<Vec<Tile>, DbError>;

    /// Upsert a single tile (used by `SET_BIOME`/`EDIT_TILE` patch commands).
    ///
    /// # Errors
    /// Returns [`DbError::Postgres`] (Postgres backend only) if the upsert fails.
    async fn upsert(&self, tile: &Tile) -> Result<(), DbError>;
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct TileRow {
    world_id: uuid::Uuid,
    x: i32,
    y: i32,
    biome: String,
    elevation: i32,
    moisture: i32,
    temperature: i32,
}

fn biome_to_db(biome: Biome) -> &'static str {
    match biome {
        Biome::Ocean => "ocean",
        Biome::Beach => "beach",
        Biome::Desert => "desert",
        Biome::Rainforest => "rainforest",
        Biome::Swamp => "swamp",
        Biome::Savanna => "savanna",
        Biome::Woodland => "woodland",
        Biome::TropicalForest => "tropical_forest",
        Biome::Plains => "plains",
        Biome::Forest => "forest",
        Biome::Marsh => "marsh",
        Biome::Steppe => "steppe",
        Biome::Taiga => "taiga",
        Biome::Bog => "bog",
        Biome::Tundra => "tundra",
        Biome::Glacier => "glacier",
        Biome::Mountain => "mountain",
    }
}

fn biome_from_db(raw: &str) -> Result<Biome, DbError> {
    match raw {
        "ocean" => Ok(Biome::Ocean),
        "beach" => Ok(Biome::Beach),
        "desert" => Ok(Biome::Desert),
        "rainforest" => Ok(Biome::Rainforest),
        "swamp" => Ok(Biome::Swamp),
        "savanna" => Ok(Biome::Savanna),
        "woodland" => Ok(Biome::Woodland),
        "tropical_forest" => Ok(Biome::TropicalForest),
        "plains" => Ok(Biome::Plains),
        "forest" => Ok(Biome::Forest),
        "marsh" => Ok(Biome::Marsh),
        "steppe" => Ok(Biome::Steppe),
        "taiga" => Ok(Biome::Taiga),
        "bog" => Ok(Biome::Bog),
        "tundra" => Ok(Biome::Tundra),
        "glacier" => Ok(Biome::Glacier),
        "mountain" => Ok(Biome::Mountain),
        other => Err(DbError::MalformedRow { table: "tiles", reason: format!("unknown biome {other:?}") }),
    }
}

impl TryFrom<TileRow> for Tile {
    type Error = DbError;

    fn try_from(row: TileRow) -> Result<Self, DbError> {
        Ok(Self {
            world_id: WorldId::from(row.world_id),
            x: row.x,
            y: row.y,
            biome: biome_from_db(&row.biome)?,
            elevation: row.elevation,
            moisture: row.moisture,
            temperature: row.temperature,
        })
    }
}

/// Postgres-backed tile repository.
pub struct PgTileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PgTileRepository<'a> {
    /// Bind a repository to a connection pool.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl TileRepository for PgTileRepository<'_> {
    async fn save_many(&self, tiles: &[Tile]) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        for tile in tiles {
            sqlx::query(
                "INSERT INTO tiles (world_id, x, y, biome, elevation, moisture, temperature)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(tile.world_id.into_inner())
            .bind(tile.x)
            .bind(tile.y)
            .bind(biome_to_db(tile.biome))
            .bind(tile.elevation)
            .bind(tile.moisture)
            .bind(tile.temperature)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn list_by_world(&self, world_id: WorldId) -> Result<Vec<Tile>, DbError> {
        let rows = sqlx::query_as::<_, TileRow>("SELECT * FROM tiles WHERE world_id = $1")
            .bind(world_id.into_inner())
            .fetch_all(self.pool)
            .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn upsert(&self, tile: &Tile) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO tiles (world_id, x, y, biome, elevation, moisture, temperature)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (world_id, x, y) DO UPDATE SET
               biome = EXCLUDED.biome, elevation = EXCLUDED.elevation,
               moisture = EXCLUDED.moisture, temperature = EXCLUDED.temperature",
        )
        .bind(tile.world_id.into_inner())
        .bind(tile.x)
        .bind(tile.y)
        .bind(biome_to_db(tile.biome))
        .bind(tile.elevation)
        .bind(tile.moisture)
        .bind(tile.temperature)
        .execute(self.pool)
        .await?;
        Ok(())
    }
}

/// In-memory tile repository, used when `NODE_ENV=test`.
#[derive(Default)]
pub struct InMemoryTileRepository {
    rows: Mutex<BTreeMap<(WorldId, i32, i32), Tile>>,
}

impl TileRepository for InMemoryTileRepository {
    async fn save_many(&self, tiles: &[Tile]) -> Result<(), DbError> {
        let mut rows = self.rows.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        for tile in tiles {
            rows.insert((tile.world_id, tile.x, tile.y), *tile);
        }
        Ok(())
    }

    async fn list_by_world(&self, world_id: WorldId) -> Result<Vec<Tile>, DbError> {
        let rows = self.rows.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(rows.values().filter(|t| t.world_id == world_id).copied().collect())
    }

    async fn upsert(&self, tile: &Tile) -> Result<(), DbError> {
        let mut rows = self.rows.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        rows.insert((tile.world_id, tile.x, tile.y), *tile);
        Ok(())
    }
}
