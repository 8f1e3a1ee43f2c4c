//! Operations on the `regions` and `river_segments` tables.

use std::collections::BTreeMap;
use std::sync::Mutex;

use rpgkernel_types::{Region, RegionId, RegionType, RiverSegment, RiverSegmentId, WorldId};
use sqlx::PgPool;

use crate::error::DbError;

/// Typed access to region and river-segment records.
pub trait RegionRepository {
    /// Bulk-insert a world's regions.
    ///
    /// # Errors
    /// Returns [`DbError::Postgres`] (Postgres backend only) if any insert fails.
    async fn save_many(&self, regions: &[Region]) -> Result<(), DbError>;

    /// List every region belonging to a world.
    ///
    /// # Errors
    /// Returns [`DbError::Postgres`] (Postgres backend only) if the query fails.
    async fn list_by_world(&self, world_id: WorldId) -> Result<Vec<Region>, DbError>;

    /// Bulk-insert a world's river network.
    ///
    /// # Errors
    /// Returns [`DbError::Postgres`] (Postgres backend only) if any insert fails.
    async fn save_rivers(&self, rivers: &[RiverSegment]) -> Result<(), DbError>;

    /// List every river segment belonging to a world.
    ///
    /// # Errors
    /// Returns [`DbError::Postgres`] (Postgres backend only) if the query fails.
    async fn list_rivers_by_world(&self, world_id: WorldId) -> Result<Vec<RiverSegment>, DbError>;
}

fn region_type_to_db(region_type: RegionType) -> &'static str {
    match region_type {
        RegionType::Kingdom => "kingdom",
        RegionType::Wilderness => "wilderness",
        RegionType::Waterbody => "waterbody",
        RegionType::Highlands => "highlands",
    }
}

fn region_type_from_db(raw: &str) -> Result<RegionType, DbError> {
    match raw {
        "kingdom" => Ok(RegionType::Kingdom),
        "wilderness" => Ok(RegionType::Wilderness),
        "waterbody" => Ok(RegionType::Waterbody),
        "highlands" => Ok(RegionType::Highlands),
        other => Err(DbError::MalformedRow { table: "regions", reason: format!("unknown region_type {other:?}") }),
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct RegionRow {
    id: uuid::Uuid,
    world_id: uuid::Uuid,
    name: String,
    region_type: String,
    center_x: i32,
    center_y: i32,
    color: String,
}

impl TryFrom<RegionRow> for Region {
    type Error = DbError;

    fn try_from(row: RegionRow) -> Result<Self, DbError> {
        Ok(Self {
            id: RegionId::from(row.id),
            world_id: WorldId::from(row.world_id),
            name: row.name,
            region_type: region_type_from_db(&row.region_type)?,
            center_x: row.center_x,
            center_y: row.center_y,
            color: row.color,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct RiverSegmentRow {
    id: uuid::Uuid,
    world_id: uuid::Uuid,
    from_x: i32,
    from_y: i32,
    to_x: i32,
    to_y: i32,
    flux: i32,
}

impl TryFrom<RiverSegmentRow> for RiverSegment {
    type Error = DbError;

    fn try_from(row: RiverSegmentRow) -> Result<Self, DbError> {
        Ok(Self {
            id: RiverSegmentId::from(row.id),
            world_id: WorldId::from(row.world_id),
            from_x: row.from_x,
            from_y: row.from_y,
            to_x: row.to_x,
            to_y: row.to_y,
            flux: u32::try_from(row.flux).map_err(|e| DbError::MalformedRow { table: "river_segments", reason: e.to_string() })?,
        })
    }
}

/// Postgres-backed region repository.
pub struct PgRegionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PgRegionRepository<'a> {
    /// Bind a repository to a connection pool.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl RegionRepository for PgRegionRepository<'_> {
    async fn save_many(&self, regions: &[Region]) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        for region in regions {
            sqlx::query(
                "INSERT INTO regions (id, world_id, name, region_type, center_x, center_y, color)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(region.id.into_inner())
            .bind(region.world_id.into_inner())
            .bind(&region.name)
            .bind(region_type_to_db(region.region_type))
            .bind(region.center_x)
            .bind(region.center_y)
            .bind(&region.color)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn list_by_world(&self, world_id: WorldId) -> Result<Vec<Region>, DbError> {
        let rows = sqlx::query_as::<_, RegionRow>("SELECT * FROM regions WHERE world_id = $1")
            .bind(world_id.into_inner())
            .fetch_all(self.pool)
            .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn save_rivers(&self, rivers: &[RiverSegment]) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        for river in rivers {
            sqlx::query(
                "INSERT INTO river_segments (id, world_id, from_x, from_y, to_x, to_y, flux)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(river.id.into_inner())
            .bind(river.world_id.into_inner())
            .bind(river.from_x)
            .bind(river.from_y)
            .bind(river.to_x)
            .bind(river.to_y)
            .bind(i32::try_from(river.flux).unwrap_or(i32::MAX))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn list_rivers_by_world(&self, world_id: WorldId) -> Result<Vec<RiverSegment>, DbError> {
        let rows = sqlx::query_as::<_, RiverSegmentRow>("SELECT * FROM river_segments WHERE world_id = $1")
            .bind(world_id.into_inner())
            .fetch_all(self.pool)
            .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}

/// In-memory region repository, used when `NODE_ENV=test`.
#[derive(Default)]
pub struct InMemoryRegionRepository {
    regions: Mutex<BTreeMap<RegionId, Region>>,
    rivers: Mutex<BTreeMap<RiverSegmentId, RiverSegment>>,
}

impl RegionRepository for InMemoryRegionRepository {
    async fn save_many(&self, regions: &[Region]) -> Result<(), DbError> {
        let mut rows = self.regions.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        for region in regions {
            rows.insert(region.id, region.clone());
        }
        Ok(())
    }

    async fn list_by_world(&self, world_id: WorldId) -> Result<Vec<Region>, DbError> {
        let rows = self.regions.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(rows.values().filter(|r| r.world_id == world_id).cloned().collect())
    }

    async fn save_rivers(&self, rivers: &[RiverSegment]) -> Result<(), DbError> {
        let mut rows = self.rivers.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        for river in rivers {
            rows.insert(river.id, *river);
        }
        Ok(())
    }

    async fn list_rivers_by_world(&self, world_id: WorldId) -> Result<Vec<RiverSegment>, DbError> {
        let rows = self.rivers.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(rows.values().filter(|r| r.world_id == world_id).copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_region(world_id: WorldId) -> Region {
        Region {
            id: RegionId::new(),
            world_id,
            name: "Greywood".to_owned(),
            region_type: RegionType::Wilderness,
            center_x: 10,
            center_y: 10,
            color: "#335522".to_owned(),
        }
    }

    #[tokio::test]
    async fn in_memory_save_many_then_list_by_world() {
        let repo = InMemoryRegionRepository::default();
        let world_id = WorldId::new();
        repo.save_many(&[make_region(world_id)]).await.expect("save");
        let listed = repo.list_by_world(world_id).await.expect("list");
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn in_memory_rivers_are_scoped_to_world() {
        let repo = InMemoryRegionRepository::default();
        let world_id = WorldId::new();
        let river = RiverSegment { id: RiverSegmentId::new(), world_id, from_x: 0, from_y: 0, to_x: 1, to_y: 0, flux: 3 };
        repo.save_rivers(&[river]).await.expect("save");
        let listed = repo.list_rivers_by_world(world_id).await.expect("list");
        let fluxes: Vec<u32> = listed.iter().map(|r| r.flux).collect();
        assert_eq!(fluxes, vec![3]);
        assert!(repo.list_rivers_by_world(WorldId::new()).await.expect("list").is_empty());
    }
}
