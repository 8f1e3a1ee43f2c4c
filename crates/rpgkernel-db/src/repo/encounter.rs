//! Operations on the `encounters` table.
//!
//! The encounter's full state is round-tripped as a single JSONB blob rather
//! than decomposed into columns: its shape (participants, turn order, auras,
//! concentration) is owned by `rpgkernel-combat` and changes with it, so the
//! data layer treats it as opaque and only indexes the queryable fields.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rpgkernel_types::{CombatState, EncounterId, EncounterStatus, WorldId};
use sqlx::PgPool;

use crate::error::DbError;

/// Typed access to encounter records, backed by either Postgres or memory.
pub trait EncounterRepository {
    /// Insert a freshly created encounter.
    ///
    /// # Errors
    /// Returns [`DbError::Postgres`] (Postgres backend only) if the insert fails.
    async fn create(&self, state: &CombatState) -> Result<(), DbError>;

    /// Fetch an encounter by id.
    ///
    /// # Errors
    /// Returns [`DbError::NotFound`] if no encounter with `id` exists.
    async fn get(&self, id: EncounterId) -> Result<CombatState, DbError>;

    /// Persist the full encounter state after a turn or action resolves.
    ///
    /// # Errors
    /// Returns [`DbError::NotFound`] if no encounter with `state.id` exists.
    async fn update(&self, state: &CombatState) -> Result<(), DbError>;
}

fn status_to_db(status: EncounterStatus) -> &'static str {
    match status {
        EncounterStatus::Active => "active",
        EncounterStatus::Completed => "completed",
        EncounterStatus::Paused => "paused",
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct EncounterRow {
    state: sqlx::types::Json<CombatState>,
}

/// Postgres-backed encounter repository.
pub struct PgEncounterRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PgEncounterRepository<'a> {
    /// Bind a repository to a connection pool.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl EncounterRepository for PgEncounterRepository<'_> {
    async fn create(&self, state: &CombatState) -> Result<(), DbError> {
        let now: DateTime<Utc> = state.created_at;
        sqlx::query(
            "INSERT INTO encounters (id, world_id, status, round, state, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(state.id.into_inner())
        .bind(state.world_id.map(WorldId::into_inner))
        .bind(status_to_db(state.status))
        .bind(i32::try_from(state.round).unwrap_or(i32::MAX))
        .bind(sqlx::types::Json(state))
        .bind(now)
        .bind(state.updated_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: EncounterId) -> Result<CombatState, DbError> {
        let row = sqlx::query_as::<_, EncounterRow>("SELECT state FROM encounters WHERE id = $1")
            .bind(id.into_inner())
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound { entity: "encounter", id: id.to_string() })?;
        Ok(row.state.0)
    }

    async fn update(&self, state: &CombatState) -> Result<(), DbError> {
        let result = sqlx::query(
            "UPDATE encounters SET status = $2, round = $3, state = $4, updated_at = $5 WHERE id = $1",
        )
        .bind(state.id.into_inner())
        .bind(status_to_db(state.status))
        .bind(i32::try_from(state.round).unwrap_or(i32::MAX))
        .bind(sqlx::types::Json(state))
        .bind(state.updated_at)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound { entity: "encounter", id: state.id.to_string() });
        }
        Ok(())
    }
}

/// In-memory encounter repository, used when `NODE_ENV=test`.
#[derive(Default)]
pub struct InMemoryEncounterRepository {
    rows: Mutex<BTreeMap<EncounterId, CombatState>>,
}

impl EncounterRepository for InMemoryEncounterRepository {
    async fn create(&self, state: &CombatState) -> Result<(), DbError> {
        let mut rows = self.rows.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        rows.insert(state.id, state.clone());
        Ok(())
    }

    async fn get(&self, id: EncounterId) -> Result<CombatState, DbError> {
        let rows = self.rows.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        rows.get(&id).cloned().ok_or_else(|| DbError::NotFound { entity: "encounter", id: id.to_string() })
    }

    async fn update(&self, state: &CombatState) -> Result<(), DbError> {
        let mut rows = self.rows.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if !rows.contains_key(&state.id) {
            return Err(DbError::NotFound { entity: "encounter", id: state.id.to_string() });
        }
        rows.insert(state.id, state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_state() -> CombatState {
        CombatState {
            id: EncounterId::new(),
            world_id: None,
            participants: Vec::new(),
            turn_order: Vec::new(),
            current_turn_index: 0,
            round: 1,
            terrain: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            status: EncounterStatus::Active,
            concentrations: Vec::new(),
            auras: Vec::new(),
        }
    }

    #[tokio::test]
    async fn in_memory_roundtrips_an_encounter() {
        let repo = InMemoryEncounterRepository::default();
        let state = make_state();
        repo.create(&state).await.expect("create");
        let fetched = repo.get(state.id).await.expect("get");
        assert_eq!(fetched, state);
    }

    #[tokio::test]
    async fn in_memory_update_advances_round() {
        let repo = InMemoryEncounterRepository::default();
        let state = make_state();
        repo.create(&state).await.expect("create");
        let mut advanced = state.clone();
        advanced.round = 2;
        repo.update(&advanced).await.expect("update");
        assert_eq!(repo.get(state.id).await.expect("get").round, 2);
    }

    #[tokio::test]
    async fn in_memory_update_missing_encounter_fails() {
        let repo = InMemoryEncounterRepository::default();
        assert!(repo.update(&make_state()).await.is_err());
    }
}
