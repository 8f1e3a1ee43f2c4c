//! Operations on the `events` table.

use std::sync::Mutex;

use rpgkernel_types::{Event, EventKind, Topic};
use sqlx::PgPool;

use crate::error::DbError;

/// Append-only access to the published event log.
pub trait EventRepository {
    /// Append an event to the durable log after it is published on the bus.
    ///
    /// # Errors
    /// Returns [`DbError::Postgres`] (Postgres backend only) if the insert fails.
    async fn append(&self, event: &Event) -> Result<(), DbError>;

    /// List every event on a topic, oldest first.
    ///
    /// # Errors
    /// Returns [`DbError::Postgres`] (Postgres backend only) if the query fails.
    async fn list_by_topic(&self, topic: Topic) -> Result<Vec<Event>, DbError>;
}

fn topic_to_db(topic: Topic) -> &'static str {
    match topic {
        Topic::World => "world",
        Topic::Combat => "combat",
    }
}

fn topic_from_db(raw: &str) -> Result<Topic, DbError> {
    match raw {
        "world" => Ok(Topic::World),
        "combat" => Ok(Topic::Combat),
        other => Err(DbError::MalformedRow { table: "events", reason: format!("unknown topic {other:?}") }),
    }
}

fn kind_to_db(kind: EventKind) -> &'static str {
    match kind {
        EventKind::WorldGenerated => "world_generated",
        EventKind::MapPatchApplied => "map_patch_applied",
        EventKind::EncounterStarted => "encounter_started",
        EventKind::AttackExecuted => "attack_executed",
        EventKind::HealExecuted => "heal_executed",
        EventKind::MoveExecuted => "move_executed",
        EventKind::ConditionApplied => "condition_applied",
        EventKind::ConditionRemoved => "condition_removed",
        EventKind::ConcentrationEnded => "concentration_ended",
        EventKind::TurnAdvanced => "turn_advanced",
        EventKind::EncounterEnded => "encounter_ended",
    }
}

fn kind_from_db(raw: &str) -> Result<EventKind, DbError> {
    match raw {
        "world_generated" => Ok(EventKind::WorldGenerated),
        "map_patch_applied" => Ok(EventKind::MapPatchApplied),
        "encounter_started" => Ok(EventKind::EncounterStarted),
        "attack_executed" => Ok(EventKind::AttackExecuted),
        "heal_executed" => Ok(EventKind::HealExecuted),
        "move_executed" => Ok(EventKind::MoveExecuted),
        "condition_applied" => Ok(EventKind::ConditionApplied),
        "condition_removed" => Ok(EventKind::ConditionRemoved),
        "concentration_ended" => Ok(EventKind::ConcentrationEnded),
        "turn_advanced" => Ok(EventKind::TurnAdvanced),
        "encounter_ended" => Ok(EventKind::EncounterEnded),
        other => Err(DbError::MalformedRow { table: "events", reason: format!("unknown kind {other:?}") }),
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct EventRow {
    topic: String,
    kind: String,
    payload: serde_json::Value,
    timestamp: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = DbError;

    fn try_from(row: EventRow) -> Result<Self, DbError> {
        Ok(Self {
            topic: topic_from_db(&row.topic)?,
            kind: kind_from_db(&row.kind)?,
            payload: row.payload,
            timestamp: row.timestamp,
        })
    }
}

/// Postgres-backed event repository.
pub struct PgEventRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PgEventRepository<'a> {
    /// Bind a repository to a connection pool.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl EventRepository for PgEventRepository<'_> {
    async fn append(&self, event: &Event) -> Result<(), DbError> {
        sqlx::query("INSERT INTO events (topic, kind, payload, timestamp) VALUES ($1, $2, $3, $4)")
            .bind(topic_to_db(event.topic))
            .bind(kind_to_db(event.kind))
            .bind(&event.payload)
            .bind(event.timestamp)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    async fn list_by_topic(&self, topic: Topic) -> Result<Vec<Event>, DbError> {
        let rows = sqlx::query_as::<_, EventRow>(
            "SELECT topic, kind, payload, timestamp FROM events WHERE topic = $1 ORDER BY id ASC",
        )
        .bind(topic_to_db(topic))
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}

/// In-memory event repository, used when `NODE_ENV=test`.
#[derive(Default)]
pub struct InMemoryEventRepository {
    rows: Mutex<Vec<Event>>,
}

impl EventRepository for InMemoryEventRepository {
    async fn append(&self, event: &Event) -> Result<(), DbError> {
        let mut rows = self.rows.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        rows.push(event.clone());
        Ok(())
    }

    async fn list_by_topic(&self, topic: Topic) -> Result<Vec<Event>, DbError> {
        let rows = self.rows.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(rows.iter().filter(|e| e.topic == topic).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_event(topic: Topic, kind: EventKind) -> Event {
        Event { topic, kind, payload: serde_json::json!({}), timestamp: Utc::now() }
    }

    #[tokio::test]
    async fn in_memory_filters_by_topic() {
        let repo = InMemoryEventRepository::default();
        repo.append(&make_event(Topic::World, EventKind::WorldGenerated)).await.expect("append");
        repo.append(&make_event(Topic::Combat, EventKind::EncounterStarted)).await.expect("append");
        let world_events = repo.list_by_topic(Topic::World).await.expect("list");
        let kinds: Vec<EventKind> = world_events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::WorldGenerated]);
    }
}
