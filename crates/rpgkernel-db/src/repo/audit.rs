//! Operations on the `audit_entries` table.

use std::sync::Mutex;

use rpgkernel_types::AuditEntry;
use sqlx::PgPool;

use crate::error::DbError;

/// Append-only access to the audit log.
pub trait AuditRepository {
    /// Append an entry recorded before or after a tool invocation.
    ///
    /// # Errors
    /// Returns [`DbError::Postgres`] (Postgres backend only) if the insert fails.
    async fn append(&self, entry: &AuditEntry) -> Result<(), DbError>;

    /// List entries in recording order, oldest first.
    ///
    /// Used by the replay engine to reconstruct a sequence of tool calls.
    ///
    /// # Errors
    /// Returns [`DbError::Postgres`] (Postgres backend only) if the query fails.
    async fn list_all(&self) -> Result<Vec<AuditEntry>, DbError>;
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct AuditEntryRow {
    id: uuid::Uuid,
    action: String,
    arguments: serde_json::Value,
    result: Option<serde_json::Value>,
    error: Option<String>,
    duration_ms: i64,
    timestamp: chrono::DateTime<chrono::Utc>,
    request_id: Option<String>,
}

impl TryFrom<AuditEntryRow> for AuditEntry {
    type Error = DbError;

    fn try_from(row: AuditEntryRow) -> Result<Self, DbError> {
        Ok(Self {
            id: rpgkernel_types::AuditEntryId::from(row.id),
            action: row.action,
            arguments: row.arguments,
            result: row.result,
            error: row.error,
            duration_ms: u64::try_from(row.duration_ms).map_err(|e| DbError::MalformedRow { table: "audit_entries", reason: e.to_string() })?,
            timestamp: row.timestamp,
            request_id: row.request_id,
        })
    }
}

/// Postgres-backed audit repository.
pub struct PgAuditRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PgAuditRepository<'a> {
    /// Bind a repository to a connection pool.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl AuditRepository for PgAuditRepository<'_> {
    async fn append(&self, entry: &AuditEntry) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO audit_entries (id, action, arguments, result, error, duration_ms, timestamp, request_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(entry.id.into_inner())
        .bind(&entry.action)
        .bind(&entry.arguments)
        .bind(&entry.result)
        .bind(&entry.error)
        .bind(i64::try_from(entry.duration_ms).unwrap_or(i64::MAX))
        .bind(entry.timestamp)
        .bind(&entry.request_id)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<AuditEntry>, DbError> {
        let rows = sqlx::query_as::<_, AuditEntryRow>("SELECT * FROM audit_entries ORDER BY timestamp ASC")
            .fetch_all(self.pool)
            .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}

/// In-memory audit repository, used when `NODE_ENV=test`.
#[derive(Default)]
pub struct InMemoryAuditRepository {
    rows: Mutex<Vec<AuditEntry>>,
}

impl AuditRepository for InMemoryAuditRepository {
    async fn append(&self, entry: &AuditEntry) -> Result<(), DbError> {
        let mut rows = self.rows.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        rows.push(entry.clone());
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<AuditEntry>, DbError> {
        let rows = self.rows.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(rows.clone())
    }
}
