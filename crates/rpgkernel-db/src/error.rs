//! Error types for the persistence layer.

use thiserror::Error;

/// Errors that can occur in the data layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization or deserialization error on a composite JSON column.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A row's composite JSON column did not decode to the expected domain type.
    #[error("malformed row in {table}: {reason}")]
    MalformedRow {
        /// The table the row came from.
        table: &'static str,
        /// Why decoding failed.
        reason: String,
    },

    /// No row with the given id exists.
    #[error("no {entity} with id {id}")]
    NotFound {
        /// The entity kind (`"world"`, `"character"`, ...).
        entity: &'static str,
        /// The id that was not found, rendered as a string.
        id: String,
    },
}
