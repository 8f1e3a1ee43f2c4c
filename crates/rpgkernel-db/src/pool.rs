//! Connection pool construction and migration running.

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::error::DbError;

/// Connect to `database_url` with a bounded connection pool and run
/// pending migrations from `crates/rpgkernel-db/migrations`.
///
/// # Errors
/// Returns [`DbError::Postgres`] if the connection fails, or
/// [`DbError::Migration`] if a migration fails to apply.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, DbError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!(max_connections, "connected to database and ran migrations");
    Ok(pool)
}
