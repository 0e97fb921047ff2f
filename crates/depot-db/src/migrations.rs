//! # Schema Migrations
//!
//! The SQL files in `migrations/sqlite/` are compiled into the binary and
//! applied in filename order on startup. sqlx records each applied file
//! (with its checksum) in `_sqlx_migrations`, so reruns are no-ops and an
//! edited, already-applied file fails loudly.
//!
//! New schema changes go in a new `NNN_description.sql` file.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies whatever embedded migrations the database has not seen yet.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let (embedded, applied) = migration_status(pool).await?;
    if applied >= embedded {
        info!(applied, "Schema up to date");
        return Ok(());
    }

    info!(pending = embedded - applied, "Applying migrations");
    MIGRATOR.run(pool).await?;
    info!(applied = embedded, "Schema migrated");
    Ok(())
}

/// `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let embedded = MIGRATOR.migrations.len();

    // Before the first run the bookkeeping table does not exist
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((embedded, usize::try_from(applied).unwrap_or(0)))
}
