//! # Database Migrations
//!
//! Embedded SQL migrations and the init-time seed.
//!
//! ## Init Sequence (`POST /api/db/init`)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  count tables (before)                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  MIGRATOR.run()  ← _sqlx_migrations tracks what already ran             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT OR IGNORE default settings + modules                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  count tables (after) → { tablesCreated, totalTables }                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/sqlite/` with the next sequence number
//! 2. Name format: `NNNN_description.sql`
//! 3. **NEVER** modify an applied migration; add a new one

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;
use crate::repository::module::ModuleRepository;
use crate::repository::settings::SettingsRepository;

/// Embedded migrations from the workspace `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Outcome of initialising a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitReport {
    pub tables_created: i64,
    pub total_tables: i64,
}

/// Runs all pending database migrations.
///
/// Idempotent: applied migrations are recorded in `_sqlx_migrations` and
/// skipped on later runs.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Migrates, seeds defaults and reports how many tables exist.
pub async fn initialize(pool: &SqlitePool) -> DbResult<InitReport> {
    let before = table_count(pool).await?;

    run_migrations(pool).await?;
    SettingsRepository::new(pool.clone()).seed_defaults().await?;
    ModuleRepository::new(pool.clone()).seed_defaults().await?;

    let after = table_count(pool).await?;
    info!(tables_created = after - before, total_tables = after, "Database initialised");

    Ok(InitReport {
        tables_created: after - before,
        total_tables: after,
    })
}

/// Counts application tables (SQLite internals and the migration ledger
/// excluded).
pub async fn table_count(pool: &SqlitePool) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM sqlite_master
        WHERE type = 'table'
          AND name NOT LIKE 'sqlite_%'
          AND name != '_sqlx_migrations'
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Returns `(total_migrations, applied_migrations)`.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();

        let first = initialize(db.pool()).await.unwrap();
        assert!(first.tables_created > 0);
        assert_eq!(first.tables_created, first.total_tables);

        let second = initialize(db.pool()).await.unwrap();
        assert_eq!(second.tables_created, 0);
        assert_eq!(second.total_tables, first.total_tables);

        let (total, applied) = migration_status(db.pool()).await.unwrap();
        assert_eq!(total, applied);
    }
}
