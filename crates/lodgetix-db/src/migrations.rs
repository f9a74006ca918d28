//! # Database Migrations
//!
//! Embedded SQL migrations for the registration store.
//!
//! ```text
//!   Database::new()
//!        │
//!        ▼
//!   _sqlx_migrations ──► compare with embedded files ──► run pending in order
//!                                                            │
//!   001_initial_schema.sql  functions, tickets, packages,    │
//!                           registration_drafts  ◄───────────┘
//! ```
//!
//! New migrations go in `migrations/sqlite/` as `NNN_description.sql`.
//! Existing files are never edited.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Embedded migrations from the workspace `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations. Safe to call repeatedly.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns `(total_migrations, applied_migrations)` for diagnostics.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await?;

    Ok((total, applied as usize))
}
