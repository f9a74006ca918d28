//! # Registration Store
//!
//! Opens the SQLite file that holds catalogs and draft bodies.
//!
//! ```text
//!   SessionConfig::db_config()
//!        │   path, pool size, acquire wait ≤ draft save timeout
//!        ▼
//!   Database::new(config).await ── WAL + foreign keys + busy wait ── migrations
//!        │
//!        ├──► db.drafts()   → DraftRepository    (autosave / resume)
//!        ├──► db.catalog()  → CatalogRepository  (snapshot at session start)
//!        └──► db.stats()    → StoreStats         (seed tool, diagnostics)
//! ```
//!
//! Autosave writers and catalog readers share one file. WAL keeps readers
//! off the writer's lock; the busy timeout makes a second writer wait
//! instead of failing with `SQLITE_BUSY`.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::catalog::CatalogRepository;
use crate::repository::draft::DraftRepository;

const IN_MEMORY: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Where the registration store lives and how long callers wait on it.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/lodgetix/lodgetix.db")
///     .max_connections(5)
///     .acquire_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, or `:memory:`. Created if missing.
    pub database_path: PathBuf,

    pub max_connections: u32,

    /// Longest wait for a pooled connection. Sessions set this to their
    /// draft save timeout, so a starved pool surfaces as a store error.
    pub acquire_timeout: Duration,

    /// Longest wait on another connection's write lock.
    pub busy_timeout: Duration,

    /// Apply pending migrations on open. Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(10),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Private in-memory store for tests. One connection, so every
    /// repository sees the same database.
    pub fn in_memory() -> Self {
        DbConfig {
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            ..DbConfig::new(IN_MEMORY)
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::new().in_memory(true)
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
        };

        options
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(self.busy_timeout)
            // catalog rows rely on ON DELETE CASCADE
            .foreign_keys(true)
    }
}

// =============================================================================
// Store Stats
// =============================================================================

/// Row counts for the seed tool and health checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct StoreStats {
    pub functions: i64,
    pub packages: i64,
    pub drafts: i64,
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the registration store. Clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (or creates) the store and brings its schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            max_connections = config.max_connections,
            "Opening registration store"
        );

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(config.connect_options())
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(
            acquire_timeout_ms = config.acquire_timeout.as_millis() as u64,
            busy_timeout_ms = config.busy_timeout.as_millis() as u64,
            "Registration store pool ready"
        );

        let db = Database { pool };
        if config.run_migrations {
            migrations::run_migrations(&db.pool).await?;
        }
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Draft bodies keyed by draft id.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let record = db.drafts().get("draft-1").await?;
    /// ```
    pub fn drafts(&self) -> DraftRepository {
        DraftRepository::new(self.pool.clone())
    }

    /// Function catalogs.
    pub fn catalog(&self) -> CatalogRepository {
        CatalogRepository::new(self.pool.clone())
    }

    /// True once every embedded migration has been applied.
    pub async fn is_schema_current(&self) -> DbResult<bool> {
        let (total, applied) = migrations::migration_status(&self.pool).await?;
        Ok(total == applied)
    }

    pub async fn stats(&self) -> DbResult<StoreStats> {
        let stats = sqlx::query_as::<_, StoreStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM functions)           AS functions,
                (SELECT COUNT(*) FROM packages)            AS packages,
                (SELECT COUNT(*) FROM registration_drafts) AS drafts
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }

    /// Closes the pool. Repository calls fail afterwards.
    pub async fn close(&self) {
        info!("Closing registration store");
        self.pool.close().await;
    }

    /// Checks if the store can execute queries.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_store_is_migrated_and_empty() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);
        assert!(db.is_schema_current().await.unwrap());
        assert_eq!(
            db.stats().await.unwrap(),
            StoreStats {
                functions: 0,
                packages: 0,
                drafts: 0
            }
        );
    }

    #[tokio::test]
    async fn test_stats_count_saved_drafts() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.drafts()
            .upsert("draft-1", "fn-installation", "{}")
            .await
            .unwrap();
        db.drafts()
            .upsert("draft-1", "fn-installation", "{}")
            .await
            .unwrap();

        assert_eq!(db.stats().await.unwrap().drafts, 1);
    }

    #[tokio::test]
    async fn test_closed_store_is_unhealthy() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;
        assert!(!db.health_check().await);
        assert!(db.stats().await.is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/lodgetix-test.db")
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(3))
            .busy_timeout(Duration::from_millis(250))
            .run_migrations(false);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout, Duration::from_secs(3));
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert!(!config.run_migrations);
        assert!(!config.is_in_memory());
        assert!(DbConfig::in_memory().is_in_memory());
    }
}
