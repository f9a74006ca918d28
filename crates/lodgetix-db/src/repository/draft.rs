//! # Draft Repository
//!
//! Stores in-progress registrations as JSON bodies keyed by draft id.
//!
//! ## Upsert Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  upsert(draft_id, function_id, body)                                    │
//! │                                                                         │
//! │   no row ──────────────► INSERT  revision = 1                           │
//! │   row, same body ──────► unchanged (same revision, same updated_at)     │
//! │   row, different body ─► UPDATE  revision + 1, updated_at = now         │
//! │                                                                         │
//! │  Replaying the same save is harmless. Two tabs saving the same draft:  │
//! │  last write wins.                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The body is opaque here; schema checks happen in the codec.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// One stored draft.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct DraftRecord {
    pub id: String,
    pub function_id: String,
    pub body: String,
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Repository for registration drafts.
#[derive(Debug, Clone)]
pub struct DraftRepository {
    pool: SqlitePool,
}

impl DraftRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DraftRepository { pool }
    }

    /// Inserts or replaces the body for `draft_id` and returns the stored row.
    pub async fn upsert(
        &self,
        draft_id: &str,
        function_id: &str,
        body: &str,
    ) -> DbResult<DraftRecord> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO registration_drafts (id, function_id, body, revision, created_at, updated_at)
            VALUES (?1, ?2, ?3, 1, ?4, ?4)
            ON CONFLICT(id) DO UPDATE SET
                revision = CASE WHEN registration_drafts.body = excluded.body
                                 AND registration_drafts.function_id = excluded.function_id
                                THEN registration_drafts.revision
                                ELSE registration_drafts.revision + 1 END,
                updated_at = CASE WHEN registration_drafts.body = excluded.body
                                   AND registration_drafts.function_id = excluded.function_id
                                  THEN registration_drafts.updated_at
                                  ELSE excluded.updated_at END,
                function_id = excluded.function_id,
                body = excluded.body
            "#,
        )
        .bind(draft_id)
        .bind(function_id)
        .bind(body)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let record = self
            .get(draft_id)
            .await?
            .ok_or_else(|| DbError::not_found("Draft", draft_id))?;

        debug!(
            draft_id = %record.id,
            function_id = %record.function_id,
            revision = record.revision,
            bytes = record.body.len(),
            "Draft stored"
        );
        Ok(record)
    }

    /// Returns the most recently stored body for a draft.
    pub async fn get(&self, draft_id: &str) -> DbResult<Option<DraftRecord>> {
        let record = sqlx::query_as::<_, DraftRecord>(
            r#"
            SELECT id, function_id, body, revision, created_at, updated_at
            FROM registration_drafts
            WHERE id = ?1
            "#,
        )
        .bind(draft_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Deletes a draft. Returns whether a row was removed.
    pub async fn delete(&self, draft_id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM registration_drafts WHERE id = ?1")
            .bind(draft_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Drafts for one function, most recently updated first.
    pub async fn list_for_function(&self, function_id: &str) -> DbResult<Vec<DraftRecord>> {
        let records = sqlx::query_as::<_, DraftRecord>(
            r#"
            SELECT id, function_id, body, revision, created_at, updated_at
            FROM registration_drafts
            WHERE function_id = ?1
            ORDER BY updated_at DESC, id ASC
            "#,
        )
        .bind(function_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM registration_drafts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Generates a new draft id.
pub fn generate_draft_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
