//! # Store Seams
//!
//! The session talks to storage through two traits so tests can swap in
//! failing or slow stores.
//!
//! ```text
//!   RegistrationSession
//!        │
//!        ├──► dyn CatalogSource ──► Database::catalog()  (load once at start)
//!        │
//!        └──► dyn DraftStore ─────► Database::drafts()   (save / load body)
//! ```

use async_trait::async_trait;
use lodgetix_core::CatalogSnapshot;
use lodgetix_db::{Database, DbResult, DraftRecord};

/// Idempotent draft persistence keyed by draft id.
#[async_trait]
pub trait DraftStore: Send + Sync {
    /// Stores `body` as the latest document for `draft_id`.
    async fn save(&self, draft_id: &str, function_id: &str, body: &str) -> DbResult<DraftRecord>;

    /// Returns the most recently stored document for `draft_id`.
    async fn load(&self, draft_id: &str) -> DbResult<Option<DraftRecord>>;
}

/// Inbound catalog lookup.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn snapshot(&self, function_id: &str) -> DbResult<Option<CatalogSnapshot>>;
}

#[async_trait]
impl DraftStore for Database {
    async fn save(&self, draft_id: &str, function_id: &str, body: &str) -> DbResult<DraftRecord> {
        self.drafts().upsert(draft_id, function_id, body).await
    }

    async fn load(&self, draft_id: &str) -> DbResult<Option<DraftRecord>> {
        self.drafts().get(draft_id).await
    }
}

#[async_trait]
impl CatalogSource for Database {
    async fn snapshot(&self, function_id: &str) -> DbResult<Option<CatalogSnapshot>> {
        self.catalog().load_snapshot(function_id).await
    }
}
