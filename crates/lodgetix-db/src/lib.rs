//! # lodgetix-db: Storage Layer for LodgeTix Registration
//!
//! Persists registration drafts and function catalogs in SQLite via sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Registration Data Flow                              │
//! │                                                                         │
//! │  RegistrationSession (lodgetix-session)                                │
//! │       │  save_draft / resume / catalog lookup                           │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   lodgetix-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ DraftRepo      │    │ 001_initial  │  │   │
//! │  │   │  SqlitePool   │    │ CatalogRepo    │    │  (embedded)  │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (path from session.toml or LODGETIX_DB_PATH)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Draft and catalog repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lodgetix_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("lodgetix.db")).await?;
//! let catalog = db.catalog().load_snapshot("fn-installation").await?;
//! let stored = db.drafts().upsert("draft-1", "fn-installation", &body).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, StoreStats};

pub use repository::catalog::CatalogRepository;
pub use repository::draft::{generate_draft_id, DraftRecord, DraftRepository};
