//! # Repository Module
//!
//! SQL lives here and nowhere else.
//!
//! ```text
//!   RegistrationSession
//!        │
//!        ├── db.drafts().upsert(id, function_id, body)
//!        │        ▼
//!        │   DraftRepository ───► registration_drafts
//!        │
//!        └── db.catalog().load_snapshot(function_id)
//!                 ▼
//!            CatalogRepository ─► functions, tickets, packages
//! ```
//!
//! - [`DraftRepository`](draft::DraftRepository) - draft save, resume, list
//! - [`CatalogRepository`](catalog::CatalogRepository) - catalog load and replace

pub mod catalog;
pub mod draft;
