//! # lodgetix-session: Registration Session for LodgeTix
//!
//! Ties the pure registration engine to storage: one [`RegistrationSession`]
//! per wizard run.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Wizard UI                                                             │
//! │     │  add_package / set_lodge_bulk_selection / save_draft             │
//! │     ▼                                                                   │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                lodgetix-session (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │  SessionConfig ─► Database ─► RegistrationSession               │   │
//! │  │  (session.toml)     │            │  Arc<Mutex<RegistrationState>>│   │
//! │  │                     │            │  catalog snapshot             │   │
//! │  │                     │            ▼                               │   │
//! │  │            CatalogSource    DraftStore (timeout-wrapped)         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │     │                                     │                             │
//! │     ▼                                     ▼                             │
//! │  lodgetix-core (pricing, codec)     lodgetix-db (SQLite)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use std::sync::Arc;
//! use lodgetix_db::Database;
//! use lodgetix_session::{init_tracing, RegistrationSession, SessionConfig};
//!
//! let config = SessionConfig::load_or_default(None);
//! init_tracing(&config.logging);
//!
//! let db = Database::new(config.db_config()).await?;
//! let session = RegistrationSession::start(&db, Arc::new(db.clone()), "fn-installation", &config).await?;
//! session.add_package("att-1", "pkg-weekend", 1)?;
//! session.save_draft().await?;
//! ```

pub mod config;
pub mod error;
pub mod session;
pub mod store;
pub mod telemetry;

pub use config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use session::RegistrationSession;
pub use store::{CatalogSource, DraftStore};
pub use telemetry::init_tracing;
