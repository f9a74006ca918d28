//! # lodgetix-core: Registration Selection & Pricing Engine
//!
//! This crate is the **heart** of LodgeTix registration. It tracks what an
//! operator has chosen to buy, expands packages into attributable tickets,
//! keeps order totals consistent, and round-trips the whole state through
//! the draft wire format. Zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     LodgeTix Registration Stack                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Registration Wizard (front end)                │   │
//! │  │   Attendees ──► Tickets ──► Order Review ──► Payment           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                lodgetix-session (session owner)                 │   │
//! │  │      catalog lookups, save/resume drafts, configuration         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ lodgetix-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │  ┌────────────┐ ┌───────────┐ ┌──────────┐ ┌────────────────┐  │   │
//! │  │  │ expansion  │ │ selection │ │  lodge   │ │  registration  │  │   │
//! │  │  │ packages → │ │ attendee  │ │  bulk    │ │ mode + reducer │  │   │
//! │  │  │ tickets    │ │ ledger    │ │  ledger  │ │                │  │   │
//! │  │  └────────────┘ └───────────┘ └──────────┘ └────────────────┘  │   │
//! │  │  ┌────────────┐ ┌───────────┐ ┌──────────┐ ┌────────────────┐  │   │
//! │  │  │  pricing   │ │  legacy   │ │  codec   │ │   validation   │  │   │
//! │  │  └────────────┘ └───────────┘ └──────────┘ └────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  lodgetix-db (SQLite drafts + catalog)          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`catalog`] - Function, ticket and package definitions
//! - [`metadata`] - Point-in-time display snapshots
//! - [`expansion`] - Package → ticket line items
//! - [`selection`] - Per-attendee Selection Ledger
//! - [`lodge`] - Lodge Bulk Ledger and lodge form data
//! - [`pricing`] - Captured prices, order summary, order lines
//! - [`legacy`] - Old selection shape adapter
//! - [`validation`] - Payload and checkout checks
//! - [`codec`] - Draft wire document
//! - [`registration`] - Mode controller and reducer
//!
//! ## Design Principles
//!
//! 1. **Derived Totals**: the order summary is recomputed after every change
//! 2. **Pinned Prices**: unit prices are captured once, at selection time
//! 3. **Integer Money**: all monetary values are in cents (i64)
//! 4. **Explicit Errors**: catalog mistakes fail loudly, never as $0 lines
//!
//! ## Example Usage
//!
//! ```rust
//! use lodgetix_core::catalog::PackageDefinition;
//! use lodgetix_core::money::Money;
//! use lodgetix_core::registration::RegistrationState;
//! use lodgetix_core::RegistrationMode;
//!
//! let table = PackageDefinition {
//!     id: "pkg-table".into(),
//!     name: "Lodge Table of 10".into(),
//!     price: Money::from_cents(195000),
//!     original_price: None,
//!     discount: None,
//!     includes: vec!["tkt-gala".into(); 10],
//!     eligible_attendee_types: vec![],
//!     eligible_registration_types: vec![RegistrationMode::Lodge],
//!     is_active: true,
//! };
//!
//! let mut state = RegistrationState::new("fn-installation");
//! state.set_registration_type(RegistrationMode::Lodge).unwrap();
//! state.set_lodge_bulk_selection(&table, 2).unwrap();
//!
//! assert_eq!(state.summary().total_attendees, 20);
//! assert_eq!(state.summary().subtotal.cents(), 390000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod codec;
pub mod error;
pub mod expansion;
pub mod legacy;
pub mod lodge;
pub mod metadata;
pub mod money;
pub mod pricing;
pub mod registration;
pub mod selection;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::{CatalogSnapshot, PackageDefinition, TicketDefinition};
pub use error::{CoreError, CoreResult, FieldError, ValidationError};
pub use money::Money;
pub use pricing::{CapturedPrices, OrderSummary};
pub use registration::{RegistrationAction, RegistrationState};
pub use selection::{AttendeeSelection, PackageSelection, TicketSelectionItem};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity for one selection entry or lodge bulk purchase.
///
/// Catches slips like typing 100 instead of 10.
pub const MAX_SELECTION_QUANTITY: u32 = 99;

/// Largest unit price a stored draft may carry ($100,000,000.00).
pub const MAX_UNIT_PRICE: Money = Money::from_cents(10_000_000_000);
