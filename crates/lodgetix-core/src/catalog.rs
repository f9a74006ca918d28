//! # Catalog Snapshot
//!
//! Immutable copies of the function, ticket and package definitions the
//! wizard sells from. Captured once when a session starts; the engine never
//! subscribes to catalog changes mid-session.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CatalogSnapshot (function "Grand Installation")                        │
//! │                                                                         │
//! │  tickets:                          packages:                            │
//! │  ┌──────────────────────────┐      ┌──────────────────────────────────┐ │
//! │  │ tkt-gala  Gala Dinner    │◄─────│ pkg-weekend  Full Weekend $180   │ │
//! │  │           $150           │      │   includes: [tkt-gala]           │ │
//! │  ├──────────────────────────┤      ├──────────────────────────────────┤ │
//! │  │ tkt-lunch Farewell Lunch │      │ pkg-table    Lodge Table $1950   │ │
//! │  │           $75            │      │   includes: 10 × ticket ids      │ │
//! │  └──────────────────────────┘      └──────────────────────────────────┘ │
//! │                                                                         │
//! │  A package's price is its own. It is NEVER recomputed from the sum of  │
//! │  its included tickets (bundles may be discounted).                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{AttendeeType, RegistrationMode};

// =============================================================================
// Function
// =============================================================================

/// The event ("function") being registered for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[ts(as = "Option<String>")]
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Ticket
// =============================================================================

/// Capacity counters as reported by the catalog at capture time.
///
/// Advisory only: live availability is tracked elsewhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CapacityCounters {
    /// `None` means unlimited.
    pub total: Option<u32>,
    pub available: Option<u32>,
    pub reserved: u32,
    pub sold: u32,
}

impl CapacityCounters {
    /// Returns true when a capped ticket has nothing left.
    pub fn is_sold_out(&self) -> bool {
        matches!(self.available, Some(0))
    }
}

/// A single ticket type for one event within the function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TicketDefinition {
    pub id: String,
    /// Owning event (a function has several events: ceremony, dinner, ...).
    pub event_id: String,
    pub name: String,
    pub price: Money,
    #[serde(default)]
    pub capacity: CapacityCounters,
    pub is_active: bool,
    /// Allowed attendee types. Empty means everyone.
    #[serde(default)]
    pub eligible_attendee_types: Vec<AttendeeType>,
}

impl TicketDefinition {
    /// Checks whether an attendee of `attendee_type` may hold this ticket.
    pub fn is_eligible(&self, attendee_type: AttendeeType) -> bool {
        self.eligible_attendee_types.is_empty()
            || self.eligible_attendee_types.contains(&attendee_type)
    }

    /// Rejects inactive tickets.
    pub fn ensure_on_sale(&self) -> CoreResult<()> {
        if !self.is_active {
            return Err(CoreError::InactiveCatalogItem {
                kind: "Ticket".to_string(),
                id: self.id.clone(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Package
// =============================================================================

/// A priced bundle of tickets sold as one line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PackageDefinition {
    pub id: String,
    pub name: String,
    /// The bundle's own price. Authoritative for pricing.
    pub price: Money,
    /// Price before discount, for "was $X" display.
    #[serde(default)]
    pub original_price: Option<Money>,
    /// Discount amount advertised by the catalog.
    #[serde(default)]
    pub discount: Option<Money>,
    /// Included ticket ids. A repeated id means several copies per package.
    pub includes: Vec<String>,
    /// Empty means every attendee type.
    #[serde(default)]
    pub eligible_attendee_types: Vec<AttendeeType>,
    /// Empty means every registration type.
    #[serde(default)]
    pub eligible_registration_types: Vec<RegistrationMode>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl PackageDefinition {
    /// Number of tickets one copy of this package represents.
    pub fn tickets_per_package(&self) -> u32 {
        self.includes.len() as u32
    }

    /// Fails with a configuration error if the package includes nothing.
    pub fn ensure_has_tickets(&self) -> CoreResult<()> {
        if self.includes.is_empty() {
            return Err(CoreError::EmptyPackage {
                package_id: self.id.clone(),
            });
        }
        Ok(())
    }

    /// Rejects inactive packages.
    pub fn ensure_on_sale(&self) -> CoreResult<()> {
        if !self.is_active {
            return Err(CoreError::InactiveCatalogItem {
                kind: "Package".to_string(),
                id: self.id.clone(),
            });
        }
        Ok(())
    }

    /// Savings shown next to the package. Derived from `original_price`
    /// when present, otherwise the catalog's `discount`.
    pub fn savings(&self) -> Money {
        match self.original_price {
            Some(original) => self.price.savings_against(original),
            None => self.discount.unwrap_or_default(),
        }
    }

    /// Registration types this package may be sold under. Empty means all.
    pub fn allows_mode(&self, mode: RegistrationMode) -> bool {
        self.eligible_registration_types.is_empty()
            || self.eligible_registration_types.contains(&mode)
    }

    /// Rejects packages restricted to other registration types.
    pub fn ensure_offered_for(&self, mode: RegistrationMode) -> CoreResult<()> {
        if !self.allows_mode(mode) {
            return Err(CoreError::IneligiblePackage {
                package_id: self.id.clone(),
                mode: mode.to_string(),
            });
        }
        Ok(())
    }

    pub fn is_available_to(&self, attendee_type: AttendeeType, mode: RegistrationMode) -> bool {
        let type_ok = self.eligible_attendee_types.is_empty()
            || self.eligible_attendee_types.contains(&attendee_type);
        self.is_active && type_ok && self.allows_mode(mode)
    }

    pub fn is_available_for_mode(&self, mode: RegistrationMode) -> bool {
        self.is_active && self.allows_mode(mode)
    }
}

// =============================================================================
// Catalog Snapshot
// =============================================================================

/// Everything purchasable for one function, as captured at session start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    pub function: FunctionDefinition,
    pub tickets: Vec<TicketDefinition>,
    pub packages: Vec<PackageDefinition>,
    #[ts(as = "String")]
    pub captured_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    pub fn new(
        function: FunctionDefinition,
        tickets: Vec<TicketDefinition>,
        packages: Vec<PackageDefinition>,
    ) -> Self {
        CatalogSnapshot {
            function,
            tickets,
            packages,
            captured_at: Utc::now(),
        }
    }

    pub fn function_id(&self) -> &str {
        &self.function.id
    }

    pub fn ticket(&self, ticket_id: &str) -> Option<&TicketDefinition> {
        self.tickets.iter().find(|t| t.id == ticket_id)
    }

    pub fn package(&self, package_id: &str) -> Option<&PackageDefinition> {
        self.packages.iter().find(|p| p.id == package_id)
    }

    /// Packages the wizard may offer to this attendee in this mode.
    pub fn packages_for(
        &self,
        attendee_type: AttendeeType,
        mode: RegistrationMode,
    ) -> Vec<&PackageDefinition> {
        self.packages
            .iter()
            .filter(|p| p.is_available_to(attendee_type, mode))
            .collect()
    }

    /// Active, not sold out tickets this attendee may buy à la carte.
    pub fn tickets_for(&self, attendee_type: AttendeeType) -> Vec<&TicketDefinition> {
        self.tickets
            .iter()
            .filter(|t| t.is_active && !t.capacity.is_sold_out() && t.is_eligible(attendee_type))
            .collect()
    }

    /// Reports every malformed package instead of stopping at the first.
    ///
    /// ## Checks
    /// - `includes` must be non-empty
    /// - every included id must be a ticket in this snapshot
    pub fn check_integrity(&self) -> Vec<CoreError> {
        let mut problems = Vec::new();
        for package in &self.packages {
            if let Err(e) = package.ensure_has_tickets() {
                problems.push(e);
                continue;
            }
            for ticket_id in &package.includes {
                if self.ticket(ticket_id).is_none() {
                    problems.push(CoreError::DanglingPackageTicket {
                        package_id: package.id.clone(),
                        ticket_id: ticket_id.clone(),
                    });
                }
            }
        }
        problems
    }
}

// =============================================================================
// Test Fixtures
// =============================================================================


// =============================================================================
// Unit Tests
// =============================================================================
