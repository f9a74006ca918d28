//! # Selection Ledger
//!
//! Per-attendee record of what each person receives: bundled packages and
//! à la carte tickets.
//!
//! ## Ledger Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SelectionLedger  (wire key: ticketSelections)                          │
//! │                                                                         │
//! │  "att-1" ──► AttendeeSelection                                          │
//! │              ├── packages                                               │
//! │              │   └── { packageId: pkg-weekend, quantity: 1,             │
//! │              │         tickets: [{ ticketId: tkt-gala, quantity: 1 }] } │
//! │              │                      ▲                                   │
//! │              │                      └── provenance copy, frozen at      │
//! │              │                          selection time                  │
//! │              └── individualTickets                                      │
//! │                  └── { ticketId: tkt-lunch, quantity: 2 }               │
//! │                                                                         │
//! │  "att-2" ──► AttendeeSelection { packages: [], individualTickets: [] }  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//! - Adding the same package or ticket again replaces the entry's quantity.
//! - Removing something that is not there is a no-op.
//! - The ledger does not deduplicate a ticket that appears both inside a
//!   package and as an individual ticket; see
//!   [`find_package_ticket_overlaps`](crate::validation::find_package_ticket_overlaps).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::catalog::{PackageDefinition, TicketDefinition};
use crate::error::CoreResult;
use crate::expansion::{check_quantity, expand, provenance_tickets};
use crate::types::SelectionKind;

// =============================================================================
// Wire Types
// =============================================================================

/// A ticket id with a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TicketSelectionItem {
    pub ticket_id: String,
    pub quantity: u32,
}

/// A package chosen by one attendee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PackageSelection {
    pub package_id: String,
    pub quantity: u32,
    /// Tickets one copy of the package contained when it was chosen.
    pub tickets: Vec<TicketSelectionItem>,
}

impl PackageSelection {
    /// Tickets in one copy of this package, per the stored provenance.
    pub fn tickets_per_package(&self) -> u32 {
        self.tickets.iter().map(|t| t.quantity).sum()
    }

    /// Tickets this entry stands for across every copy.
    pub fn total_tickets(&self) -> u32 {
        self.quantity * self.tickets_per_package()
    }

    /// Returns true if the package provenance lists `ticket_id`.
    pub fn contains_ticket(&self, ticket_id: &str) -> bool {
        self.tickets.iter().any(|t| t.ticket_id == ticket_id)
    }
}

/// Everything one attendee has chosen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeSelection {
    #[serde(default)]
    pub packages: Vec<PackageSelection>,
    #[serde(default)]
    pub individual_tickets: Vec<TicketSelectionItem>,
}

impl AttendeeSelection {
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty() && self.individual_tickets.is_empty()
    }

    pub fn package(&self, package_id: &str) -> Option<&PackageSelection> {
        self.packages.iter().find(|p| p.package_id == package_id)
    }

    pub fn individual_ticket(&self, ticket_id: &str) -> Option<&TicketSelectionItem> {
        self.individual_tickets.iter().find(|t| t.ticket_id == ticket_id)
    }

    /// Sum of package quantities.
    pub fn package_count(&self) -> u32 {
        self.packages.iter().map(|p| p.quantity).sum()
    }

    /// Individual ticket quantities plus every ticket implied by packages.
    pub fn ticket_count(&self) -> u32 {
        let individual: u32 = self.individual_tickets.iter().map(|t| t.quantity).sum();
        let bundled: u32 = self.packages.iter().map(PackageSelection::total_tickets).sum();
        individual + bundled
    }

    fn upsert_package(&mut self, entry: PackageSelection) {
        match self
            .packages
            .iter_mut()
            .find(|p| p.package_id == entry.package_id)
        {
            Some(existing) => *existing = entry,
            None => self.packages.push(entry),
        }
    }

    fn upsert_ticket(&mut self, entry: TicketSelectionItem) {
        match self
            .individual_tickets
            .iter_mut()
            .find(|t| t.ticket_id == entry.ticket_id)
        {
            Some(existing) => existing.quantity = entry.quantity,
            None => self.individual_tickets.push(entry),
        }
    }

    fn remove(&mut self, kind: SelectionKind, id: &str) -> bool {
        let before = self.packages.len() + self.individual_tickets.len();
        match kind {
            SelectionKind::Package => self.packages.retain(|p| p.package_id != id),
            SelectionKind::IndividualTicket => self.individual_tickets.retain(|t| t.ticket_id != id),
        }
        before != self.packages.len() + self.individual_tickets.len()
    }

    fn clear(&mut self) {
        self.packages.clear();
        self.individual_tickets.clear();
    }
}

// =============================================================================
// Selection Ledger
// =============================================================================

/// All attendee selections for one registration, keyed by attendee id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SelectionLedger(BTreeMap<String, AttendeeSelection>);

impl SelectionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(attendees: BTreeMap<String, AttendeeSelection>) -> Self {
        SelectionLedger(attendees)
    }

    pub fn as_map(&self) -> &BTreeMap<String, AttendeeSelection> {
        &self.0
    }

    pub fn get(&self, attendee_id: &str) -> Option<&AttendeeSelection> {
        self.0.get(attendee_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttendeeSelection)> {
        self.0.iter()
    }

    /// True when no attendee has anything selected.
    pub fn is_empty(&self) -> bool {
        self.0.values().all(AttendeeSelection::is_empty)
    }

    /// Attendees holding at least one selection.
    pub fn active_attendee_count(&self) -> u32 {
        self.0.values().filter(|s| !s.is_empty()).count() as u32
    }

    /// Selects `package` for an attendee, replacing any earlier entry for it.
    ///
    /// The package is expanded first, so an empty or inactive package fails
    /// here instead of landing in the ledger.
    ///
    /// ## Errors
    /// - [`CoreError::EmptyPackage`](crate::CoreError::EmptyPackage)
    /// - [`CoreError::InactiveCatalogItem`](crate::CoreError::InactiveCatalogItem)
    /// - quantity errors from [`check_quantity`]
    pub fn add_package_selection(
        &mut self,
        attendee_id: &str,
        package: &PackageDefinition,
        quantity: u32,
    ) -> CoreResult<()> {
        package.ensure_on_sale()?;
        let line_items = expand(package, attendee_id, quantity)?;
        let entry = PackageSelection {
            package_id: package.id.clone(),
            quantity,
            tickets: provenance_tickets(package)?,
        };

        debug!(
            attendee_id = %attendee_id,
            package_id = %package.id,
            quantity,
            line_items = line_items.len(),
            "Package selected"
        );

        self.0
            .entry(attendee_id.to_string())
            .or_default()
            .upsert_package(entry);
        Ok(())
    }

    /// Selects an individual ticket, replacing any earlier quantity.
    pub fn add_individual_ticket(
        &mut self,
        attendee_id: &str,
        ticket: &TicketDefinition,
        quantity: u32,
    ) -> CoreResult<()> {
        ticket.ensure_on_sale()?;
        check_quantity(quantity)?;

        debug!(attendee_id = %attendee_id, ticket_id = %ticket.id, quantity, "Ticket selected");

        self.0
            .entry(attendee_id.to_string())
            .or_default()
            .upsert_ticket(TicketSelectionItem {
                ticket_id: ticket.id.clone(),
                quantity,
            });
        Ok(())
    }

    /// Removes a package or individual ticket entry. Returns whether
    /// anything was removed.
    pub fn remove_selection(&mut self, attendee_id: &str, kind: SelectionKind, id: &str) -> bool {
        let removed = self
            .0
            .get_mut(attendee_id)
            .map(|selection| selection.remove(kind, id))
            .unwrap_or(false);

        debug!(attendee_id = %attendee_id, %kind, id, removed, "Selection removed");
        removed
    }

    /// Empties both arrays for one attendee.
    pub fn clear_attendee(&mut self, attendee_id: &str) {
        if let Some(selection) = self.0.get_mut(attendee_id) {
            selection.clear();
        }
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
