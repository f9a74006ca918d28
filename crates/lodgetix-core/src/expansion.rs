//! # Package Expansion Engine
//!
//! Turns a chosen package into the constituent ticket line items it stands
//! for, each tagged with the package it came from.
//!
//! ## Expansion Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  package.includes = [t1, t2]      quantity = 3                          │
//! │                                                                         │
//! │  expand() ──►  t1 (copy 1)  t1 (copy 2)  t1 (copy 3)                    │
//! │                t2 (copy 1)  t2 (copy 2)  t2 (copy 3)                    │
//! │                                                                         │
//! │  6 line items, each quantity 1, each packageId = package.id            │
//! │  (N copies of every constituent, not one merged line of quantity N)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All functions here are pure. An empty `includes` list is a catalog
//! mistake and fails with [`CoreError::EmptyPackage`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::PackageDefinition;
use crate::error::{CoreError, CoreResult};
use crate::selection::{PackageSelection, TicketSelectionItem};
use crate::MAX_SELECTION_QUANTITY;

/// One attendee-attributable ticket produced by expanding a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TicketLineItem {
    pub attendee_id: String,
    pub ticket_id: String,
    pub package_id: String,
    /// Which copy of the package this ticket belongs to (1-based).
    pub copy: u32,
    pub quantity: u32,
}

/// Checks a selection quantity: at least 1, at most the global cap.
pub fn check_quantity(quantity: u32) -> CoreResult<()> {
    if quantity == 0 {
        return Err(CoreError::InvalidQuantity { quantity: 0 });
    }
    if quantity > MAX_SELECTION_QUANTITY {
        return Err(CoreError::QuantityTooLarge {
            requested: quantity,
            max: MAX_SELECTION_QUANTITY,
        });
    }
    Ok(())
}

/// Expands `package` bought `quantity` times for one attendee.
///
/// ## Errors
/// - [`CoreError::EmptyPackage`] if the package includes no tickets
/// - [`CoreError::InvalidQuantity`] / [`CoreError::QuantityTooLarge`]
///
/// ## Example
/// ```rust
/// use lodgetix_core::catalog::PackageDefinition;
/// use lodgetix_core::expansion::expand;
/// use lodgetix_core::money::Money;
///
/// let package = PackageDefinition {
///     id: "pkg-1".into(),
///     name: "Dinner & Lunch".into(),
///     price: Money::from_cents(20000),
///     original_price: None,
///     discount: None,
///     includes: vec!["t1".into(), "t2".into()],
///     eligible_attendee_types: vec![],
///     eligible_registration_types: vec![],
///     is_active: true,
/// };
///
/// let items = expand(&package, "att-1", 3).unwrap();
/// assert_eq!(items.len(), 6);
/// assert!(items.iter().all(|i| i.package_id == "pkg-1"));
/// ```
pub fn expand(
    package: &PackageDefinition,
    attendee_id: &str,
    quantity: u32,
) -> CoreResult<Vec<TicketLineItem>> {
    package.ensure_has_tickets()?;
    check_quantity(quantity)?;

    let mut items = Vec::with_capacity(package.includes.len() * quantity as usize);
    for ticket_id in &package.includes {
        for copy in 1..=quantity {
            items.push(TicketLineItem {
                attendee_id: attendee_id.to_string(),
                ticket_id: ticket_id.clone(),
                package_id: package.id.clone(),
                copy,
                quantity: 1,
            });
        }
    }
    Ok(items)
}

/// Builds the per-copy provenance list stored on a package selection.
///
/// Repeated ids in `includes` are counted, so a table of ten identical
/// seats becomes one entry of quantity 10. Order follows first appearance.
pub fn provenance_tickets(package: &PackageDefinition) -> CoreResult<Vec<TicketSelectionItem>> {
    package.ensure_has_tickets()?;

    let mut order: Vec<&str> = Vec::new();
    let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
    for ticket_id in &package.includes {
        let count = counts.entry(ticket_id.as_str()).or_insert(0);
        if *count == 0 {
            order.push(ticket_id.as_str());
        }
        *count += 1;
    }

    Ok(order
        .into_iter()
        .map(|ticket_id| TicketSelectionItem {
            ticket_id: ticket_id.to_string(),
            quantity: counts[ticket_id],
        })
        .collect())
}

/// Re-expands a stored package selection from its provenance copy.
///
/// Uses `selection.tickets`, not the live catalog, so a historical order
/// still expands to what was bought even if the package later changed.
pub fn expand_selection(
    attendee_id: &str,
    selection: &PackageSelection,
) -> CoreResult<Vec<TicketLineItem>> {
    if selection.tickets.is_empty() {
        return Err(CoreError::EmptyPackage {
            package_id: selection.package_id.clone(),
        });
    }
    check_quantity(selection.quantity)?;

    let mut items = Vec::new();
    for ticket in &selection.tickets {
        for copy in 1..=selection.quantity {
            for _ in 0..ticket.quantity {
                items.push(TicketLineItem {
                    attendee_id: attendee_id.to_string(),
                    ticket_id: ticket.ticket_id.clone(),
                    package_id: selection.package_id.clone(),
                    copy,
                    quantity: 1,
                });
            }
        }
    }
    Ok(items)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures;

    #[test]
    fn test_expand_yields_copies_per_included_ticket() {
        let package = fixtures::dinner_and_lunch(); // includes gala + lunch
        let items = expand(&package, "att-1", 3).unwrap();

        assert_eq!(items.len(), 6);
        assert_eq!(items.iter().filter(|i| i.ticket_id == "tkt-gala").count(), 3);
        assert_eq!(items.iter().filter(|i| i.ticket_id == "tkt-lunch").count(), 3);
        assert!(items.iter().all(|i| i.package_id == "pkg-dinner-lunch"));
        assert!(items.iter().all(|i| i.attendee_id == "att-1" && i.quantity == 1));

        let copies: Vec<u32> = items
            .iter()
            .filter(|i| i.ticket_id == "tkt-gala")
            .map(|i| i.copy)
            .collect();
        assert_eq!(copies, vec![1, 2, 3]);
    }

    #[test]
    fn test_expand_empty_package_is_configuration_error() {
        let err = expand(&fixtures::empty_package(), "att-1", 1).unwrap_err();
        assert!(matches!(err, CoreError::EmptyPackage { ref package_id } if package_id == "pkg-empty"));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_expand_rejects_zero_and_oversized_quantity() {
        let package = fixtures::full_weekend();
        assert!(matches!(
            expand(&package, "att-1", 0),
            Err(CoreError::InvalidQuantity { quantity: 0 })
        ));
        assert!(matches!(
            expand(&package, "att-1", MAX_SELECTION_QUANTITY + 1),
            Err(CoreError::QuantityTooLarge { .. })
        ));
    }

    #[test]
    fn test_provenance_counts_repeated_includes() {
        let tickets = provenance_tickets(&fixtures::lodge_table()).unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].ticket_id, "tkt-gala");
        assert_eq!(tickets[0].quantity, 10);

        let tickets = provenance_tickets(&fixtures::dinner_and_lunch()).unwrap();
        let ids: Vec<&str> = tickets.iter().map(|t| t.ticket_id.as_str()).collect();
        assert_eq!(ids, vec!["tkt-gala", "tkt-lunch"]);
    }

    #[test]
    fn test_expand_selection_uses_stored_provenance() {
        let selection = PackageSelection {
            package_id: "pkg-table".to_string(),
            quantity: 2,
            tickets: vec![TicketSelectionItem {
                ticket_id: "tkt-gala".to_string(),
                quantity: 10,
            }],
        };

        let items = expand_selection("att-1", &selection).unwrap();
        assert_eq!(items.len(), 20);
        assert_eq!(items.iter().filter(|i| i.copy == 2).count(), 10);
    }
}
