//! # Pricing Aggregator
//!
//! Pure folds from ledger state to money and counts.
//!
//! ## Pricing Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  SelectionLedger ──┐                                                    │
//! │                    ├──► compute_order_summary() ──► OrderSummary        │
//! │  LodgeBulk ────────┤          │                                         │
//! │                    │          └── reads unit prices ONLY from           │
//! │  CapturedPrices ───┘              CapturedPrices                        │
//! │                                                                         │
//! │  Attendee subtotal =                                                    │
//! │      Σ package.quantity × captured package price                        │
//! │    + Σ ticket.quantity  × captured ticket price                         │
//! │                                                                         │
//! │  Included tickets inside a package are never priced: a $180 bundle      │
//! │  holding a $150 ticket costs $180, not $150 and not $330.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A missing captured price is a configuration error, never a $0 line.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::{PackageDefinition, TicketDefinition};
use crate::error::{CoreError, CoreResult};
use crate::lodge::LodgeBulkSelection;
use crate::metadata::CapturedMetadata;
use crate::money::Money;
use crate::selection::{AttendeeSelection, SelectionLedger};
use crate::types::RegistrationMode;

// =============================================================================
// Captured Prices
// =============================================================================

/// Unit prices pinned when each item was first selected.
///
/// Later catalog re-pricing does not touch an existing registration: the
/// first capture for an id wins until the registration explicitly
/// re-captures it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CapturedPrices {
    #[serde(default)]
    pub packages: BTreeMap<String, Money>,
    #[serde(default)]
    pub tickets: BTreeMap<String, Money>,
}

impl CapturedPrices {
    pub fn capture_package(&mut self, package: &PackageDefinition) -> Money {
        *self
            .packages
            .entry(package.id.clone())
            .or_insert(package.price)
    }

    /// Overwrites any earlier price for the package.
    pub fn recapture_package(&mut self, package: &PackageDefinition) -> Money {
        self.packages.insert(package.id.clone(), package.price);
        package.price
    }

    pub fn capture_ticket(&mut self, ticket: &TicketDefinition) -> Money {
        *self.tickets.entry(ticket.id.clone()).or_insert(ticket.price)
    }

    pub fn package_price(&self, package_id: &str) -> CoreResult<Money> {
        self.packages
            .get(package_id)
            .copied()
            .ok_or_else(|| CoreError::missing_price("package", package_id))
    }

    pub fn ticket_price(&self, ticket_id: &str) -> CoreResult<Money> {
        self.tickets
            .get(ticket_id)
            .copied()
            .ok_or_else(|| CoreError::missing_price("ticket", ticket_id))
    }

    /// Rebuilds prices from display metadata.
    ///
    /// Only for drafts written before prices were stored separately.
    pub fn from_metadata(metadata: &CapturedMetadata) -> Self {
        CapturedPrices {
            packages: metadata
                .packages
                .iter()
                .map(|(id, p)| (id.clone(), p.price))
                .collect(),
            tickets: metadata
                .tickets
                .iter()
                .map(|(id, t)| (id.clone(), t.price))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty() && self.tickets.is_empty()
    }

    /// Every captured price with its wire path, e.g. `capturedPrices.tickets.tkt-gala`.
    pub fn entries(&self) -> impl Iterator<Item = (String, Money)> + '_ {
        let packages = self
            .packages
            .iter()
            .map(|(id, price)| (format!("capturedPrices.packages.{id}"), *price));
        let tickets = self
            .tickets
            .iter()
            .map(|(id, price)| (format!("capturedPrices.tickets.{id}"), *price));
        packages.chain(tickets)
    }
}

/// `unit × quantity`, failing instead of wrapping.
pub fn line_total(unit_price: Money, quantity: u32, item: &str) -> CoreResult<Money> {
    unit_price
        .checked_multiply_quantity(quantity)
        .ok_or_else(|| CoreError::price_overflow(item))
}

fn add_to(total: &mut Money, amount: Money, item: &str) -> CoreResult<()> {
    *total = total
        .checked_add(amount)
        .ok_or_else(|| CoreError::price_overflow(item))?;
    Ok(())
}

// =============================================================================
// Order Summary
// =============================================================================

/// Order-level totals. Always derived from ledger state, never set by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub function_id: String,
    pub registration_type: RegistrationMode,
    pub total_attendees: u32,
    pub total_packages: u32,
    pub total_tickets: u32,
    pub subtotal: Money,
}

impl OrderSummary {
    /// Summary of a registration with nothing selected.
    pub fn empty(function_id: &str, mode: RegistrationMode) -> Self {
        OrderSummary {
            function_id: function_id.to_string(),
            registration_type: mode,
            total_attendees: 0,
            total_packages: 0,
            total_tickets: 0,
            subtotal: Money::zero(),
        }
    }
}

/// Subtotal split by category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SubtotalBreakdown {
    pub packages: Money,
    pub individual_tickets: Money,
    pub lodge_bulk: Money,
}

impl SubtotalBreakdown {
    pub fn total(&self) -> CoreResult<Money> {
        let mut total = self.packages;
        add_to(&mut total, self.individual_tickets, "subtotal")?;
        add_to(&mut total, self.lodge_bulk, "subtotal")?;
        Ok(total)
    }
}

/// Prices one attendee's selection.
///
/// ## Example
/// ```rust,ignore
/// // Full Weekend Package at $180 containing a $150 Gala Dinner
/// let subtotal = compute_attendee_subtotal(&selection, &prices)?;
/// assert_eq!(subtotal.cents(), 18000);
/// ```
pub fn compute_attendee_subtotal(
    selection: &AttendeeSelection,
    prices: &CapturedPrices,
) -> CoreResult<Money> {
    attendee_breakdown(selection, prices)?.total()
}

fn attendee_breakdown(
    selection: &AttendeeSelection,
    prices: &CapturedPrices,
) -> CoreResult<SubtotalBreakdown> {
    let mut breakdown = SubtotalBreakdown::default();
    for package in &selection.packages {
        let item = format!("package {}", package.package_id);
        let unit_price = prices.package_price(&package.package_id)?;
        let amount = line_total(unit_price, package.quantity, &item)?;
        add_to(&mut breakdown.packages, amount, &item)?;
    }
    for ticket in &selection.individual_tickets {
        let item = format!("ticket {}", ticket.ticket_id);
        let unit_price = prices.ticket_price(&ticket.ticket_id)?;
        let amount = line_total(unit_price, ticket.quantity, &item)?;
        add_to(&mut breakdown.individual_tickets, amount, &item)?;
    }
    Ok(breakdown)
}

/// Totals by category for whichever ledger the mode makes authoritative.
pub fn compute_breakdown(
    mode: RegistrationMode,
    selections: &SelectionLedger,
    lodge_bulk: Option<&LodgeBulkSelection>,
    prices: &CapturedPrices,
) -> CoreResult<SubtotalBreakdown> {
    if mode.uses_lodge_bulk() {
        return Ok(SubtotalBreakdown {
            lodge_bulk: lodge_bulk.map(|b| b.subtotal).unwrap_or_default(),
            ..SubtotalBreakdown::default()
        });
    }

    let mut total = SubtotalBreakdown::default();
    for (_, selection) in selections.iter() {
        let attendee = attendee_breakdown(selection, prices)?;
        add_to(&mut total.packages, attendee.packages, "packages")?;
        add_to(&mut total.individual_tickets, attendee.individual_tickets, "individual tickets")?;
    }
    Ok(total)
}

/// Folds ledger state into one [`OrderSummary`].
///
/// ## Modes
/// - individuals / delegation: sums over attendees with at least one selection
/// - lodge: `totalAttendees` and `totalTickets` are the tickets the bulk
///   purchase will generate; `totalPackages` is the bulk quantity
pub fn compute_order_summary(
    function_id: &str,
    mode: RegistrationMode,
    selections: &SelectionLedger,
    lodge_bulk: Option<&LodgeBulkSelection>,
    prices: &CapturedPrices,
) -> CoreResult<OrderSummary> {
    let mut summary = OrderSummary::empty(function_id, mode);

    if mode.uses_lodge_bulk() {
        if let Some(bulk) = lodge_bulk {
            summary.total_attendees = bulk.will_generate_tickets;
            summary.total_packages = bulk.quantity;
            summary.total_tickets = bulk.will_generate_tickets;
            summary.subtotal = bulk.subtotal;
        }
        return Ok(summary);
    }

    for (attendee_id, selection) in selections.iter() {
        let attendee_subtotal = compute_attendee_subtotal(selection, prices)?;
        add_to(&mut summary.subtotal, attendee_subtotal, attendee_id)?;
        summary.total_packages += selection.package_count();
        summary.total_tickets += selection.ticket_count();
    }
    summary.total_attendees = selections.active_attendee_count();
    Ok(summary)
}

// =============================================================================
// Order Lines
// =============================================================================

/// What an order line represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderLineKind {
    Package,
    /// A ticket inside a package. Shown, never charged.
    IncludedTicket,
    IndividualTicket,
    LodgeBulk,
}

/// One display row of the order review step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    /// `None` for lodge bulk rows.
    pub attendee_id: Option<String>,
    pub kind: OrderLineKind,
    pub item_id: String,
    pub name: String,
    pub quantity: u32,
    /// `None` for included tickets.
    pub unit_price: Option<Money>,
    pub line_total: Money,
}

impl OrderLine {
    /// "Included" for bundled tickets, otherwise the line total.
    pub fn price_label(&self) -> String {
        match self.kind {
            OrderLineKind::IncludedTicket => "Included".to_string(),
            _ => self.line_total.to_string(),
        }
    }
}

/// Display rows for the current order, in ledger order.
///
/// Names come from captured metadata and fall back to the id.
pub fn order_lines(
    mode: RegistrationMode,
    selections: &SelectionLedger,
    lodge_bulk: Option<&LodgeBulkSelection>,
    prices: &CapturedPrices,
    metadata: &CapturedMetadata,
) -> CoreResult<Vec<OrderLine>> {
    let package_name = |id: &str| metadata.package_name(id).unwrap_or(id).to_string();
    let ticket_name = |id: &str| metadata.ticket_name(id).unwrap_or(id).to_string();

    let mut lines = Vec::new();

    if mode.uses_lodge_bulk() {
        if let Some(bulk) = lodge_bulk {
            lines.push(OrderLine {
                attendee_id: None,
                kind: OrderLineKind::LodgeBulk,
                item_id: bulk.package_id.clone(),
                name: package_name(&bulk.package_id),
                quantity: bulk.quantity,
                unit_price: Some(prices.package_price(&bulk.package_id)?),
                line_total: bulk.subtotal,
            });
        }
        return Ok(lines);
    }

    for (attendee_id, selection) in selections.iter() {
        for package in &selection.packages {
            let unit_price = prices.package_price(&package.package_id)?;
            lines.push(OrderLine {
                attendee_id: Some(attendee_id.clone()),
                kind: OrderLineKind::Package,
                item_id: package.package_id.clone(),
                name: package_name(&package.package_id),
                quantity: package.quantity,
                unit_price: Some(unit_price),
                line_total: line_total(unit_price, package.quantity, &package.package_id)?,
            });
            for included in &package.tickets {
                lines.push(OrderLine {
                    attendee_id: Some(attendee_id.clone()),
                    kind: OrderLineKind::IncludedTicket,
                    item_id: included.ticket_id.clone(),
                    name: ticket_name(&included.ticket_id),
                    quantity: included.quantity * package.quantity,
                    unit_price: None,
                    line_total: Money::zero(),
                });
            }
        }
        for ticket in &selection.individual_tickets {
            let unit_price = prices.ticket_price(&ticket.ticket_id)?;
            lines.push(OrderLine {
                attendee_id: Some(attendee_id.clone()),
                kind: OrderLineKind::IndividualTicket,
                item_id: ticket.ticket_id.clone(),
                name: ticket_name(&ticket.ticket_id),
                quantity: ticket.quantity,
                unit_price: Some(unit_price),
                line_total: line_total(unit_price, ticket.quantity, &ticket.ticket_id)?,
            });
        }
    }
    Ok(lines)
}

// =============================================================================
// Unit Tests
// =============================================================================
