//! # Legacy Adapter
//!
//! Converts between the old one-ticket-definition-per-attendee selection
//! shape and the current packages / individualTickets shape.
//!
//! ## Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Legacy                              Enhanced                           │
//! │  ──────                              ────────                           │
//! │  { ticketDefinitionId: "pkg-1",  ──► packages: [{ packageId: "pkg-1",   │
//! │    selectedEvents: [e1, e2] }          quantity: 1,                     │
//! │                                        tickets: [e1 ×1, e2 ×1] }]       │
//! │                                                                         │
//! │  { ticketDefinitionId: null,     ──► individualTickets: [e1 ×1, e2 ×1]  │
//! │    selectedEvents: [e1, e2] }                                           │
//! │                                                                         │
//! │  { ticketDefinitionId: null,     ──► empty selection                    │
//! │    selectedEvents: [] }                                                 │
//! │                                                                         │
//! │  Enhanced ──► Legacy is lossy. to_legacy_summary() reports every        │
//! │  LegacyLoss instead of narrowing silently.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::selection::{AttendeeSelection, PackageSelection, TicketSelectionItem};

/// One attendee's selection in the old shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LegacyPackageSelection {
    #[serde(default)]
    pub ticket_definition_id: Option<String>,
    #[serde(default)]
    pub selected_events: Vec<String>,
}

/// A selection map, classified once at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionShape {
    Legacy(BTreeMap<String, LegacyPackageSelection>),
    Enhanced(BTreeMap<String, AttendeeSelection>),
}

impl SelectionShape {
    /// Classifies a raw attendee-keyed map by the keys its entries carry.
    ///
    /// An empty map is enhanced. Entries mixing both shapes are rejected.
    pub fn from_value(value: &Value) -> CoreResult<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| CoreError::MalformedDraft("selections must be an object".to_string()))?;

        let mut legacy = false;
        let mut enhanced = false;
        for (attendee_id, entry) in map {
            let entry = entry.as_object().ok_or_else(|| {
                CoreError::MalformedDraft(format!("selection for {} must be an object", attendee_id))
            })?;
            legacy |= entry.contains_key("ticketDefinitionId") || entry.contains_key("selectedEvents");
            enhanced |= entry.contains_key("packages") || entry.contains_key("individualTickets");
        }

        if legacy && enhanced {
            return Err(CoreError::MalformedDraft(
                "selections mix legacy and current shapes".to_string(),
            ));
        }

        let parse_error = |e: serde_json::Error| CoreError::MalformedDraft(e.to_string());
        if legacy {
            Ok(SelectionShape::Legacy(
                serde_json::from_value(value.clone()).map_err(parse_error)?,
            ))
        } else {
            Ok(SelectionShape::Enhanced(
                serde_json::from_value(value.clone()).map_err(parse_error)?,
            ))
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, SelectionShape::Legacy(_))
    }

    /// Converts to the enhanced shape. Never loses data.
    pub fn into_enhanced(self) -> BTreeMap<String, AttendeeSelection> {
        match self {
            SelectionShape::Legacy(map) => to_enhanced(&map),
            SelectionShape::Enhanced(map) => map,
        }
    }
}

fn single_quantity(ids: &[String]) -> Vec<TicketSelectionItem> {
    ids.iter()
        .map(|ticket_id| TicketSelectionItem {
            ticket_id: ticket_id.clone(),
            quantity: 1,
        })
        .collect()
}

/// Converts a legacy selection map to the enhanced shape.
pub fn to_enhanced(
    legacy: &BTreeMap<String, LegacyPackageSelection>,
) -> BTreeMap<String, AttendeeSelection> {
    legacy
        .iter()
        .map(|(attendee_id, entry)| {
            let selection = match &entry.ticket_definition_id {
                Some(package_id) => AttendeeSelection {
                    packages: vec![PackageSelection {
                        package_id: package_id.clone(),
                        quantity: 1,
                        tickets: single_quantity(&entry.selected_events),
                    }],
                    individual_tickets: Vec::new(),
                },
                None => AttendeeSelection {
                    packages: Vec::new(),
                    individual_tickets: single_quantity(&entry.selected_events),
                },
            };
            debug!(attendee_id = %attendee_id, "Converted legacy selection");
            (attendee_id.clone(), selection)
        })
        .collect()
}

// =============================================================================
// Lossy Projection
// =============================================================================

/// Something the legacy shape could not hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LegacyLoss {
    /// Quantity above 1 collapsed to a single entry.
    QuantityCollapsed {
        attendee_id: String,
        item_id: String,
        quantity: u32,
    },
    /// Legacy holds one package per attendee; later ones are dropped.
    PackageDropped {
        attendee_id: String,
        package_id: String,
    },
    /// Individual tickets cannot sit beside a legacy package.
    IndividualTicketDropped {
        attendee_id: String,
        ticket_id: String,
    },
}

/// Legacy selection plus everything that did not fit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LegacyProjection {
    pub selection: BTreeMap<String, LegacyPackageSelection>,
    pub losses: Vec<LegacyLoss>,
}

impl LegacyProjection {
    pub fn is_lossless(&self) -> bool {
        self.losses.is_empty()
    }
}

/// Summarises enhanced selections in the legacy shape.
///
/// Callers asking for this accept that quantities and extra entries may be
/// summarised; each such case is listed in `losses`.
pub fn to_legacy_summary(enhanced: &BTreeMap<String, AttendeeSelection>) -> LegacyProjection {
    let mut projection = LegacyProjection::default();

    for (attendee_id, selection) in enhanced {
        let mut legacy = LegacyPackageSelection::default();

        if let Some((first, rest)) = selection.packages.split_first() {
            legacy.ticket_definition_id = Some(first.package_id.clone());
            legacy.selected_events = first.tickets.iter().map(|t| t.ticket_id.clone()).collect();

            if first.quantity > 1 {
                projection.losses.push(LegacyLoss::QuantityCollapsed {
                    attendee_id: attendee_id.clone(),
                    item_id: first.package_id.clone(),
                    quantity: first.quantity,
                });
            }
            for dropped in rest {
                projection.losses.push(LegacyLoss::PackageDropped {
                    attendee_id: attendee_id.clone(),
                    package_id: dropped.package_id.clone(),
                });
            }
            for ticket in &selection.individual_tickets {
                projection.losses.push(LegacyLoss::IndividualTicketDropped {
                    attendee_id: attendee_id.clone(),
                    ticket_id: ticket.ticket_id.clone(),
                });
            }
        } else {
            for ticket in &selection.individual_tickets {
                legacy.selected_events.push(ticket.ticket_id.clone());
                if ticket.quantity > 1 {
                    projection.losses.push(LegacyLoss::QuantityCollapsed {
                        attendee_id: attendee_id.clone(),
                        item_id: ticket.ticket_id.clone(),
                        quantity: ticket.quantity,
                    });
                }
            }
        }

        projection.selection.insert(attendee_id.clone(), legacy);
    }
    projection
}
