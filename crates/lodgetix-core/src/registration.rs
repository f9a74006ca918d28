//! # Registration Mode Controller
//!
//! The one owned state object for a registration. Every change goes through
//! [`RegistrationState::apply`] with a [`RegistrationAction`].
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌─────────────┐   SetRegistrationType   ┌─────────────┐               │
//! │   │ individuals │◄───────────────────────►│ delegation  │               │
//! │   └──────┬──────┘   selections kept       └──────┬──────┘               │
//! │          │                                       │                      │
//! │          │ to lodge: attendee selections cleared │                      │
//! │          ▼                                       ▼                      │
//! │   ┌──────────────────────────────────────────────────────┐              │
//! │   │                        lodge                          │              │
//! │   │  only the Lodge Bulk Ledger is live                   │              │
//! │   └──────────────────────────────────────────────────────┘              │
//! │          │ away from lodge: lodgeBulkSelection = null                   │
//! │                                                                         │
//! │  apply(action):                                                         │
//! │    clone ──► mutate ──► recompute OrderSummary ──► commit               │
//! │    any error leaves the previous state untouched                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::{debug, info};

use crate::catalog::{FunctionDefinition, PackageDefinition, TicketDefinition};
use crate::error::{CoreError, CoreResult, FieldError, ValidationError};
use crate::expansion::{expand_selection, TicketLineItem};
use crate::lodge::{BookingContact, LodgeBulkSelection, LodgeDetails};
use crate::metadata::CapturedMetadata;
use crate::money::Money;
use crate::pricing::{
    compute_attendee_subtotal, compute_breakdown, compute_order_summary, order_lines,
    CapturedPrices, OrderLine, OrderSummary, SubtotalBreakdown,
};
use crate::selection::SelectionLedger;
use crate::types::{RegistrationMode, SelectionKind};
use crate::validation::{get_lodge_validation_errors, validate_registration};

// =============================================================================
// Actions
// =============================================================================

/// Every way the registration can change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationAction {
    SetRegistrationType(RegistrationMode),
    CaptureFunction(FunctionDefinition),
    AddPackage {
        attendee_id: String,
        package: PackageDefinition,
        quantity: u32,
    },
    AddIndividualTicket {
        attendee_id: String,
        ticket: TicketDefinition,
        quantity: u32,
    },
    RemoveSelection {
        attendee_id: String,
        kind: SelectionKind,
        id: String,
    },
    ClearAttendee {
        attendee_id: String,
    },
    SetLodgeBulkSelection {
        package: PackageDefinition,
        quantity: u32,
    },
    ClearLodgeBulkSelection,
    SetBookingContact(BookingContact),
    SetLodgeDetails(LodgeDetails),
    /// Back to an empty registration for the same function.
    Clear,
}

// =============================================================================
// Registration State
// =============================================================================

/// Full selection state for one registration session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationState {
    function_id: String,
    mode: RegistrationMode,
    selections: SelectionLedger,
    lodge_bulk: Option<LodgeBulkSelection>,
    metadata: CapturedMetadata,
    prices: CapturedPrices,
    booking_contact: Option<BookingContact>,
    lodge_details: Option<LodgeDetails>,
    summary: OrderSummary,
}

/// Everything a persisted draft restores, before the summary is derived.
#[derive(Debug, Clone, Default)]
pub struct RestoredParts {
    pub mode: RegistrationMode,
    pub selections: SelectionLedger,
    pub lodge_bulk: Option<LodgeBulkSelection>,
    pub metadata: CapturedMetadata,
    pub prices: CapturedPrices,
    pub booking_contact: Option<BookingContact>,
    pub lodge_details: Option<LodgeDetails>,
}

impl RegistrationState {
    /// Empty individuals registration for a function.
    pub fn new(function_id: impl Into<String>) -> Self {
        let function_id = function_id.into();
        let summary = OrderSummary::empty(&function_id, RegistrationMode::default());
        RegistrationState {
            function_id,
            mode: RegistrationMode::default(),
            selections: SelectionLedger::new(),
            lodge_bulk: None,
            metadata: CapturedMetadata::default(),
            prices: CapturedPrices::default(),
            booking_contact: None,
            lodge_details: None,
            summary,
        }
    }

    /// Rebuilds a state from restored parts and derives its summary.
    pub fn restore(function_id: impl Into<String>, parts: RestoredParts) -> CoreResult<Self> {
        let mut state = RegistrationState {
            mode: parts.mode,
            selections: parts.selections,
            lodge_bulk: parts.lodge_bulk,
            metadata: parts.metadata,
            prices: parts.prices,
            booking_contact: parts.booking_contact,
            lodge_details: parts.lodge_details,
            ..RegistrationState::new(function_id)
        };
        state.summary = state.recompute_summary()?;
        Ok(state)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn function_id(&self) -> &str {
        &self.function_id
    }

    pub fn mode(&self) -> RegistrationMode {
        self.mode
    }

    pub fn selections(&self) -> &SelectionLedger {
        &self.selections
    }

    pub fn lodge_bulk_selection(&self) -> Option<&LodgeBulkSelection> {
        self.lodge_bulk.as_ref()
    }

    pub fn metadata(&self) -> &CapturedMetadata {
        &self.metadata
    }

    pub fn prices(&self) -> &CapturedPrices {
        &self.prices
    }

    pub fn booking_contact(&self) -> Option<&BookingContact> {
        self.booking_contact.as_ref()
    }

    pub fn lodge_details(&self) -> Option<&LodgeDetails> {
        self.lodge_details.as_ref()
    }

    /// Summary maintained after every action.
    pub fn summary(&self) -> &OrderSummary {
        &self.summary
    }

    // -------------------------------------------------------------------------
    // Derived Views
    // -------------------------------------------------------------------------

    /// Summary computed from scratch. Always equal to [`summary`](Self::summary).
    pub fn recompute_summary(&self) -> CoreResult<OrderSummary> {
        compute_order_summary(
            &self.function_id,
            self.mode,
            &self.selections,
            self.lodge_bulk.as_ref(),
            &self.prices,
        )
    }

    pub fn attendee_subtotal(&self, attendee_id: &str) -> CoreResult<Money> {
        match self.selections.get(attendee_id) {
            Some(selection) => compute_attendee_subtotal(selection, &self.prices),
            None => Ok(Money::zero()),
        }
    }

    pub fn breakdown(&self) -> CoreResult<SubtotalBreakdown> {
        compute_breakdown(
            self.mode,
            &self.selections,
            self.lodge_bulk.as_ref(),
            &self.prices,
        )
    }

    pub fn order_lines(&self) -> CoreResult<Vec<OrderLine>> {
        order_lines(
            self.mode,
            &self.selections,
            self.lodge_bulk.as_ref(),
            &self.prices,
            &self.metadata,
        )
    }

    /// Tickets every selected package stands for, from stored provenance.
    pub fn package_line_items(&self) -> CoreResult<Vec<TicketLineItem>> {
        let mut items = Vec::new();
        for (attendee_id, selection) in self.selections.iter() {
            for package in &selection.packages {
                items.extend(expand_selection(attendee_id, package)?);
            }
        }
        Ok(items)
    }

    /// Checkout readiness for the current mode.
    pub fn validation_errors(&self) -> Vec<FieldError> {
        if self.mode.uses_lodge_bulk() {
            self.lodge_validation_errors()
        } else {
            validate_registration(&self.selections)
        }
    }

    pub fn lodge_validation_errors(&self) -> Vec<FieldError> {
        get_lodge_validation_errors(
            self.booking_contact.as_ref(),
            self.lodge_details.as_ref(),
            self.lodge_bulk.as_ref(),
        )
    }

    pub fn is_lodge_form_valid(&self) -> bool {
        self.lodge_validation_errors().is_empty()
    }

    // -------------------------------------------------------------------------
    // Reducer
    // -------------------------------------------------------------------------

    /// Applies one action. On error the state is left exactly as it was.
    pub fn apply(&mut self, action: RegistrationAction) -> CoreResult<()> {
        let mut next = self.clone();
        next.transition(action)?;
        next.summary = next.recompute_summary()?;
        *self = next;
        Ok(())
    }

    fn ensure_attendee_mode(&self, operation: &str) -> CoreResult<()> {
        if !self.mode.uses_attendee_selections() {
            return Err(CoreError::mode_mismatch(operation, self.mode));
        }
        Ok(())
    }

    fn transition(&mut self, action: RegistrationAction) -> CoreResult<()> {
        match action {
            RegistrationAction::SetRegistrationType(mode) => self.set_mode(mode),
            RegistrationAction::CaptureFunction(function) => {
                if function.id != self.function_id {
                    return Err(ValidationError::InvalidFormat {
                        field: "functionId".to_string(),
                        reason: format!(
                            "registration is for {}, not {}",
                            self.function_id, function.id
                        ),
                    }
                    .into());
                }
                self.metadata.capture_function(&function);
            }
            RegistrationAction::AddPackage {
                attendee_id,
                package,
                quantity,
            } => {
                self.ensure_attendee_mode("add a package for an attendee")?;
                package.ensure_offered_for(self.mode)?;
                let package = self.pin_package(&package);
                self.selections
                    .add_package_selection(&attendee_id, &package, quantity)?;
            }
            RegistrationAction::AddIndividualTicket {
                attendee_id,
                ticket,
                quantity,
            } => {
                self.ensure_attendee_mode("add a ticket for an attendee")?;
                self.selections
                    .add_individual_ticket(&attendee_id, &ticket, quantity)?;
                self.prices.capture_ticket(&ticket);
                self.metadata.capture_ticket(&ticket);
            }
            RegistrationAction::RemoveSelection {
                attendee_id,
                kind,
                id,
            } => {
                self.selections.remove_selection(&attendee_id, kind, &id);
            }
            RegistrationAction::ClearAttendee { attendee_id } => {
                debug!(attendee_id = %attendee_id, "Attendee selections cleared");
                self.selections.clear_attendee(&attendee_id);
            }
            RegistrationAction::SetLodgeBulkSelection { package, quantity } => {
                if !self.mode.uses_lodge_bulk() {
                    return Err(CoreError::mode_mismatch("set a lodge bulk selection", self.mode));
                }
                package.ensure_offered_for(self.mode)?;
                let package = self.pin_package(&package);
                let bulk = LodgeBulkSelection::for_package(&package, package.price, quantity)?;

                info!(
                    package_id = %bulk.package_id,
                    quantity = bulk.quantity,
                    will_generate_tickets = bulk.will_generate_tickets,
                    subtotal = %bulk.subtotal,
                    "Lodge bulk selection set"
                );
                self.lodge_bulk = Some(bulk);
            }
            RegistrationAction::ClearLodgeBulkSelection => {
                self.lodge_bulk = None;
            }
            RegistrationAction::SetBookingContact(contact) => {
                self.booking_contact = Some(contact);
            }
            RegistrationAction::SetLodgeDetails(details) => {
                self.lodge_details = Some(details);
            }
            RegistrationAction::Clear => {
                info!(function_id = %self.function_id, "Registration cleared");
                *self = RegistrationState::new(self.function_id.clone());
            }
        }
        Ok(())
    }

    /// The package as this registration prices and expands it.
    ///
    /// While any selection still refers to the id, its pinned price and
    /// included tickets are reused together. Once nothing does, the current
    /// definition is captured afresh.
    fn pin_package(&mut self, package: &PackageDefinition) -> PackageDefinition {
        if self.references_package(&package.id) {
            if let Ok(price) = self.prices.package_price(&package.id) {
                let mut pinned = PackageDefinition {
                    price,
                    ..package.clone()
                };
                match self.metadata.packages.get(&package.id) {
                    Some(snapshot) => {
                        pinned.original_price = snapshot.original_price;
                        pinned.includes = snapshot.included_ticket_ids.clone();
                    }
                    None => self.metadata.capture_package(&pinned),
                }
                return pinned;
            }
        }

        debug!(package_id = %package.id, price = %package.price, "Package captured");
        self.prices.recapture_package(package);
        self.metadata.recapture_package(package);
        package.clone()
    }

    fn references_package(&self, package_id: &str) -> bool {
        self.lodge_bulk
            .as_ref()
            .is_some_and(|bulk| bulk.package_id == package_id)
            || self
                .selections
                .iter()
                .any(|(_, selection)| selection.package(package_id).is_some())
    }

    fn set_mode(&mut self, mode: RegistrationMode) {
        if mode == self.mode {
            return;
        }

        if mode.uses_lodge_bulk() {
            self.selections.clear();
        }
        if self.mode.uses_lodge_bulk() {
            self.lodge_bulk = None;
        }

        info!(from = %self.mode, to = %mode, "Registration type changed");
        self.mode = mode;
    }

    // -------------------------------------------------------------------------
    // Convenience Wrappers
    // -------------------------------------------------------------------------

    pub fn set_registration_type(&mut self, mode: RegistrationMode) -> CoreResult<()> {
        self.apply(RegistrationAction::SetRegistrationType(mode))
    }

    pub fn add_package_selection(
        &mut self,
        attendee_id: &str,
        package: &PackageDefinition,
        quantity: u32,
    ) -> CoreResult<()> {
        self.apply(RegistrationAction::AddPackage {
            attendee_id: attendee_id.to_string(),
            package: package.clone(),
            quantity,
        })
    }

    pub fn add_individual_ticket(
        &mut self,
        attendee_id: &str,
        ticket: &TicketDefinition,
        quantity: u32,
    ) -> CoreResult<()> {
        self.apply(RegistrationAction::AddIndividualTicket {
            attendee_id: attendee_id.to_string(),
            ticket: ticket.clone(),
            quantity,
        })
    }

    pub fn remove_selection(
        &mut self,
        attendee_id: &str,
        kind: SelectionKind,
        id: &str,
    ) -> CoreResult<()> {
        self.apply(RegistrationAction::RemoveSelection {
            attendee_id: attendee_id.to_string(),
            kind,
            id: id.to_string(),
        })
    }

    pub fn clear_attendee(&mut self, attendee_id: &str) -> CoreResult<()> {
        self.apply(RegistrationAction::ClearAttendee {
            attendee_id: attendee_id.to_string(),
        })
    }

    pub fn set_lodge_bulk_selection(
        &mut self,
        package: &PackageDefinition,
        quantity: u32,
    ) -> CoreResult<()> {
        self.apply(RegistrationAction::SetLodgeBulkSelection {
            package: package.clone(),
            quantity,
        })
    }

    pub fn clear(&mut self) -> CoreResult<()> {
        self.apply(RegistrationAction::Clear)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures;
    use crate::pricing::OrderLineKind;

    fn state() -> RegistrationState {
        RegistrationState::new("fn-installation")
    }

    #[test]
    fn test_add_package_twice_is_idempotent() {
        let mut state = state();
        let package = fixtures::dinner_and_lunch();
        state.add_package_selection("att-1", &package, 2).unwrap();
        state.add_package_selection("att-1", &package, 2).unwrap();

        let selection = state.selections().get("att-1").unwrap();
        assert_eq!(selection.packages.len(), 1);
        assert_eq!(selection.packages[0].quantity, 2);
        assert_eq!(state.summary().total_packages, 2);
        assert_eq!(state.summary().subtotal.cents(), 40000);
    }

    #[test]
    fn test_full_weekend_scenario() {
        let mut state = state();
        state
            .add_package_selection("att-1", &fixtures::full_weekend(), 1)
            .unwrap();

        assert_eq!(state.attendee_subtotal("att-1").unwrap().cents(), 18000);
        assert_eq!(state.summary().subtotal.to_string(), "$180.00");
        assert_eq!(state.summary().total_tickets, 1);

        let lines = state.order_lines().unwrap();
        let included = lines
            .iter()
            .find(|l| l.kind == OrderLineKind::IncludedTicket)
            .unwrap();
        assert_eq!(included.item_id, "tkt-gala");
        assert_eq!(included.price_label(), "Included");
        assert!(included.line_total.is_zero());
    }

    #[test]
    fn test_lodge_scenario() {
        let mut state = state();
        state.set_registration_type(RegistrationMode::Lodge).unwrap();
        state
            .set_lodge_bulk_selection(&fixtures::lodge_table(), 2)
            .unwrap();

        let summary = state.summary();
        assert_eq!(summary.registration_type, RegistrationMode::Lodge);
        assert_eq!(summary.total_attendees, 20);
        assert_eq!(summary.total_packages, 2);
        assert_eq!(summary.subtotal.cents(), 390000);
        assert_eq!(state.breakdown().unwrap().lodge_bulk.cents(), 390000);
    }

    #[test]
    fn test_lodge_bulk_replaced_wholesale() {
        let mut state = state();
        state.set_registration_type(RegistrationMode::Lodge).unwrap();
        state
            .set_lodge_bulk_selection(&fixtures::lodge_table(), 2)
            .unwrap();
        state
            .set_lodge_bulk_selection(&fixtures::dinner_and_lunch(), 3)
            .unwrap();

        let bulk = state.lodge_bulk_selection().unwrap();
        assert_eq!(bulk.package_id, "pkg-dinner-lunch");
        assert_eq!(state.summary().total_tickets, 6);
        assert_eq!(state.summary().subtotal.cents(), 60000);
    }

    #[test]
    fn test_switch_away_from_lodge_clears_bulk() {
        let mut state = state();
        state.set_registration_type(RegistrationMode::Lodge).unwrap();
        state
            .set_lodge_bulk_selection(&fixtures::lodge_table(), 2)
            .unwrap();

        state
            .set_registration_type(RegistrationMode::Individuals)
            .unwrap();
        assert!(state.lodge_bulk_selection().is_none());
        assert_eq!(state.summary().subtotal, Money::zero());
        assert_eq!(state.summary().registration_type, RegistrationMode::Individuals);
    }

    #[test]
    fn test_switch_to_lodge_clears_attendee_selections() {
        let mut state = state();
        state
            .add_package_selection("att-1", &fixtures::full_weekend(), 1)
            .unwrap();

        state
            .set_registration_type(RegistrationMode::Delegation)
            .unwrap();
        assert_eq!(state.summary().total_attendees, 1);

        state.set_registration_type(RegistrationMode::Lodge).unwrap();
        assert!(state.selections().is_empty());
        assert_eq!(state.summary().total_attendees, 0);
    }

    #[test]
    fn test_mode_mismatch_leaves_state_untouched() {
        let mut state = state();
        let before = state.clone();

        let err = state
            .set_lodge_bulk_selection(&fixtures::lodge_table(), 1)
            .unwrap_err();
        assert!(matches!(err, CoreError::ModeMismatch { .. }));
        assert_eq!(state, before);

        state.set_registration_type(RegistrationMode::Lodge).unwrap();
        assert!(state
            .add_individual_ticket("att-1", &fixtures::gala_dinner(), 1)
            .is_err());
    }

    #[test]
    fn test_failed_action_does_not_capture_prices() {
        let mut state = state();
        assert!(state
            .add_package_selection("att-1", &fixtures::empty_package(), 1)
            .is_err());
        assert!(state.prices().is_empty());
        assert!(state.metadata().is_empty());
    }

    #[test]
    fn test_removals_are_idempotent() {
        let mut state = state();
        state
            .add_individual_ticket("att-1", &fixtures::farewell_lunch(), 2)
            .unwrap();

        state
            .remove_selection("att-1", SelectionKind::IndividualTicket, "tkt-lunch")
            .unwrap();
        state
            .remove_selection("att-1", SelectionKind::IndividualTicket, "tkt-lunch")
            .unwrap();
        state.clear_attendee("att-unknown").unwrap();
        assert_eq!(state.summary().total_tickets, 0);
    }

    #[test]
    fn test_summary_never_drifts() {
        let mut state = state();
        let actions = vec![
            RegistrationAction::AddPackage {
                attendee_id: "att-1".to_string(),
                package: fixtures::dinner_and_lunch(),
                quantity: 2,
            },
            RegistrationAction::AddIndividualTicket {
                attendee_id: "att-2".to_string(),
                ticket: fixtures::ceremony(),
                quantity: 1,
            },
            RegistrationAction::AddPackage {
                attendee_id: "att-1".to_string(),
                package: fixtures::full_weekend(),
                quantity: 1,
            },
            RegistrationAction::RemoveSelection {
                attendee_id: "att-1".to_string(),
                kind: SelectionKind::Package,
                id: "pkg-dinner-lunch".to_string(),
            },
            RegistrationAction::SetRegistrationType(RegistrationMode::Delegation),
            RegistrationAction::ClearAttendee {
                attendee_id: "att-2".to_string(),
            },
            RegistrationAction::SetRegistrationType(RegistrationMode::Lodge),
            RegistrationAction::SetLodgeBulkSelection {
                package: fixtures::lodge_table(),
                quantity: 1,
            },
            RegistrationAction::SetRegistrationType(RegistrationMode::Individuals),
        ];

        for action in actions {
            state.apply(action).unwrap();
            assert_eq!(state.summary(), &state.recompute_summary().unwrap());
        }
    }

    #[test]
    fn test_price_pinned_after_catalog_change() {
        let mut state = state();
        let mut package = fixtures::full_weekend();
        state.add_package_selection("att-1", &package, 1).unwrap();

        package.price = Money::from_cents(30000);
        state.add_package_selection("att-1", &package, 2).unwrap();
        assert_eq!(state.summary().subtotal.cents(), 36000);
    }

    #[test]
    fn test_readded_package_takes_current_price_and_contents() {
        let mut state = state();
        let mut package = fixtures::full_weekend();
        state.add_package_selection("att-1", &package, 1).unwrap();
        state
            .remove_selection("att-1", SelectionKind::Package, "pkg-weekend")
            .unwrap();

        package.price = Money::from_cents(25000);
        package.includes = vec!["tkt-gala".to_string(), "tkt-lunch".to_string()];
        state.add_package_selection("att-1", &package, 1).unwrap();

        let entry = &state.selections().get("att-1").unwrap().packages[0];
        let ticket_ids: Vec<&str> = entry.tickets.iter().map(|t| t.ticket_id.as_str()).collect();
        assert_eq!(ticket_ids, vec!["tkt-gala", "tkt-lunch"]);
        assert_eq!(state.summary().subtotal.cents(), 25000);
        assert_eq!(
            state.metadata().packages["pkg-weekend"].included_ticket_ids.len(),
            2
        );
    }

    #[test]
    fn test_package_still_selected_keeps_pinned_contents() {
        let mut state = state();
        let mut package = fixtures::full_weekend();
        state.add_package_selection("att-1", &package, 1).unwrap();

        package.price = Money::from_cents(25000);
        package.includes = vec!["tkt-gala".to_string(), "tkt-lunch".to_string()];
        state.add_package_selection("att-2", &package, 1).unwrap();

        let entry = &state.selections().get("att-2").unwrap().packages[0];
        assert_eq!(entry.tickets.len(), 1);
        assert_eq!(state.summary().subtotal.cents(), 36000);
    }

    #[test]
    fn test_lodge_bulk_reselect_after_catalog_change_round_trips() {
        let mut state = state();
        state.set_registration_type(RegistrationMode::Lodge).unwrap();
        let mut table = fixtures::lodge_table();
        state.set_lodge_bulk_selection(&table, 1).unwrap();

        table.includes = vec!["tkt-gala".to_string(); 12];
        state.set_lodge_bulk_selection(&table, 2).unwrap();
        assert_eq!(state.summary().total_tickets, 20);

        let body = crate::codec::to_json_string(&state).unwrap();
        let restored = crate::codec::from_json_str(&body).unwrap();
        assert_eq!(restored.summary(), state.summary());

        state
            .apply(RegistrationAction::ClearLodgeBulkSelection)
            .unwrap();
        state.set_lodge_bulk_selection(&table, 2).unwrap();
        assert_eq!(state.summary().total_tickets, 24);

        let body = crate::codec::to_json_string(&state).unwrap();
        let restored = crate::codec::from_json_str(&body).unwrap();
        assert_eq!(restored.summary().total_tickets, 24);
    }

    #[test]
    fn test_lodge_only_package_rejected_for_individuals() {
        let mut state = state();
        let before = state.clone();

        let err = state
            .add_package_selection("att-1", &fixtures::lodge_table(), 1)
            .unwrap_err();
        assert!(matches!(err, CoreError::IneligiblePackage { ref package_id, .. } if package_id == "pkg-table"));
        assert_eq!(state, before);
    }

    #[test]
    fn test_package_line_items() {
        let mut state = state();
        state
            .add_package_selection("att-1", &fixtures::dinner_and_lunch(), 3)
            .unwrap();
        state
            .add_individual_ticket("att-1", &fixtures::ceremony(), 1)
            .unwrap();

        let items = state.package_line_items().unwrap();
        assert_eq!(items.len(), 6);
        assert!(items.iter().all(|i| i.package_id == "pkg-dinner-lunch"));
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut state = state();
        state.set_registration_type(RegistrationMode::Lodge).unwrap();
        state
            .set_lodge_bulk_selection(&fixtures::lodge_table(), 1)
            .unwrap();
        state.clear().unwrap();

        assert_eq!(state, RegistrationState::new("fn-installation"));
    }

    #[test]
    fn test_lodge_validation_through_state() {
        let mut state = state();
        state.set_registration_type(RegistrationMode::Lodge).unwrap();
        state
            .apply(RegistrationAction::SetBookingContact(BookingContact {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.org".to_string(),
                phone: None,
            }))
            .unwrap();
        state
            .apply(RegistrationAction::SetLodgeDetails(LodgeDetails {
                grand_lodge_id: "gl-nsw".to_string(),
                lodge_id: "lodge-42".to_string(),
                lodge_name: "Lodge Harmony".to_string(),
            }))
            .unwrap();

        let errors = state.validation_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Package selection is required");

        state
            .set_lodge_bulk_selection(&fixtures::lodge_table(), 1)
            .unwrap();
        assert!(state.is_lodge_form_valid());
    }

    #[test]
    fn test_capture_function_checks_id() {
        let mut state = state();
        let mut function = fixtures::catalog().function;
        state
            .apply(RegistrationAction::CaptureFunction(function.clone()))
            .unwrap();
        assert_eq!(
            state.metadata().function.as_ref().unwrap().name,
            "Grand Installation"
        );

        function.id = "fn-other".to_string();
        assert!(state
            .apply(RegistrationAction::CaptureFunction(function))
            .is_err());
    }
}
