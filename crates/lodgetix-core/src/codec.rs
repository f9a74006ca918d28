//! # Persistence Codec
//!
//! Serialises a [`RegistrationState`] to the draft wire document and parses
//! it back with schema checks.
//!
//! ## Wire Document
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  {                                                                      │
//! │    functionId:          string                          (required)     │
//! │    ticketSelections:    { attendeeId: AttendeeSelection } (required)   │
//! │    registrationType?:   individuals | lodge | delegation               │
//! │    functionMetadata?:   FunctionMetadata                               │
//! │    ticketMetadata?:     { ticketId: TicketMetadata }                   │
//! │    packageMetadata?:    { packageId: PackageMetadata }                 │
//! │    attendeeSelections?: projection of ticketSelections                 │
//! │    orderSummary?:       OrderSummary (advisory, recomputed on load)    │
//! │    lodgeBulkSelection?: LodgeBulkSelection | null                      │
//! │    capturedPrices?:     CapturedPrices                                 │
//! │    bookingContact?:     BookingContact                                 │
//! │    lodgeDetails?:       LodgeDetails                                   │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Decode Pipeline
//! ```text
//!   raw JSON ──► required keys ──► payload validation ──► shape (legacy?)
//!            ──► typed document ──► consistency checks ──► RegistrationState
//! ```
//!
//! `ticketSelections` is canonical. `attendeeSelections` is written as a
//! copy for older readers and must agree with it on the way back in.
//!
//! The registration type comes from `registrationType`, then
//! `orderSummary.registrationType`. Bodies with neither are `lodge` when they
//! carry a bulk selection and `individuals` otherwise.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, FieldError, ValidationError};
use crate::legacy::SelectionShape;
use crate::lodge::{BookingContact, LodgeBulkSelection, LodgeDetails};
use crate::metadata::{CapturedMetadata, FunctionMetadata, PackageMetadata, TicketMetadata};
use crate::money::Money;
use crate::pricing::{CapturedPrices, OrderSummary};
use crate::registration::{RegistrationState, RestoredParts};
use crate::selection::SelectionLedger;
use crate::types::RegistrationMode;
use crate::validation::validate_ticket_selection_payload;
use crate::MAX_UNIT_PRICE;

/// The draft body exchanged with the draft store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DraftDocument {
    pub function_id: String,
    pub ticket_selections: SelectionLedger,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_type: Option<RegistrationMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_metadata: Option<FunctionMetadata>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ticket_metadata: BTreeMap<String, TicketMetadata>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub package_metadata: BTreeMap<String, PackageMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendee_selections: Option<SelectionLedger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_summary: Option<OrderSummary>,
    #[serde(default)]
    pub lodge_bulk_selection: Option<LodgeBulkSelection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_prices: Option<CapturedPrices>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_contact: Option<BookingContact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lodge_details: Option<LodgeDetails>,
}

// =============================================================================
// Encode
// =============================================================================

/// Builds the wire document for a state. Borrows; never takes ownership.
pub fn encode(state: &RegistrationState) -> DraftDocument {
    let metadata = state.metadata();
    DraftDocument {
        function_id: state.function_id().to_string(),
        ticket_selections: state.selections().clone(),
        registration_type: Some(state.mode()),
        function_metadata: metadata.function.clone(),
        ticket_metadata: metadata.tickets.clone(),
        package_metadata: metadata.packages.clone(),
        attendee_selections: Some(state.selections().clone()),
        order_summary: Some(state.summary().clone()),
        lodge_bulk_selection: state.lodge_bulk_selection().cloned(),
        captured_prices: Some(state.prices().clone()),
        booking_contact: state.booking_contact().cloned(),
        lodge_details: state.lodge_details().cloned(),
    }
}

pub fn to_json(state: &RegistrationState) -> CoreResult<Value> {
    serde_json::to_value(encode(state)).map_err(|e| CoreError::MalformedDraft(e.to_string()))
}

pub fn to_json_string(state: &RegistrationState) -> CoreResult<String> {
    serde_json::to_string(&encode(state)).map_err(|e| CoreError::MalformedDraft(e.to_string()))
}

// =============================================================================
// Decode
// =============================================================================

pub fn from_json_str(body: &str) -> CoreResult<RegistrationState> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| CoreError::MalformedDraft(e.to_string()))?;
    from_json(&value)
}

/// Parses and validates a raw draft body.
///
/// ## Errors
/// - [`CoreError::InvalidDraft`] for missing keys, bad selection fields or
///   out-of-range prices
/// - [`CoreError::MalformedDraft`] when the body does not fit the schema
/// - [`CoreError::ConflictingSelections`] when the two selection maps disagree
/// - [`CoreError::LodgeBulkMismatch`] when bulk totals do not add up
pub fn from_json(value: &Value) -> CoreResult<RegistrationState> {
    let body = value
        .as_object()
        .ok_or_else(|| CoreError::MalformedDraft("draft must be a JSON object".to_string()))?;

    let mut missing = Vec::new();
    match body.get("functionId") {
        Some(Value::String(id)) if !id.trim().is_empty() => {}
        _ => missing.push(FieldError::from(ValidationError::Required {
            field: "functionId".to_string(),
        })),
    }
    let Some(raw_selections) = body.get("ticketSelections") else {
        missing.push(FieldError::from(ValidationError::Required {
            field: "ticketSelections".to_string(),
        }));
        return Err(CoreError::InvalidDraft { errors: missing });
    };
    if !missing.is_empty() {
        return Err(CoreError::InvalidDraft { errors: missing });
    }

    let report = validate_ticket_selection_payload(raw_selections);
    if !report.is_valid {
        return Err(CoreError::InvalidDraft {
            errors: report.errors,
        });
    }

    let shape = SelectionShape::from_value(raw_selections)?;
    let mut normalised = value.clone();
    if shape.is_legacy() {
        info!("Draft uses legacy selection shape, converting");
        let enhanced = shape.into_enhanced();
        normalised["ticketSelections"] = serde_json::to_value(&enhanced)
            .map_err(|e| CoreError::MalformedDraft(e.to_string()))?;
    }

    let document: DraftDocument =
        serde_json::from_value(normalised).map_err(|e| CoreError::MalformedDraft(e.to_string()))?;
    decode(document)
}

/// Rebuilds a state from a typed document.
pub fn decode(document: DraftDocument) -> CoreResult<RegistrationState> {
    if let Some(projection) = &document.attendee_selections {
        check_projection(&document.ticket_selections, projection)?;
    }

    let mode = document
        .registration_type
        .or_else(|| document.order_summary.as_ref().map(|s| s.registration_type))
        .unwrap_or_else(|| {
            if document.lodge_bulk_selection.is_some() {
                RegistrationMode::Lodge
            } else {
                RegistrationMode::default()
            }
        });

    let metadata = CapturedMetadata {
        function: document.function_metadata,
        tickets: document.ticket_metadata,
        packages: document.package_metadata,
    };

    let prices = match document.captured_prices {
        Some(prices) => prices,
        None => {
            let has_selections =
                !document.ticket_selections.is_empty() || document.lodge_bulk_selection.is_some();
            if has_selections {
                warn!(
                    function_id = %document.function_id,
                    "Draft has no captured prices, falling back to metadata prices"
                );
            }
            CapturedPrices::from_metadata(&metadata)
        }
    };

    check_amounts(&prices, document.lodge_bulk_selection.as_ref())?;

    if mode.uses_lodge_bulk() && !document.ticket_selections.is_empty() {
        return Err(CoreError::MalformedDraft(
            "lodge draft carries attendee selections".to_string(),
        ));
    }
    if !mode.uses_lodge_bulk() && document.lodge_bulk_selection.is_some() {
        return Err(CoreError::MalformedDraft(format!(
            "{} draft carries a lodge bulk selection",
            mode
        )));
    }

    if let Some(bulk) = &document.lodge_bulk_selection {
        let unit_price = prices.package_price(&bulk.package_id)?;
        let per_package = metadata
            .packages
            .get(&bulk.package_id)
            .map(|p| p.included_ticket_ids.len() as u32);
        bulk.verify(unit_price, per_package)?;
    }

    let state = RegistrationState::restore(
        document.function_id,
        RestoredParts {
            mode,
            selections: document.ticket_selections,
            lodge_bulk: document.lodge_bulk_selection,
            metadata,
            prices,
            booking_contact: document.booking_contact,
            lodge_details: document.lodge_details,
        },
    )?;

    if let Some(stored) = &document.order_summary {
        if stored != state.summary() {
            warn!(
                function_id = %state.function_id(),
                stored_subtotal = %stored.subtotal,
                computed_subtotal = %state.summary().subtotal,
                "Stored order summary differs from recomputed summary"
            );
        }
    }

    debug!(
        function_id = %state.function_id(),
        mode = %state.mode(),
        attendees = state.summary().total_attendees,
        "Draft decoded"
    );
    Ok(state)
}

/// Captured prices and the stored bulk subtotal must be plausible amounts.
fn check_amounts(prices: &CapturedPrices, bulk: Option<&LodgeBulkSelection>) -> CoreResult<()> {
    let mut errors: Vec<FieldError> = prices
        .entries()
        .filter(|(_, price)| !is_valid_unit_price(*price))
        .map(|(field, _)| {
            FieldError::new(
                field,
                format!("Price must be between {} and {}", Money::zero(), MAX_UNIT_PRICE),
            )
        })
        .collect();

    if let Some(bulk) = bulk {
        if bulk.subtotal.is_negative() {
            errors.push(FieldError::new(
                "lodgeBulkSelection.subtotal",
                "Subtotal must not be negative",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(CoreError::InvalidDraft { errors })
    }
}

fn is_valid_unit_price(price: Money) -> bool {
    !price.is_negative() && price <= MAX_UNIT_PRICE
}

fn check_projection(canonical: &SelectionLedger, projection: &SelectionLedger) -> CoreResult<()> {
    if canonical == projection {
        return Ok(());
    }
    let attendee_id = canonical
        .iter()
        .find(|(id, selection)| projection.get(id) != Some(*selection))
        .or_else(|| projection.iter().find(|(id, _)| canonical.get(id).is_none()))
        .map(|(id, _)| id.clone())
        .unwrap_or_default();
    Err(CoreError::ConflictingSelections { attendee_id })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures;
    use serde_json::json;

    fn individuals_state() -> RegistrationState {
        let mut state = RegistrationState::new("fn-installation");
        state
            .add_package_selection("att-1", &fixtures::full_weekend(), 1)
            .unwrap();
        state
            .add_individual_ticket("att-1", &fixtures::farewell_lunch(), 2)
            .unwrap();
        state
            .add_package_selection("att-2", &fixtures::dinner_and_lunch(), 1)
            .unwrap();
        state
    }

    fn lodge_state() -> RegistrationState {
        let mut state = RegistrationState::new("fn-installation");
        state.set_registration_type(RegistrationMode::Lodge).unwrap();
        state
            .set_lodge_bulk_selection(&fixtures::lodge_table(), 2)
            .unwrap();
        state
    }

    #[test]
    fn test_round_trip_reproduces_summary() {
        for state in [individuals_state(), lodge_state()] {
            let body = to_json_string(&state).unwrap();
            let restored = from_json_str(&body).unwrap();

            assert_eq!(restored.summary(), state.summary());
            assert_eq!(restored, state);
        }
    }

    #[test]
    fn test_wire_keys() {
        let value = to_json(&lodge_state()).unwrap();
        assert_eq!(value["functionId"], "fn-installation");
        assert!(value["ticketSelections"].is_object());
        assert_eq!(value["orderSummary"]["registrationType"], "lodge");
        assert_eq!(value["orderSummary"]["subtotal"], 390000);
        assert_eq!(value["lodgeBulkSelection"]["willGenerateTickets"], 20);
        assert_eq!(value["packageMetadata"]["pkg-table"]["name"], "Lodge Table of 10");

        let value = to_json(&RegistrationState::new("fn-installation")).unwrap();
        assert!(value["lodgeBulkSelection"].is_null());
        assert!(value.get("ticketMetadata").is_none());
    }

    #[test]
    fn test_missing_required_keys() {
        let err = from_json(&json!({ "ticketSelections": {} })).unwrap_err();
        match err {
            CoreError::InvalidDraft { errors } => assert_eq!(errors[0].field, "functionId"),
            other => panic!("unexpected error: {other}"),
        }

        let err = from_json(&json!({ "functionId": "fn-installation" })).unwrap_err();
        assert!(matches!(err, CoreError::InvalidDraft { ref errors } if errors[0].field == "ticketSelections"));
    }

    #[test]
    fn test_invalid_payload_lists_field_errors() {
        let err = from_json(&json!({
            "functionId": "fn-installation",
            "ticketSelections": {
                "att-1": { "packages": [{ "packageId": "pkg-weekend", "quantity": 0, "tickets": [] }] }
            }
        }))
        .unwrap_err();

        assert!(err.is_validation_error());
        match err {
            CoreError::InvalidDraft { errors } => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "att-1.packages[0].quantity");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_conflicting_projection_rejected() {
        let mut value = to_json(&individuals_state()).unwrap();
        value["attendeeSelections"]["att-2"]["packages"][0]["quantity"] = json!(5);

        let err = from_json(&value).unwrap_err();
        assert!(matches!(err, CoreError::ConflictingSelections { ref attendee_id } if attendee_id == "att-2"));
    }

    #[test]
    fn test_stale_summary_is_recomputed() {
        let state = individuals_state();
        let mut value = to_json(&state).unwrap();
        value["orderSummary"]["subtotal"] = json!(1);
        value["orderSummary"]["totalTickets"] = json!(99);

        let restored = from_json(&value).unwrap();
        assert_eq!(restored.summary(), state.summary());
    }

    #[test]
    fn test_tampered_lodge_totals_rejected() {
        let mut value = to_json(&lodge_state()).unwrap();
        value["lodgeBulkSelection"]["subtotal"] = json!(100);

        assert!(matches!(
            from_json(&value),
            Err(CoreError::LodgeBulkMismatch { .. })
        ));
    }

    #[test]
    fn test_prices_fall_back_to_metadata() {
        let state = individuals_state();
        let mut value = to_json(&state).unwrap();
        value.as_object_mut().unwrap().remove("capturedPrices");

        let restored = from_json(&value).unwrap();
        assert_eq!(restored.summary().subtotal, state.summary().subtotal);
    }

    #[test]
    fn test_legacy_draft_is_converted() {
        let value = json!({
            "functionId": "fn-installation",
            "ticketSelections": {
                "att-1": { "ticketDefinitionId": "pkg-weekend", "selectedEvents": ["tkt-gala"] },
                "att-2": { "ticketDefinitionId": null, "selectedEvents": ["tkt-lunch"] }
            },
            "capturedPrices": {
                "packages": { "pkg-weekend": 18000 },
                "tickets": { "tkt-lunch": 7500 }
            }
        });

        let restored = from_json(&value).unwrap();
        assert_eq!(restored.mode(), RegistrationMode::Individuals);
        assert_eq!(restored.summary().total_attendees, 2);
        assert_eq!(restored.summary().subtotal, Money::from_cents(25500));
    }

    #[test]
    fn test_mode_and_ledger_must_agree() {
        let mut value = to_json(&individuals_state()).unwrap();
        value["lodgeBulkSelection"] = json!({
            "packageId": "pkg-weekend", "quantity": 1, "subtotal": 18000, "willGenerateTickets": 1
        });
        assert!(matches!(from_json(&value), Err(CoreError::MalformedDraft(_))));
    }

    #[test]
    fn test_lodge_body_without_summary_keeps_mode() {
        let value = json!({
            "functionId": "fn-installation",
            "ticketSelections": {},
            "lodgeBulkSelection": {
                "packageId": "pkg-table", "quantity": 2, "subtotal": 390000, "willGenerateTickets": 20
            },
            "capturedPrices": { "packages": { "pkg-table": 195000 } }
        });

        let restored = from_json(&value).unwrap();
        assert_eq!(restored.mode(), RegistrationMode::Lodge);
        assert_eq!(restored.summary().total_tickets, 20);
        assert_eq!(restored.summary().subtotal, Money::from_cents(390000));
    }

    #[test]
    fn test_registration_type_written_and_preferred() {
        let mut state = RegistrationState::new("fn-installation");
        state.set_registration_type(RegistrationMode::Delegation).unwrap();
        let mut value = to_json(&state).unwrap();
        assert_eq!(value["registrationType"], "delegation");

        value.as_object_mut().unwrap().remove("orderSummary");
        assert_eq!(from_json(&value).unwrap().mode(), RegistrationMode::Delegation);
    }

    #[test]
    fn test_negative_prices_rejected() {
        let mut value = to_json(&individuals_state()).unwrap();
        value["capturedPrices"]["tickets"]["tkt-lunch"] = json!(-7500);

        match from_json(&value).unwrap_err() {
            CoreError::InvalidDraft { errors } => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "capturedPrices.tickets.tkt-lunch");
            }
            other => panic!("unexpected error: {other}"),
        }

        let mut value = to_json(&lodge_state()).unwrap();
        value["lodgeBulkSelection"]["subtotal"] = json!(-390000);
        value["capturedPrices"]["packages"]["pkg-table"] = json!(-195000);
        match from_json(&value).unwrap_err() {
            CoreError::InvalidDraft { errors } => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(
                    fields,
                    vec!["capturedPrices.packages.pkg-table", "lodgeBulkSelection.subtotal"]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_huge_price_is_an_error_not_a_panic() {
        let mut value = to_json(&individuals_state()).unwrap();
        value["capturedPrices"]["tickets"]["tkt-lunch"] = json!(9_000_000_000_000_000_000i64);

        let err = from_json(&value).unwrap_err();
        assert!(matches!(err, CoreError::InvalidDraft { ref errors } if errors[0].field == "capturedPrices.tickets.tkt-lunch"));
    }

    #[test]
    fn test_garbage_body() {
        assert!(matches!(
            from_json_str("not json"),
            Err(CoreError::MalformedDraft(_))
        ));
        assert!(matches!(
            from_json(&json!([1, 2])),
            Err(CoreError::MalformedDraft(_))
        ));
    }
}
