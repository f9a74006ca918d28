//! # Validation Module
//!
//! Structural checks on selection payloads and checkout readiness.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Raw JSON (drafts, wizard payloads)                           │
//! │  └── validate_ticket_selection_payload() → every bad field listed      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Typed ledger                                                  │
//! │  ├── find_package_ticket_overlaps()                                    │
//! │  └── validate_registration()                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Lodge checkout                                                │
//! │  └── get_lodge_validation_errors() / is_lodge_form_valid()             │
//! │                                                                         │
//! │  Every layer returns FieldError lists. Nothing here aborts the wizard. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::error::{FieldError, ValidationError};
use crate::lodge::{BookingContact, LodgeBulkSelection, LodgeDetails};
use crate::selection::SelectionLedger;
use crate::MAX_SELECTION_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Message reported when a lodge tries to check out without a package.
pub const PACKAGE_SELECTION_REQUIRED: &str = "Package selection is required";

/// Outcome of a structural payload check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PayloadValidation {
    pub is_valid: bool,
    pub errors: Vec<FieldError>,
}

impl PayloadValidation {
    fn from_errors(errors: Vec<FieldError>) -> Self {
        PayloadValidation {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be a positive integer
/// - Must not exceed MAX_SELECTION_QUANTITY
///
/// ## Example
/// ```rust
/// use lodgetix_core::validation::validate_quantity;
///
/// assert!(validate_quantity("quantity", 2).is_ok());
/// assert!(validate_quantity("quantity", 0).is_err());
/// assert!(validate_quantity("quantity", -1).is_err());
/// ```
pub fn validate_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if qty > MAX_SELECTION_QUANTITY as i64 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_SELECTION_QUANTITY as i64,
        });
    }

    Ok(())
}

/// Validates that a text field is present and non-blank.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Loose email shape check: one `@` with text either side and a dot after.
pub fn validate_email(field: &str, email: &str) -> ValidationResult<()> {
    validate_required(field, email)?;

    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.contains('@') && domain.contains('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be an email address".to_string(),
        });
    }
    Ok(())
}

fn check_id(errors: &mut Vec<FieldError>, field: String, value: Option<&Value>) {
    match value {
        Some(Value::String(id)) if !id.trim().is_empty() => {}
        Some(Value::String(_)) | None | Some(Value::Null) => {
            errors.push(ValidationError::Required { field }.into())
        }
        Some(_) => errors.push(
            ValidationError::InvalidType {
                field,
                expected: "a string".to_string(),
            }
            .into(),
        ),
    }
}

fn check_quantity_value(errors: &mut Vec<FieldError>, field: String, value: Option<&Value>) {
    let qty = match value {
        Some(Value::Number(n)) if n.is_i64() => n.as_i64(),
        Some(Value::Number(n)) if n.is_u64() => Some(i64::MAX),
        _ => None,
    };
    let result = match qty {
        Some(qty) => validate_quantity(&field, qty),
        None => Err(ValidationError::MustBePositive { field }),
    };
    if let Err(e) = result {
        errors.push(e.into());
    }
}

fn check_ticket_item(errors: &mut Vec<FieldError>, path: &str, item: &Value) {
    if !item.is_object() {
        errors.push(
            ValidationError::InvalidType {
                field: path.to_string(),
                expected: "an object".to_string(),
            }
            .into(),
        );
        return;
    }
    check_id(errors, format!("{}.ticketId", path), item.get("ticketId"));
    check_quantity_value(errors, format!("{}.quantity", path), item.get("quantity"));
}

fn expect_array<'a>(
    errors: &mut Vec<FieldError>,
    field: String,
    value: Option<&'a Value>,
    required: bool,
) -> Option<&'a Vec<Value>> {
    match value {
        Some(Value::Array(items)) => Some(items),
        None if !required => None,
        _ => {
            errors.push(
                ValidationError::InvalidType {
                    field,
                    expected: "an array".to_string(),
                }
                .into(),
            );
            None
        }
    }
}

/// Checks a raw `ticketSelections` map and lists every structural problem.
///
/// ## Rules
/// - each package entry: non-empty `packageId`, positive integer
///   `quantity`, array-typed `tickets`
/// - each individual ticket: non-empty `ticketId`, positive integer `quantity`
///
/// Field paths look like `att-1.packages[0].quantity`.
pub fn validate_ticket_selection_payload(payload: &Value) -> PayloadValidation {
    let mut errors = Vec::new();

    let Some(attendees) = payload.as_object() else {
        errors.push(FieldError::new("ticketSelections", "ticketSelections must be an object"));
        return PayloadValidation::from_errors(errors);
    };

    for (attendee_id, selection) in attendees {
        if !selection.is_object() {
            errors.push(FieldError::new(
                attendee_id.clone(),
                format!("{} must be an object", attendee_id),
            ));
            continue;
        }

        let packages = expect_array(
            &mut errors,
            format!("{}.packages", attendee_id),
            selection.get("packages"),
            false,
        );
        for (i, package) in packages.into_iter().flatten().enumerate() {
            let path = format!("{}.packages[{}]", attendee_id, i);
            if !package.is_object() {
                errors.push(
                    ValidationError::InvalidType {
                        field: path,
                        expected: "an object".to_string(),
                    }
                    .into(),
                );
                continue;
            }
            check_id(&mut errors, format!("{}.packageId", path), package.get("packageId"));
            check_quantity_value(&mut errors, format!("{}.quantity", path), package.get("quantity"));
            let tickets = expect_array(
                &mut errors,
                format!("{}.tickets", path),
                package.get("tickets"),
                true,
            );
            for (j, ticket) in tickets.into_iter().flatten().enumerate() {
                check_ticket_item(&mut errors, &format!("{}.tickets[{}]", path, j), ticket);
            }
        }

        let tickets = expect_array(
            &mut errors,
            format!("{}.individualTickets", attendee_id),
            selection.get("individualTickets"),
            false,
        );
        for (i, ticket) in tickets.into_iter().flatten().enumerate() {
            check_ticket_item(
                &mut errors,
                &format!("{}.individualTickets[{}]", attendee_id, i),
                ticket,
            );
        }
    }

    PayloadValidation::from_errors(errors)
}

// =============================================================================
// Ledger Checks
// =============================================================================

/// Lists tickets an attendee holds both inside a package and à la carte.
///
/// The ledger allows this on purpose; checkout reports it so the attendee
/// can remove the duplicate.
pub fn find_package_ticket_overlaps(selections: &SelectionLedger) -> Vec<FieldError> {
    let mut errors = Vec::new();
    for (attendee_id, selection) in selections.iter() {
        for (i, ticket) in selection.individual_tickets.iter().enumerate() {
            if let Some(package) = selection
                .packages
                .iter()
                .find(|p| p.contains_ticket(&ticket.ticket_id))
            {
                errors.push(FieldError::new(
                    format!("{}.individualTickets[{}]", attendee_id, i),
                    format!(
                        "{} is already included in package {}",
                        ticket.ticket_id, package.package_id
                    ),
                ));
            }
        }
    }
    errors
}

/// Checkout readiness for individuals and delegation registrations.
pub fn validate_registration(selections: &SelectionLedger) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if selections.active_attendee_count() == 0 {
        errors.push(FieldError::new(
            "ticketSelections",
            "At least one attendee must select a ticket or package",
        ));
    }
    errors.extend(find_package_ticket_overlaps(selections));
    errors
}

// =============================================================================
// Lodge Form
// =============================================================================

/// Every reason the lodge form cannot check out yet.
pub fn get_lodge_validation_errors(
    contact: Option<&BookingContact>,
    lodge: Option<&LodgeDetails>,
    bulk: Option<&LodgeBulkSelection>,
) -> Vec<FieldError> {
    let mut errors = Vec::new();

    match contact {
        Some(contact) => {
            let checks = [
                validate_required("bookingContact.firstName", &contact.first_name),
                validate_required("bookingContact.lastName", &contact.last_name),
                validate_email("bookingContact.email", &contact.email),
            ];
            errors.extend(checks.into_iter().filter_map(Result::err).map(FieldError::from));
        }
        None => errors.push(FieldError::new("bookingContact", "Booking contact is required")),
    }

    match lodge {
        Some(lodge) => {
            let checks = [
                validate_required("lodgeDetails.grandLodgeId", &lodge.grand_lodge_id),
                validate_required("lodgeDetails.lodgeId", &lodge.lodge_id),
                validate_required("lodgeDetails.lodgeName", &lodge.lodge_name),
            ];
            errors.extend(checks.into_iter().filter_map(Result::err).map(FieldError::from));
        }
        None => errors.push(FieldError::new("lodgeDetails", "Lodge details are required")),
    }

    if bulk.is_none() {
        errors.push(FieldError::new("lodgeBulkSelection", PACKAGE_SELECTION_REQUIRED));
    }

    errors
}

pub fn is_lodge_form_valid(
    contact: Option<&BookingContact>,
    lodge: Option<&LodgeDetails>,
    bulk: Option<&LodgeBulkSelection>,
) -> bool {
    get_lodge_validation_errors(contact, lodge, bulk).is_empty()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures;
    use crate::money::Money;
    use serde_json::json;

    fn contact() -> BookingContact {
        BookingContact {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.org".to_string(),
            phone: None,
        }
    }

    fn lodge() -> LodgeDetails {
        LodgeDetails {
            grand_lodge_id: "gl-nsw".to_string(),
            lodge_id: "lodge-42".to_string(),
            lodge_name: "Lodge Harmony No. 42".to_string(),
        }
    }

    fn bulk() -> LodgeBulkSelection {
        LodgeBulkSelection {
            package_id: "pkg-table".to_string(),
            quantity: 1,
            subtotal: Money::from_cents(195000),
            will_generate_tickets: 10,
        }
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity("quantity", 1).is_ok());
        assert!(validate_quantity("quantity", MAX_SELECTION_QUANTITY as i64).is_ok());

        assert!(validate_quantity("quantity", 0).is_err());
        assert!(validate_quantity("quantity", -1).is_err());
        assert!(matches!(
            validate_quantity("quantity", MAX_SELECTION_QUANTITY as i64 + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("email", "ada@example.org").is_ok());
        assert!(validate_email("email", "").is_err());
        assert!(validate_email("email", "ada.example.org").is_err());
        assert!(validate_email("email", "ada@localhost").is_err());
    }

    #[test]
    fn test_valid_payload() {
        let payload = json!({
            "att-1": {
                "packages": [{ "packageId": "pkg-weekend", "quantity": 1,
                               "tickets": [{ "ticketId": "tkt-gala", "quantity": 1 }] }],
                "individualTickets": [{ "ticketId": "tkt-lunch", "quantity": 2 }]
            },
            "att-2": { "packages": [], "individualTickets": [] }
        });

        let result = validate_ticket_selection_payload(&payload);
        assert!(result.is_valid, "{:?}", result.errors);
    }

    #[test]
    fn test_payload_errors_are_field_tied() {
        let payload = json!({
            "att-1": {
                "packages": [
                    { "packageId": "", "quantity": 0, "tickets": "tkt-gala" },
                    { "packageId": "pkg-weekend", "quantity": 1.5, "tickets": [] }
                ],
                "individualTickets": [{ "ticketId": 7, "quantity": -2 }]
            }
        });

        let result = validate_ticket_selection_payload(&payload);
        assert!(!result.is_valid);

        let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "att-1.packages[0].packageId",
                "att-1.packages[0].quantity",
                "att-1.packages[0].tickets",
                "att-1.packages[1].quantity",
                "att-1.individualTickets[0].ticketId",
                "att-1.individualTickets[0].quantity",
            ]
        );
        assert_eq!(
            result.errors[1].message,
            "att-1.packages[0].quantity must be a positive integer"
        );
    }

    #[test]
    fn test_non_object_payload() {
        let result = validate_ticket_selection_payload(&json!([]));
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].field, "ticketSelections");
    }

    #[test]
    fn test_overlap_detection() {
        let mut ledger = SelectionLedger::new();
        ledger
            .add_package_selection("att-1", &fixtures::full_weekend(), 1)
            .unwrap();
        ledger
            .add_individual_ticket("att-1", &fixtures::gala_dinner(), 1)
            .unwrap();
        ledger
            .add_individual_ticket("att-1", &fixtures::farewell_lunch(), 1)
            .unwrap();

        let overlaps = find_package_ticket_overlaps(&ledger);
        assert_eq!(overlaps.len(), 1);
        assert_eq!(overlaps[0].field, "att-1.individualTickets[0]");
        assert_eq!(validate_registration(&ledger).len(), 1);
    }

    #[test]
    fn test_empty_registration_is_invalid() {
        let errors = validate_registration(&SelectionLedger::new());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "ticketSelections");
    }

    #[test]
    fn test_lodge_form_requires_package_selection() {
        let bulk = bulk();
        assert!(is_lodge_form_valid(Some(&contact()), Some(&lodge()), Some(&bulk)));

        let errors = get_lodge_validation_errors(Some(&contact()), Some(&lodge()), None);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Package selection is required");
        assert!(!is_lodge_form_valid(Some(&contact()), Some(&lodge()), None));
    }

    #[test]
    fn test_lodge_form_reports_missing_fields() {
        let mut contact = contact();
        contact.email = "not-an-email".to_string();
        let mut lodge = lodge();
        lodge.lodge_name = "  ".to_string();

        let errors = get_lodge_validation_errors(Some(&contact), Some(&lodge), Some(&bulk()));
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["bookingContact.email", "lodgeDetails.lodgeName"]);

        let errors = get_lodge_validation_errors(None, None, None);
        assert_eq!(errors.len(), 3);
    }
}
