//! # Error Types
//!
//! Domain-specific error types for lodgetix-core.
//!
//! ## Error Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  lodgetix-core errors (this file)                                      │
//! │  ├── CoreError        - Configuration & invariant violations           │
//! │  │                      (fatal to the one operation, never zeroed)     │
//! │  ├── ValidationError  - One field failed a rule                        │
//! │  └── FieldError       - Reported list item, never thrown               │
//! │                                                                         │
//! │  lodgetix-db errors (separate crate)                                   │
//! │  └── DbError          - SQLite failures                                │
//! │                                                                         │
//! │  lodgetix-session errors                                               │
//! │  └── SessionError     - Persistence (retryable) + config               │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SessionError → wizard prompt      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Core Error
// =============================================================================

/// Core registration engine errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A package in the catalog includes no tickets.
    ///
    /// ## When This Occurs
    /// - Data-entry mistake in the package catalog
    /// - Package created before its tickets were attached
    ///
    /// Expanding such a package must fail loudly: treating it as zero
    /// tickets would hide the catalog mistake behind a $0 line.
    #[error("Package {package_id} has no included tickets")]
    EmptyPackage { package_id: String },

    /// A package includes a ticket id the catalog does not define.
    #[error("Package {package_id} includes unknown ticket {ticket_id}")]
    DanglingPackageTicket {
        package_id: String,
        ticket_id: String,
    },

    /// A selection references an item whose unit price was never captured.
    #[error("No captured price for {kind} {id}")]
    MissingCapturedPrice { kind: String, id: String },

    /// Catalog item is switched off and cannot be selected.
    #[error("{kind} {id} is not currently on sale")]
    InactiveCatalogItem { kind: String, id: String },

    /// Quantity is zero or otherwise unusable.
    #[error("Quantity must be at least 1, got {quantity}")]
    InvalidQuantity { quantity: i64 },

    /// Quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: u32, max: u32 },

    /// Operation targets the ledger that is not authoritative for the mode.
    ///
    /// ## When This Occurs
    /// - Adding attendee tickets while in `lodge` mode
    /// - Setting a lodge bulk selection while in `individuals` mode
    #[error("Cannot {operation} while registering as {mode}")]
    ModeMismatch { operation: String, mode: String },

    /// Package is restricted to other registration types.
    #[error("Package {package_id} is not offered for {mode} registrations")]
    IneligiblePackage { package_id: String, mode: String },

    /// A price or total does not fit in cents.
    ///
    /// ## When This Occurs
    /// - A tampered draft carries an absurd captured price
    #[error("Amount overflows while pricing {item}")]
    PriceOverflow { item: String },

    /// A lodge bulk selection's stored totals disagree with its inputs.
    #[error("Lodge bulk selection for {package_id} is inconsistent: {reason}")]
    LodgeBulkMismatch { package_id: String, reason: String },

    /// Draft body is not valid JSON or does not match the draft schema.
    #[error("Malformed draft: {0}")]
    MalformedDraft(String),

    /// Draft body parsed but failed structural validation.
    #[error("Draft failed validation with {} error(s)", .errors.len())]
    InvalidDraft { errors: Vec<FieldError> },

    /// `ticketSelections` and `attendeeSelections` carry different data.
    #[error("Draft selections disagree for attendee {attendee_id}")]
    ConflictingSelections { attendee_id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a MissingCapturedPrice error.
    pub fn missing_price(kind: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::MissingCapturedPrice {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Creates a ModeMismatch error.
    pub fn mode_mismatch(operation: impl Into<String>, mode: impl ToString) -> Self {
        CoreError::ModeMismatch {
            operation: operation.into(),
            mode: mode.to_string(),
        }
    }

    /// Creates a PriceOverflow error.
    pub fn price_overflow(item: impl Into<String>) -> Self {
        CoreError::PriceOverflow { item: item.into() }
    }

    /// Returns true if the catalog itself is malformed.
    ///
    /// These are surfaced to operators, not attendees: the fix is in the
    /// catalog, not in the wizard.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            CoreError::EmptyPackage { .. }
                | CoreError::DanglingPackageTicket { .. }
                | CoreError::MissingCapturedPrice { .. }
                | CoreError::InactiveCatalogItem { .. }
        )
    }

    /// Returns true if the error is a field-level input problem.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            CoreError::Validation(_)
                | CoreError::InvalidDraft { .. }
                | CoreError::InvalidQuantity { .. }
                | CoreError::QuantityTooLarge { .. }
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors for a single field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be a positive integer.
    #[error("{field} must be a positive integer")]
    MustBePositive { field: String },

    /// Value has the wrong JSON type.
    #[error("{field} must be {expected}")]
    InvalidType { field: String, expected: String },

    /// Invalid format (e.g., malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Field the error is attached to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::InvalidType { field, .. }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }
}

// =============================================================================
// Field Error
// =============================================================================

/// One reportable, field-tied validation message.
///
/// Returned in lists by the structural validators; the wizard renders each
/// next to `field`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FieldError {
    /// Dotted path to the offending value, e.g. `att-1.packages[0].quantity`.
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<ValidationError> for FieldError {
    fn from(err: ValidationError) -> Self {
        FieldError {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::EmptyPackage {
            package_id: "pkg-weekend".to_string(),
        };
        assert_eq!(err.to_string(), "Package pkg-weekend has no included tickets");

        let err = CoreError::mode_mismatch("add attendee tickets", "lodge");
        assert_eq!(
            err.to_string(),
            "Cannot add attendee tickets while registering as lodge"
        );
    }

    #[test]
    fn test_categorisation() {
        assert!(CoreError::EmptyPackage {
            package_id: "p".into()
        }
        .is_configuration_error());
        assert!(!CoreError::InvalidQuantity { quantity: 0 }.is_configuration_error());
        assert!(CoreError::InvalidQuantity { quantity: 0 }.is_validation_error());
        assert!(!CoreError::price_overflow("package pkg-weekend").is_configuration_error());
        assert_eq!(
            CoreError::price_overflow("ticket tkt-gala").to_string(),
            "Amount overflows while pricing ticket tkt-gala"
        );
    }

    #[test]
    fn test_validation_converts_to_field_error() {
        let err = ValidationError::MustBePositive {
            field: "att-1.packages[0].quantity".to_string(),
        };
        let field_error: FieldError = err.into();
        assert_eq!(field_error.field, "att-1.packages[0].quantity");
        assert_eq!(
            field_error.message,
            "att-1.packages[0].quantity must be a positive integer"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let err = ValidationError::Required {
            field: "packageId".to_string(),
        };
        let core_err: CoreError = err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
