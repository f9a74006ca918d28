//! # Domain Types
//!
//! Small shared enums used throughout the registration engine.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌─────────────────┐   ┌─────────────────┐      │
//! │  │ RegistrationMode │   │  AttendeeType   │   │  SelectionKind  │      │
//! │  │  ──────────────  │   │  ─────────────  │   │  ─────────────  │      │
//! │  │  Individuals     │   │  Mason          │   │  Package        │      │
//! │  │  Lodge           │   │  Guest          │   │  Individual-    │      │
//! │  │  Delegation      │   │                 │   │    Ticket       │      │
//! │  └──────────────────┘   └─────────────────┘   └─────────────────┘      │
//! │                                                                         │
//! │  RegistrationMode decides which ledger is authoritative:               │
//! │    Individuals / Delegation → per-attendee Selection Ledger            │
//! │    Lodge                    → Lodge Bulk Ledger                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Registration Mode
// =============================================================================

/// How the registration is being made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationMode {
    /// One or more named attendees, each choosing their own tickets.
    #[default]
    #[serde(alias = "individual")]
    Individuals,
    /// A lodge buys N copies of one package as a block.
    Lodge,
    /// An official delegation; attendees selected like individuals.
    Delegation,
}

impl RegistrationMode {
    /// Returns true if the per-attendee Selection Ledger is authoritative.
    pub fn uses_attendee_selections(&self) -> bool {
        matches!(self, RegistrationMode::Individuals | RegistrationMode::Delegation)
    }

    /// Returns true if the Lodge Bulk Ledger is authoritative.
    pub fn uses_lodge_bulk(&self) -> bool {
        matches!(self, RegistrationMode::Lodge)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationMode::Individuals => "individuals",
            RegistrationMode::Lodge => "lodge",
            RegistrationMode::Delegation => "delegation",
        }
    }
}

impl fmt::Display for RegistrationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "individuals" | "individual" => Ok(RegistrationMode::Individuals),
            "lodge" | "lodges" => Ok(RegistrationMode::Lodge),
            "delegation" | "delegations" => Ok(RegistrationMode::Delegation),
            other => Err(ValidationError::InvalidFormat {
                field: "registrationType".to_string(),
                reason: format!(
                    "unknown registration type '{}', expected individuals, lodge or delegation",
                    other
                ),
            }),
        }
    }
}

// =============================================================================
// Attendee Type
// =============================================================================

/// Attendee classification used by eligibility allow-lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AttendeeType {
    Mason,
    Guest,
}

impl AttendeeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendeeType::Mason => "mason",
            AttendeeType::Guest => "guest",
        }
    }
}

impl FromStr for AttendeeType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mason" => Ok(AttendeeType::Mason),
            "guest" => Ok(AttendeeType::Guest),
            other => Err(ValidationError::InvalidFormat {
                field: "attendeeType".to_string(),
                reason: format!("unknown attendee type '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Selection Kind
// =============================================================================

/// Which array of an attendee's selection an entry lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SelectionKind {
    /// Bundled: `AttendeeSelection.packages`.
    Package,
    /// À la carte: `AttendeeSelection.individualTickets`.
    IndividualTicket,
}

impl fmt::Display for SelectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionKind::Package => f.write_str("package"),
            SelectionKind::IndividualTicket => f.write_str("ticket"),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_mode_parsing() {
        assert_eq!(
            "individuals".parse::<RegistrationMode>().unwrap(),
            RegistrationMode::Individuals
        );
        assert_eq!(
            "individual".parse::<RegistrationMode>().unwrap(),
            RegistrationMode::Individuals
        );
        assert_eq!("Lodge".parse::<RegistrationMode>().unwrap(), RegistrationMode::Lodge);
        assert!("team".parse::<RegistrationMode>().is_err());
    }

    #[test]
    fn test_registration_mode_serde() {
        let json = serde_json::to_string(&RegistrationMode::Individuals).unwrap();
        assert_eq!(json, "\"individuals\"");

        let legacy: RegistrationMode = serde_json::from_str("\"individual\"").unwrap();
        assert_eq!(legacy, RegistrationMode::Individuals);
    }

    #[test]
    fn test_authoritative_ledger() {
        assert!(RegistrationMode::Individuals.uses_attendee_selections());
        assert!(RegistrationMode::Delegation.uses_attendee_selections());
        assert!(!RegistrationMode::Lodge.uses_attendee_selections());
        assert!(RegistrationMode::Lodge.uses_lodge_bulk());
    }

    #[test]
    fn test_default_mode() {
        assert_eq!(RegistrationMode::default(), RegistrationMode::Individuals);
    }
}
