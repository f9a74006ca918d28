//! # Captured Metadata
//!
//! Point-in-time display copies of catalog entries, stored alongside the
//! selections so a saved draft (or a historical order) can still be shown
//! with the names and prices the attendee saw.
//!
//! Metadata is for display and audit only. Pricing reads
//! [`CapturedPrices`](crate::pricing::CapturedPrices), never this module.
//!
//! First capture wins: re-capturing an id keeps the original snapshot.
//! The registration replaces a package snapshot only once nothing selected
//! refers to it any more.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::{FunctionDefinition, PackageDefinition, TicketDefinition};
use crate::money::Money;

/// Function snapshot shown in the wizard header and on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FunctionMetadata {
    pub function_id: String,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[ts(as = "Option<String>")]
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub captured_at: DateTime<Utc>,
}

/// Ticket snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TicketMetadata {
    pub ticket_id: String,
    pub event_id: String,
    pub name: String,
    pub price: Money,
    #[ts(as = "String")]
    pub captured_at: DateTime<Utc>,
}

/// Package snapshot, including what it contained at the time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PackageMetadata {
    pub package_id: String,
    pub name: String,
    pub price: Money,
    #[serde(default)]
    pub original_price: Option<Money>,
    pub included_ticket_ids: Vec<String>,
    #[ts(as = "String")]
    pub captured_at: DateTime<Utc>,
}

impl From<&FunctionDefinition> for FunctionMetadata {
    fn from(function: &FunctionDefinition) -> Self {
        FunctionMetadata {
            function_id: function.id.clone(),
            name: function.name.clone(),
            location: function.location.clone(),
            starts_at: function.starts_at,
            captured_at: Utc::now(),
        }
    }
}

impl From<&TicketDefinition> for TicketMetadata {
    fn from(ticket: &TicketDefinition) -> Self {
        TicketMetadata {
            ticket_id: ticket.id.clone(),
            event_id: ticket.event_id.clone(),
            name: ticket.name.clone(),
            price: ticket.price,
            captured_at: Utc::now(),
        }
    }
}

impl From<&PackageDefinition> for PackageMetadata {
    fn from(package: &PackageDefinition) -> Self {
        PackageMetadata {
            package_id: package.id.clone(),
            name: package.name.clone(),
            price: package.price,
            original_price: package.original_price,
            included_ticket_ids: package.includes.clone(),
            captured_at: Utc::now(),
        }
    }
}

/// All metadata captured during one registration session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CapturedMetadata {
    #[serde(default)]
    pub function: Option<FunctionMetadata>,
    #[serde(default)]
    pub tickets: BTreeMap<String, TicketMetadata>,
    #[serde(default)]
    pub packages: BTreeMap<String, PackageMetadata>,
}

impl CapturedMetadata {
    pub fn capture_function(&mut self, function: &FunctionDefinition) {
        if self.function.is_none() {
            self.function = Some(FunctionMetadata::from(function));
        }
    }

    pub fn capture_ticket(&mut self, ticket: &TicketDefinition) {
        self.tickets
            .entry(ticket.id.clone())
            .or_insert_with(|| TicketMetadata::from(ticket));
    }

    pub fn capture_package(&mut self, package: &PackageDefinition) {
        self.packages
            .entry(package.id.clone())
            .or_insert_with(|| PackageMetadata::from(package));
    }

    /// Overwrites any earlier snapshot of the package.
    pub fn recapture_package(&mut self, package: &PackageDefinition) {
        self.packages
            .insert(package.id.clone(), PackageMetadata::from(package));
    }

    pub fn ticket_name(&self, ticket_id: &str) -> Option<&str> {
        self.tickets.get(ticket_id).map(|t| t.name.as_str())
    }

    pub fn package_name(&self, package_id: &str) -> Option<&str> {
        self.packages.get(package_id).map(|p| p.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.function.is_none() && self.tickets.is_empty() && self.packages.is_empty()
    }

    pub fn clear(&mut self) {
        self.function = None;
        self.tickets.clear();
        self.packages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures;

    #[test]
    fn test_first_capture_wins() {
        let mut metadata = CapturedMetadata::default();
        let mut package = fixtures::full_weekend();
        metadata.capture_package(&package);

        package.name = "Renamed".to_string();
        package.price = Money::from_cents(1);
        metadata.capture_package(&package);

        let captured = &metadata.packages["pkg-weekend"];
        assert_eq!(captured.name, "Full Weekend Package");
        assert_eq!(captured.price.cents(), 18000);
        assert_eq!(captured.included_ticket_ids, vec!["tkt-gala".to_string()]);
    }

    #[test]
    fn test_recapture_replaces_snapshot() {
        let mut metadata = CapturedMetadata::default();
        let mut package = fixtures::full_weekend();
        metadata.capture_package(&package);

        package.includes.push("tkt-lunch".to_string());
        metadata.recapture_package(&package);
        assert_eq!(metadata.packages["pkg-weekend"].included_ticket_ids.len(), 2);
    }

    #[test]
    fn test_names_and_clear() {
        let mut metadata = CapturedMetadata::default();
        metadata.capture_function(&fixtures::catalog().function);
        metadata.capture_ticket(&fixtures::gala_dinner());

        assert_eq!(metadata.ticket_name("tkt-gala"), Some("Gala Dinner"));
        assert_eq!(metadata.package_name("pkg-weekend"), None);
        assert!(!metadata.is_empty());

        metadata.clear();
        assert!(metadata.is_empty());
    }
}
