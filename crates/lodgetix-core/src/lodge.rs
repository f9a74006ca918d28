//! # Lodge Bulk Ledger
//!
//! A lodge buys N copies of one package as a block, without naming the
//! attendees up front. Only one bulk selection exists at a time.
//!
//! ```text
//!   quantity = 2      package: Lodge Table of 10 @ $1,950.00
//!        │
//!        ├── willGenerateTickets = 2 × 10        = 20
//!        └── subtotal            = 2 × $1,950.00 = $3,900.00
//! ```
//!
//! Also holds the booking contact and lodge identity captured on the lodge
//! form, which checkout validation requires.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::PackageDefinition;
use crate::error::{CoreError, CoreResult};
use crate::expansion::check_quantity;
use crate::money::Money;
use crate::pricing::line_total;

/// N copies of one package bought by a lodge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LodgeBulkSelection {
    pub package_id: String,
    pub quantity: u32,
    pub subtotal: Money,
    pub will_generate_tickets: u32,
}

impl LodgeBulkSelection {
    /// Computes a bulk selection from the package and its pinned unit price.
    ///
    /// ## Errors
    /// - [`CoreError::EmptyPackage`] if the package includes nothing
    /// - [`CoreError::InactiveCatalogItem`] if the package is off sale
    /// - quantity errors from [`check_quantity`]
    pub fn for_package(
        package: &PackageDefinition,
        unit_price: Money,
        quantity: u32,
    ) -> CoreResult<Self> {
        package.ensure_on_sale()?;
        package.ensure_has_tickets()?;
        check_quantity(quantity)?;

        Ok(LodgeBulkSelection {
            package_id: package.id.clone(),
            quantity,
            subtotal: line_total(unit_price, quantity, &package.id)?,
            will_generate_tickets: generated_tickets(
                &package.id,
                quantity,
                package.tickets_per_package(),
            )?,
        })
    }

    /// Checks stored totals against a unit price and (when known) the number
    /// of tickets per package.
    pub fn verify(&self, unit_price: Money, tickets_per_package: Option<u32>) -> CoreResult<()> {
        check_quantity(self.quantity)?;

        let expected = line_total(unit_price, self.quantity, &self.package_id)?;
        if self.subtotal != expected {
            return Err(CoreError::LodgeBulkMismatch {
                package_id: self.package_id.clone(),
                reason: format!("subtotal {} but {} × {} is {}", self.subtotal, self.quantity, unit_price, expected),
            });
        }

        if let Some(per_package) = tickets_per_package {
            let expected = generated_tickets(&self.package_id, self.quantity, per_package)?;
            if self.will_generate_tickets != expected {
                return Err(CoreError::LodgeBulkMismatch {
                    package_id: self.package_id.clone(),
                    reason: format!(
                        "willGenerateTickets {} but {} × {} is {}",
                        self.will_generate_tickets, self.quantity, per_package, expected
                    ),
                });
            }
        }
        Ok(())
    }
}

fn generated_tickets(package_id: &str, quantity: u32, per_package: u32) -> CoreResult<u32> {
    quantity
        .checked_mul(per_package)
        .ok_or_else(|| CoreError::LodgeBulkMismatch {
            package_id: package_id.to_string(),
            reason: format!("{quantity} × {per_package} tickets does not fit"),
        })
}

/// Person responsible for a lodge booking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BookingContact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Which lodge is buying.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LodgeDetails {
    pub grand_lodge_id: String,
    pub lodge_id: String,
    pub lodge_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures;

    #[test]
    fn test_two_tables_of_ten() {
        let table = fixtures::lodge_table();
        let bulk = LodgeBulkSelection::for_package(&table, table.price, 2).unwrap();

        assert_eq!(bulk.will_generate_tickets, 20);
        assert_eq!(bulk.subtotal.cents(), 390000);
        assert!(bulk.verify(table.price, Some(10)).is_ok());
    }

    #[test]
    fn test_invariant_holds_for_many_quantities() {
        let package = fixtures::dinner_and_lunch();
        for quantity in 1..=12 {
            let bulk = LodgeBulkSelection::for_package(&package, package.price, quantity).unwrap();
            assert_eq!(bulk.will_generate_tickets, quantity * 2);
            assert_eq!(bulk.subtotal, package.price.multiply_quantity(quantity));
        }
    }

    #[test]
    fn test_rejects_empty_package_and_zero_quantity() {
        let empty = fixtures::empty_package();
        assert!(matches!(
            LodgeBulkSelection::for_package(&empty, empty.price, 1),
            Err(CoreError::EmptyPackage { .. })
        ));

        let table = fixtures::lodge_table();
        assert!(LodgeBulkSelection::for_package(&table, table.price, 0).is_err());
    }

    #[test]
    fn test_verify_detects_tampered_totals() {
        let table = fixtures::lodge_table();
        let mut bulk = LodgeBulkSelection::for_package(&table, table.price, 2).unwrap();

        bulk.subtotal = Money::from_cents(1);
        assert!(matches!(
            bulk.verify(table.price, None),
            Err(CoreError::LodgeBulkMismatch { .. })
        ));

        bulk.subtotal = Money::from_cents(390000);
        bulk.will_generate_tickets = 19;
        assert!(bulk.verify(table.price, None).is_ok());
        assert!(bulk.verify(table.price, Some(10)).is_err());
    }

    #[test]
    fn test_verify_rejects_overflowing_price() {
        let table = fixtures::lodge_table();
        let mut bulk = LodgeBulkSelection::for_package(&table, table.price, 2).unwrap();
        bulk.subtotal = Money::zero();

        let err = bulk
            .verify(Money::from_cents(9_000_000_000_000_000_000), Some(10))
            .unwrap_err();
        assert!(matches!(err, CoreError::PriceOverflow { .. }));
    }
}
