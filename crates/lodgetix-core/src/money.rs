//! # Money Module
//!
//! Provides the `Money` type for every price the registration engine touches.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  The wizard front end historically summed prices as JS numbers:        │
//! │    1950 × 2 + 0.1 + 0.2 = 3900.3000000000002  ❌                        │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Package $1,950.00 = 195000 cents                                     │
//! │    2 × 195000 = 390000 cents = $3,900.00 exactly                        │
//! │                                                                         │
//! │  The draft wire format carries cents, so what is saved is exactly      │
//! │  what is restored.                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use lodgetix_core::money::Money;
//!
//! let package = Money::from_major_minor(180, 0); // $180.00
//! let two = package.multiply_quantity(2);
//! assert_eq!(two.cents(), 36000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  PackageDefinition.price ──► CapturedPrices ──► attendee subtotal      │
/// │  TicketDefinition.price  ──► CapturedPrices ──► attendee subtotal      │
/// │                                                      │                  │
/// │  LodgeBulkSelection.subtotal ──────────────────┐     ▼                  │
/// │                                                └──► OrderSummary.subtotal
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use lodgetix_core::money::Money;
    ///
    /// let gala = Money::from_cents(15000); // $150.00
    /// assert_eq!(gala.cents(), 15000);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from dollars and cents.
    ///
    /// For negative amounts only the major unit should be negative:
    /// `from_major_minor(-5, 50)` is -$5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-dollar portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a selection quantity.
    ///
    /// ## Example
    /// ```rust
    /// use lodgetix_core::money::Money;
    ///
    /// let table = Money::from_cents(195000); // $1,950.00
    /// assert_eq!(table.multiply_quantity(2).cents(), 390000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: u32) -> Self {
        Money(self.0 * qty as i64)
    }

    /// Like [`multiply_quantity`](Self::multiply_quantity), but `None` on
    /// overflow. Use for any price that came from outside the process.
    #[inline]
    pub fn checked_multiply_quantity(&self, qty: u32) -> Option<Self> {
        self.0.checked_mul(i64::from(qty)).map(Money)
    }

    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Amount saved by buying at `self` instead of `reference`.
    ///
    /// Returns zero when `self` is not cheaper, so a mispriced bundle never
    /// advertises negative savings.
    ///
    /// ## Example
    /// ```rust
    /// use lodgetix_core::money::Money;
    ///
    /// let bundle = Money::from_cents(18000);
    /// let separately = Money::from_cents(20000);
    /// assert_eq!(bundle.savings_against(separately).cents(), 2000);
    /// assert!(separately.savings_against(bundle).is_zero());
    /// ```
    pub fn savings_against(&self, reference: Money) -> Money {
        if reference.0 > self.0 {
            Money(reference.0 - self.0)
        } else {
            Money::zero()
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug/receipt formatting. The wizard formats for locale itself.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by a selection quantity.
impl Mul<u32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: u32) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
