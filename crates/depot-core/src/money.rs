//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    The shop trades in Rupiah, which has no circulating minor unit,      │
//! │    so one Money unit is one Rupiah. Sums are exact.                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use depot_core::money::Money;
//!
//! let price = Money::from_minor(15_000);   // Rp 15.000
//! let line = price * 2;                    // Rp 30.000
//! let total = line + Money::from_minor(20_000);
//! assert_eq!(total.to_string(), "Rp 50.000");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: Intermediate results (base + fee - discount) may dip
///   below zero before clamping
/// - **Single field tuple struct**: Serializes as a bare integer in JSON and
///   is stored as an INTEGER column (transparent for sqlx)
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product.price ──► CartItem.unit_price ──► line total ──► base_total    │
/// │                                                                         │
/// │  base_total + jerigen_fee - Coupon.discount_amount ──► grand_total      │
/// │                                                                         │
/// │  grand_total ──► Order.grand_total (frozen at checkout)                 │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use depot_core::money::Money;
    ///
    /// let price = Money::from_minor(10_000);
    /// assert_eq!(price.minor(), 10_000);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity, saturating at the `i64` bounds.
    ///
    /// ## Example
    /// ```rust
    /// use depot_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(15_000);
    /// assert_eq!(unit_price.multiply_quantity(2).minor(), 30_000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Clamps negative values to zero.
    ///
    /// ## Example
    /// ```rust
    /// use depot_core::money::Money;
    ///
    /// let owed = Money::from_minor(5_000) - Money::from_minor(10_000);
    /// assert_eq!(owed.floor_zero(), Money::zero());
    /// ```
    #[inline]
    pub const fn floor_zero(self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================
//
// Arithmetic saturates instead of wrapping: an out-of-range total must never
// come back as a negative amount that `floor_zero` turns into a free order.

/// Shows money the way the storefront prints it: `Rp 20.000`.
///
/// ## Note
/// Thousands are grouped with dots (Indonesian convention). This is for
/// logs and messages; the frontend formats amounts for display itself.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.0.unsigned_abs().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        write!(f, "{}Rp {}", sign, grouped)
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
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_minor() {
        let money = Money::from_minor(15_000);
        assert_eq!(money.minor(), 15_000);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_minor(20_000).to_string(), "Rp 20.000");
        assert_eq!(Money::from_minor(1_250_500).to_string(), "Rp 1.250.500");
        assert_eq!(Money::from_minor(500).to_string(), "Rp 500");
        assert_eq!(Money::from_minor(0).to_string(), "Rp 0");
        assert_eq!(Money::from_minor(-10_000).to_string(), "-Rp 10.000");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_minor(10_000);
        let b = Money::from_minor(2_500);

        assert_eq!((a + b).minor(), 12_500);
        assert_eq!((a - b).minor(), 7_500);
        assert_eq!((a * 3).minor(), 30_000);
    }

    #[test]
    fn test_sum() {
        let total: Money = [1_000, 2_000, 3_000]
            .into_iter()
            .map(Money::from_minor)
            .sum();
        assert_eq!(total.minor(), 6_000);
    }

    #[test]
    fn test_floor_zero() {
        assert_eq!(Money::from_minor(-1).floor_zero(), Money::zero());
        assert_eq!(Money::from_minor(0).floor_zero(), Money::zero());
        assert_eq!(Money::from_minor(42).floor_zero().minor(), 42);
    }

    #[test]
    fn test_arithmetic_saturates() {
        let huge = Money::from_minor(i64::MAX / 2 + 1);
        assert_eq!(huge.multiply_quantity(2).minor(), i64::MAX);
        assert_eq!((huge * 3).minor(), i64::MAX);
        assert_eq!((huge + huge).minor(), i64::MAX);
        assert_eq!((Money::from_minor(i64::MIN) - huge).minor(), i64::MIN);

        let total: Money = [huge, huge, Money::from_minor(1)].into_iter().sum();
        assert_eq!(total.minor(), i64::MAX);
        assert!(!total.floor_zero().is_negative());
    }

    #[test]
    fn test_is_negative() {
        assert!(!Money::zero().is_negative());
        assert!(Money::from_minor(-100).is_negative());
    }

    #[test]
    fn test_serializes_as_bare_integer() {
        let json = serde_json::to_string(&Money::from_minor(20_000)).unwrap();
        assert_eq!(json, "20000");
    }
}
