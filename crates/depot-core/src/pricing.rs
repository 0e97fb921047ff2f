//! # Cart Pricing Engine
//!
//! Recomputes the totals of a cart from its lines and optional coupon.
//!
//! ## Calculation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  lines ─────┬──► base_total    = Σ (quantity × unit_price)              │
//! │             │                                                           │
//! │             └──► jerigen_count = flagged lines      (PerLine)           │
//! │                                = Σ flagged quantity (PerUnit)           │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                  jerigen_fee   = jerigen_count × policy.jerigen_fee     │
//! │                                                                         │
//! │  coupon ───────► discount      = coupon.discount_amount if valid at now │
//! │                                = 0 otherwise                            │
//! │                                                                         │
//! │  grand_total = max(0, base_total + jerigen_fee − discount)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Totals are always derived. Nothing here is persisted, and nothing here
//! reads the clock: the caller passes `now`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{CartItem, Coupon};
use crate::DEFAULT_JERIGEN_FEE;

// =============================================================================
// Policy
// =============================================================================

/// How containers are counted for the jerigen fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum JerigenMode {
    /// One fee per flagged line, regardless of its quantity.
    #[default]
    PerLine,
    /// One fee per unit on flagged lines.
    PerUnit,
}

/// Deployment-level pricing knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    pub jerigen_fee: Money,
    pub jerigen_mode: JerigenMode,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            jerigen_fee: DEFAULT_JERIGEN_FEE,
            jerigen_mode: JerigenMode::PerLine,
        }
    }
}

impl PricingPolicy {
    pub fn new(jerigen_fee: Money, jerigen_mode: JerigenMode) -> Self {
        Self {
            jerigen_fee,
            jerigen_mode,
        }
    }
}

// =============================================================================
// Input / Output
// =============================================================================

/// The part of a cart line the pricing engine cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub quantity: i64,
    pub unit_price: Money,
    pub use_jerigen: bool,
}

impl PricedLine {
    pub fn new(quantity: i64, unit_price: Money, use_jerigen: bool) -> Self {
        Self {
            quantity,
            unit_price,
            use_jerigen,
        }
    }
}

impl From<&CartItem> for PricedLine {
    fn from(item: &CartItem) -> Self {
        Self::new(item.quantity, item.unit_price, item.use_jerigen)
    }
}

/// Computed totals of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    /// Number of lines.
    pub item_count: i64,
    /// Σ quantity over all lines.
    pub total_quantity: i64,
    pub base_total: Money,
    pub jerigen_count: i64,
    pub jerigen_fee: Money,
    pub discount_amount: Money,
    pub grand_total: Money,
}

// =============================================================================
// Engine
// =============================================================================

/// Computes cart totals.
///
/// ## Example
/// ```rust
/// use chrono::{Duration, Utc};
/// use depot_core::money::Money;
/// use depot_core::pricing::{compute_totals, PricedLine, PricingPolicy};
/// use depot_core::types::Coupon;
///
/// let now = Utc::now();
/// let coupon = Coupon {
///     code: "POTONG10K".to_string(),
///     discount_amount: Money::from_minor(10_000),
///     valid_until: now + Duration::days(10),
///     quota: 5,
///     created_at: now,
/// };
/// let lines = [PricedLine::new(1, Money::from_minor(10_000), true)];
///
/// let totals = compute_totals(&lines, Some(&coupon), now, &PricingPolicy::default());
/// assert_eq!(totals.jerigen_fee.minor(), 20_000);
/// assert_eq!(totals.grand_total.minor(), 20_000);
/// ```
pub fn compute_totals(
    lines: &[PricedLine],
    coupon: Option<&Coupon>,
    now: DateTime<Utc>,
    policy: &PricingPolicy,
) -> CartTotals {
    let base_total: Money = lines
        .iter()
        .map(|line| line.unit_price.multiply_quantity(line.quantity))
        .sum();

    let total_quantity = lines.iter().map(|line| line.quantity).sum();

    let flagged = lines.iter().filter(|line| line.use_jerigen);
    let jerigen_count = match policy.jerigen_mode {
        JerigenMode::PerLine => flagged.count() as i64,
        JerigenMode::PerUnit => flagged.map(|line| line.quantity).sum(),
    };
    let jerigen_fee = policy.jerigen_fee.multiply_quantity(jerigen_count);

    let discount_amount = coupon
        .filter(|c| c.is_valid_at(now))
        .map(|c| c.discount_amount)
        .unwrap_or_default();

    let grand_total = (base_total + jerigen_fee - discount_amount).floor_zero();

    CartTotals {
        item_count: lines.len() as i64,
        total_quantity,
        base_total,
        jerigen_count,
        jerigen_fee,
        discount_amount,
        grand_total,
    }
}

/// Convenience wrapper over [`compute_totals`] for stored cart items.
pub fn totals_for_items(
    items: &[CartItem],
    coupon: Option<&Coupon>,
    now: DateTime<Utc>,
    policy: &PricingPolicy,
) -> CartTotals {
    let lines: Vec<PricedLine> = items.iter().map(PricedLine::from).collect();
    compute_totals(&lines, coupon, now, policy)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon(discount: i64, valid_for: Duration, quota: i64, now: DateTime<Utc>) -> Coupon {
        Coupon {
            code: "POTONG10K".to_string(),
            discount_amount: Money::from_minor(discount),
            valid_until: now + valid_for,
            quota,
            created_at: now,
        }
    }

    fn line(qty: i64, price: i64, jerigen: bool) -> PricedLine {
        PricedLine::new(qty, Money::from_minor(price), jerigen)
    }

    #[test]
    fn test_plain_cart_without_coupon() {
        let now = Utc::now();
        let totals = compute_totals(&[line(2, 15_000, false)], None, now, &PricingPolicy::default());

        assert_eq!(totals.base_total.minor(), 30_000);
        assert_eq!(totals.jerigen_count, 0);
        assert_eq!(totals.jerigen_fee, Money::zero());
        assert_eq!(totals.discount_amount, Money::zero());
        assert_eq!(totals.grand_total.minor(), 30_000);
        assert_eq!(totals.item_count, 1);
        assert_eq!(totals.total_quantity, 2);
    }

    #[test]
    fn test_jerigen_fee_and_valid_coupon() {
        let now = Utc::now();
        let c = coupon(10_000, Duration::days(10), 5, now);
        let totals = compute_totals(&[line(1, 10_000, true)], Some(&c), now, &PricingPolicy::default());

        assert_eq!(totals.base_total.minor(), 10_000);
        assert_eq!(totals.jerigen_count, 1);
        assert_eq!(totals.jerigen_fee.minor(), 20_000);
        assert_eq!(totals.discount_amount.minor(), 10_000);
        assert_eq!(totals.grand_total.minor(), 20_000);
    }

    #[test]
    fn test_out_of_range_price_saturates_instead_of_going_free() {
        let now = Utc::now();
        let huge = i64::MAX / 2 + 1;
        let c = coupon(10_000, Duration::days(10), 5, now);
        let totals = compute_totals(&[line(2, huge, true)], Some(&c), now, &PricingPolicy::default());

        assert_eq!(totals.base_total.minor(), i64::MAX);
        assert!(totals.grand_total > Money::zero());
    }

    #[test]
    fn test_expired_coupon_gives_no_discount() {
        let now = Utc::now();
        let c = coupon(10_000, Duration::days(-1), 5, now);
        let lines = [line(2, 15_000, false)];

        let with = compute_totals(&lines, Some(&c), now, &PricingPolicy::default());
        let without = compute_totals(&lines, None, now, &PricingPolicy::default());
        assert_eq!(with, without);
    }

    #[test]
    fn test_exhausted_coupon_gives_no_discount() {
        let now = Utc::now();
        let c = coupon(10_000, Duration::days(1), 0, now);
        let totals = compute_totals(&[line(2, 15_000, false)], Some(&c), now, &PricingPolicy::default());
        assert_eq!(totals.discount_amount, Money::zero());
        assert_eq!(totals.grand_total.minor(), 30_000);
    }

    #[test]
    fn test_coupon_valid_until_is_exclusive() {
        let now = Utc::now();
        let c = coupon(5_000, Duration::zero(), 5, now);
        let totals = compute_totals(&[line(1, 15_000, false)], Some(&c), now, &PricingPolicy::default());
        assert_eq!(totals.discount_amount, Money::zero());
    }

    #[test]
    fn test_grand_total_floors_at_zero() {
        let now = Utc::now();
        let c = coupon(50_000, Duration::days(1), 1, now);
        let totals = compute_totals(&[line(1, 5_000, false)], Some(&c), now, &PricingPolicy::default());

        assert_eq!(totals.discount_amount.minor(), 50_000);
        assert_eq!(totals.grand_total, Money::zero());
    }

    #[test]
    fn test_empty_cart() {
        let totals = compute_totals(&[], None, Utc::now(), &PricingPolicy::default());
        assert_eq!(totals, CartTotals::default());
    }

    #[test]
    fn test_jerigen_mode_per_line_vs_per_unit() {
        let now = Utc::now();
        let lines = [line(3, 10_000, true), line(2, 5_000, true), line(4, 1_000, false)];

        let per_line = compute_totals(&lines, None, now, &PricingPolicy::default());
        assert_eq!(per_line.jerigen_count, 2);
        assert_eq!(per_line.jerigen_fee.minor(), 40_000);

        let policy = PricingPolicy::new(Money::from_minor(20_000), JerigenMode::PerUnit);
        let per_unit = compute_totals(&lines, None, now, &policy);
        assert_eq!(per_unit.jerigen_count, 5);
        assert_eq!(per_unit.jerigen_fee.minor(), 100_000);
        assert_eq!(per_unit.base_total.minor(), 44_000);
    }

    #[test]
    fn test_custom_fee() {
        let policy = PricingPolicy::new(Money::from_minor(15_000), JerigenMode::PerLine);
        let totals = compute_totals(&[line(1, 1_000, true)], None, Utc::now(), &policy);
        assert_eq!(totals.jerigen_fee.minor(), 15_000);
        assert_eq!(totals.grand_total.minor(), 16_000);
    }

    #[test]
    fn test_discount_lowers_grand_total_by_exact_amount() {
        let now = Utc::now();
        let lines = [line(3, 12_500, false), line(1, 40_000, true)];
        let c = coupon(7_500, Duration::hours(1), 3, now);
        let policy = PricingPolicy::default();

        let before = compute_totals(&lines, None, now, &policy);
        let after = compute_totals(&lines, Some(&c), now, &policy);
        assert_eq!(before.grand_total - after.grand_total, Money::from_minor(7_500));
        assert_eq!(before.base_total, after.base_total);
    }
}
