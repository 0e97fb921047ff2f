//! # Cart Aggregate
//!
//! A customer's open cart: its lines, its optional coupon and the
//! mutations the storefront performs on it.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│ Coupon   │────►│ Checkout │       │
//! │  │  Cart    │     │          │     │ Applied  │     │ (order)  │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │                        │                 │                │             │
//! │                   add_item          apply_coupon          │             │
//! │                   update_quantity   remove_coupon         │             │
//! │                   remove_item                             │             │
//! │                        │                                  ▼             │
//! │                   clear ◄──────────────────────── cart emptied         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `(product_id, use_jerigen)`; adding the same pair
//!   increases the quantity
//! - Every line has `1 <= quantity <= MAX_ITEM_QUANTITY`
//! - At most `MAX_CART_ITEMS` lines
//! - At most one coupon
//!
//! Totals are never stored. [`Cart::totals`] derives them on every read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::{totals_for_items, CartTotals, PricingPolicy};
use crate::types::{CartItem, Coupon, Product};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Coupon State
// =============================================================================

/// Why an applied coupon does or does not discount the cart right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum CouponState {
    /// No coupon applied.
    None,
    /// Coupon applied and currently discounting.
    Active,
    /// Coupon applied but past its `valid_until`.
    Expired,
    /// Coupon applied but its quota ran out since.
    Exhausted,
}

// =============================================================================
// Cart
// =============================================================================

/// A customer's open cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub id: String,
    pub customer_id: String,
    pub items: Vec<CartItem>,
    /// The applied coupon, as currently stored (quota may have moved).
    pub coupon: Option<Coupon>,
    /// Discount recorded when the coupon was applied.
    pub discount_snapshot: Money,
    /// Optimistic concurrency stamp, bumped by every save.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart for a customer.
    pub fn new(customer_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Cart {
            id: Uuid::new_v4().to_string(),
            customer_id: customer_id.into(),
            items: Vec::new(),
            coupon: None,
            discount_snapshot: Money::zero(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Adds a product to the cart or increases the quantity of its line.
    ///
    /// ## Behavior
    /// - Same product with the same container flag: quantity increases
    /// - Otherwise: new line with the product's effective price frozen
    ///
    /// Stock is checked against everything of this product already in the
    /// cart, across both container flags.
    ///
    /// ## Returns
    /// The id of the line that was created or grown.
    pub fn add_item(
        &mut self,
        product: &Product,
        quantity: i64,
        use_jerigen: bool,
        now: DateTime<Utc>,
    ) -> CoreResult<String> {
        check_quantity(quantity)?;

        let already_in_cart: i64 = self
            .items
            .iter()
            .filter(|i| i.product_id == product.id)
            .map(|i| i.quantity)
            .sum();
        let requested = already_in_cart + quantity;
        if !product.can_sell(requested) {
            return Err(if product.is_available() {
                CoreError::InsufficientStock {
                    sku: product.sku.clone(),
                    available: product.stock_qty,
                    requested,
                }
            } else {
                CoreError::ProductUnavailable {
                    sku: product.sku.clone(),
                }
            });
        }

        if let Some(item) = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product.id && i.use_jerigen == use_jerigen)
        {
            let new_qty = item.quantity + quantity;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::InvalidQuantity {
                    quantity: new_qty,
                    reason: format!("cannot exceed {}", MAX_ITEM_QUANTITY),
                });
            }
            item.quantity = new_qty;
            return Ok(item.id.clone());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        let item = CartItem {
            id: Uuid::new_v4().to_string(),
            cart_id: self.id.clone(),
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            quantity,
            unit_price: product.effective_price(),
            use_jerigen,
            added_at: now,
        };
        let id = item.id.clone();
        self.items.push(item);
        Ok(id)
    }

    /// Sets the quantity of a line.
    ///
    /// A quantity of zero or less removes the line.
    pub fn update_quantity(&mut self, item_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return self.remove_item(item_id);
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::InvalidQuantity {
                quantity,
                reason: format!("cannot exceed {}", MAX_ITEM_QUANTITY),
            });
        }

        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))?;
        item.quantity = quantity;
        Ok(())
    }

    /// Removes a line from the cart.
    pub fn remove_item(&mut self, item_id: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.id != item_id);

        if self.items.len() == initial_len {
            Err(CoreError::ItemNotFound(item_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Empties the cart and drops its coupon.
    pub fn clear(&mut self) {
        self.items.clear();
        self.coupon = None;
        self.discount_snapshot = Money::zero();
    }

    /// Applies a coupon to the cart.
    ///
    /// ## Rules
    /// - A coupon that is still discounting blocks a new one
    ///   (`CouponAlreadyApplied`); a stale one (expired/exhausted) is replaced
    /// - The new coupon must pass [`Coupon::check_applicable`]
    /// - Quota is not consumed here
    pub fn apply_coupon(&mut self, coupon: Coupon, now: DateTime<Utc>) -> CoreResult<()> {
        if let Some(current) = &self.coupon {
            if current.is_valid_at(now) {
                return Err(CoreError::CouponAlreadyApplied(current.code.clone()));
            }
        }

        coupon.check_applicable(now)?;

        self.discount_snapshot = coupon.discount_amount;
        self.coupon = Some(coupon);
        Ok(())
    }

    /// Drops the applied coupon. Returns whether there was one.
    pub fn remove_coupon(&mut self) -> bool {
        self.discount_snapshot = Money::zero();
        self.coupon.take().is_some()
    }

    /// Derives the totals at `now`.
    pub fn totals(&self, now: DateTime<Utc>, policy: &PricingPolicy) -> CartTotals {
        totals_for_items(&self.items, self.coupon.as_ref(), now, policy)
    }

    pub fn coupon_state(&self, now: DateTime<Utc>) -> CouponState {
        match &self.coupon {
            None => CouponState::None,
            Some(c) if c.is_expired_at(now) => CouponState::Expired,
            Some(c) if c.quota <= 0 => CouponState::Exhausted,
            Some(_) => CouponState::Active,
        }
    }

    pub fn coupon_code(&self) -> Option<&str> {
        self.coupon.as_ref().map(|c| c.code.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn check_quantity(quantity: i64) -> CoreResult<()> {
    if quantity < 1 {
        return Err(CoreError::InvalidQuantity {
            quantity,
            reason: "must be at least 1".to_string(),
        });
    }
    if quantity > MAX_ITEM_QUANTITY {
        return Err(CoreError::InvalidQuantity {
            quantity,
            reason: format!("cannot exceed {}", MAX_ITEM_QUANTITY),
        });
    }
    Ok(())
}

// =============================================================================
// Summary
// =============================================================================

/// What the storefront shows for a cart: lines, coupon and derived totals.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartSummary {
    pub cart_id: String,
    pub customer_id: String,
    pub items: Vec<CartItem>,
    pub coupon_code: Option<String>,
    pub coupon_state: CouponState,
    pub totals: CartTotals,
}

impl CartSummary {
    pub fn of(cart: &Cart, now: DateTime<Utc>, policy: &PricingPolicy) -> Self {
        CartSummary {
            cart_id: cart.id.clone(),
            customer_id: cart.customer_id.clone(),
            items: cart.items.clone(),
            coupon_code: cart.coupon_code().map(str::to_string),
            coupon_state: cart.coupon_state(now),
            totals: cart.totals(now, policy),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ProductStatus, StockStatus};
    use chrono::Duration;

    fn test_product(id: &str, price: i64, stock_qty: i64) -> Product {
        Product {
            id: id.to_string(),
            sku: format!("SKU-{}", id),
            name: format!("Product {}", id),
            description: None,
            price: Money::from_minor(price),
            sale_price: None,
            stock_qty,
            stock_status: StockStatus::InStock,
            status: ProductStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn test_coupon(code: &str, discount: i64, valid_for: Duration, quota: i64) -> Coupon {
        let now = Utc::now();
        Coupon {
            code: code.to_string(),
            discount_amount: Money::from_minor(discount),
            valid_until: now + valid_for,
            quota,
            created_at: now,
        }
    }

    #[test]
    fn test_add_item_freezes_effective_price() {
        let now = Utc::now();
        let mut cart = Cart::new("cust-1", now);
        let mut product = test_product("1", 15_000, 10);
        product.sale_price = Some(Money::from_minor(12_000));

        let id = cart.add_item(&product, 2, false, now).unwrap();

        let item = cart.items.iter().find(|i| i.id == id).unwrap();
        assert_eq!(item.unit_price.minor(), 12_000);
        assert_eq!(item.cart_id, cart.id);

        product.sale_price = None;
        assert_eq!(cart.items[0].unit_price.minor(), 12_000);
    }

    #[test]
    fn test_add_same_product_merges_per_container_flag() {
        let now = Utc::now();
        let mut cart = Cart::new("cust-1", now);
        let product = test_product("1", 10_000, 20);

        let a = cart.add_item(&product, 2, true, now).unwrap();
        let b = cart.add_item(&product, 3, true, now).unwrap();
        assert_eq!(a, b);
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 5);

        cart.add_item(&product, 1, false, now).unwrap();
        assert_eq!(cart.items.len(), 2);
    }

    #[test]
    fn test_add_rejects_unavailable_product() {
        let now = Utc::now();
        let mut cart = Cart::new("cust-1", now);

        let mut archived = test_product("1", 10_000, 5);
        archived.status = ProductStatus::Archived;
        assert!(matches!(
            cart.add_item(&archived, 1, false, now),
            Err(CoreError::ProductUnavailable { .. })
        ));

        let mut sold_out = test_product("2", 10_000, 5);
        sold_out.stock_status = StockStatus::OutOfStock;
        assert!(matches!(
            cart.add_item(&sold_out, 1, false, now),
            Err(CoreError::ProductUnavailable { .. })
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_counts_stock_across_lines() {
        let now = Utc::now();
        let mut cart = Cart::new("cust-1", now);
        let product = test_product("1", 10_000, 5);

        cart.add_item(&product, 3, true, now).unwrap();
        let err = cart.add_item(&product, 3, false, now).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 5, requested: 6, .. }
        ));
    }

    #[test]
    fn test_add_rejects_bad_quantity() {
        let now = Utc::now();
        let mut cart = Cart::new("cust-1", now);
        let product = test_product("1", 10_000, 5_000);

        assert!(matches!(
            cart.add_item(&product, 0, false, now),
            Err(CoreError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            cart.add_item(&product, MAX_ITEM_QUANTITY + 1, false, now),
            Err(CoreError::InvalidQuantity { .. })
        ));
    }

    #[test]
    fn test_cart_line_limit() {
        let now = Utc::now();
        let mut cart = Cart::new("cust-1", now);
        for i in 0..MAX_CART_ITEMS {
            cart.add_item(&test_product(&i.to_string(), 1_000, 10), 1, false, now)
                .unwrap();
        }
        let err = cart
            .add_item(&test_product("extra", 1_000, 10), 1, false, now)
            .unwrap_err();
        assert!(matches!(err, CoreError::CartTooLarge { max } if max == MAX_CART_ITEMS));
    }

    #[test]
    fn test_update_quantity() {
        let now = Utc::now();
        let mut cart = Cart::new("cust-1", now);
        let id = cart.add_item(&test_product("1", 10_000, 10), 1, false, now).unwrap();

        cart.update_quantity(&id, 4).unwrap();
        assert_eq!(cart.items[0].quantity, 4);

        assert!(matches!(
            cart.update_quantity(&id, MAX_ITEM_QUANTITY + 1),
            Err(CoreError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            cart.update_quantity("missing", 2),
            Err(CoreError::ItemNotFound(_))
        ));

        cart.update_quantity(&id, 0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_item() {
        let now = Utc::now();
        let mut cart = Cart::new("cust-1", now);
        let id = cart.add_item(&test_product("1", 10_000, 10), 1, false, now).unwrap();

        cart.remove_item(&id).unwrap();
        assert!(matches!(cart.remove_item(&id), Err(CoreError::ItemNotFound(_))));
    }

    #[test]
    fn test_apply_then_remove_restores_totals() {
        let now = Utc::now();
        let policy = PricingPolicy::default();
        let mut cart = Cart::new("cust-1", now);
        cart.add_item(&test_product("1", 15_000, 10), 2, true, now).unwrap();

        let original = cart.totals(now, &policy);

        let coupon = test_coupon("POTONG10K", 10_000, Duration::days(10), 100);
        cart.apply_coupon(coupon, now).unwrap();
        let discounted = cart.totals(now, &policy);
        assert_eq!(discounted.discount_amount.minor(), 10_000);
        assert_eq!(original.grand_total - discounted.grand_total, Money::from_minor(10_000));
        assert_eq!(cart.coupon_state(now), CouponState::Active);

        assert!(cart.remove_coupon());
        assert_eq!(cart.totals(now, &policy), original);
        assert_eq!(cart.coupon_state(now), CouponState::None);

        assert!(!cart.remove_coupon());
    }

    #[test]
    fn test_apply_rejected_coupons_leave_totals_unchanged() {
        let now = Utc::now();
        let policy = PricingPolicy::default();
        let mut cart = Cart::new("cust-1", now);
        cart.add_item(&test_product("1", 15_000, 10), 2, false, now).unwrap();
        let before = cart.totals(now, &policy);

        let expired = test_coupon("OLD", 10_000, Duration::days(-1), 100);
        assert!(matches!(
            cart.apply_coupon(expired, now),
            Err(CoreError::ExpiredCoupon(_))
        ));

        let exhausted = test_coupon("EMPTY", 10_000, Duration::days(1), 0);
        assert!(matches!(
            cart.apply_coupon(exhausted, now),
            Err(CoreError::ExhaustedCoupon(_))
        ));

        assert!(cart.coupon.is_none());
        assert_eq!(cart.totals(now, &policy), before);
    }

    #[test]
    fn test_second_coupon_rejected_while_first_active() {
        let now = Utc::now();
        let mut cart = Cart::new("cust-1", now);
        cart.apply_coupon(test_coupon("POTONG10K", 10_000, Duration::days(1), 5), now)
            .unwrap();

        let err = cart
            .apply_coupon(test_coupon("HEMAT5K", 5_000, Duration::days(1), 5), now)
            .unwrap_err();
        assert!(matches!(err, CoreError::CouponAlreadyApplied(code) if code == "POTONG10K"));

        let err = cart
            .apply_coupon(test_coupon("POTONG10K", 10_000, Duration::days(1), 5), now)
            .unwrap_err();
        assert!(matches!(err, CoreError::CouponAlreadyApplied(_)));
    }

    #[test]
    fn test_stale_coupon_can_be_replaced() {
        let now = Utc::now();
        let mut cart = Cart::new("cust-1", now);
        cart.apply_coupon(test_coupon("SOON", 10_000, Duration::hours(1), 5), now)
            .unwrap();

        let later = now + Duration::hours(2);
        assert_eq!(cart.coupon_state(later), CouponState::Expired);

        let fresh = Coupon {
            valid_until: later + Duration::days(1),
            ..test_coupon("HEMAT5K", 5_000, Duration::days(1), 5)
        };
        cart.apply_coupon(fresh, later).unwrap();
        assert_eq!(cart.coupon_code(), Some("HEMAT5K"));
        assert_eq!(cart.discount_snapshot.minor(), 5_000);
    }

    #[test]
    fn test_clear_drops_items_and_coupon() {
        let now = Utc::now();
        let mut cart = Cart::new("cust-1", now);
        cart.add_item(&test_product("1", 10_000, 10), 1, false, now).unwrap();
        cart.apply_coupon(test_coupon("POTONG10K", 10_000, Duration::days(1), 5), now)
            .unwrap();

        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.coupon.is_none());
        assert_eq!(cart.discount_snapshot, Money::zero());
    }

    #[test]
    fn test_summary_reports_exhausted_coupon() {
        let now = Utc::now();
        let mut cart = Cart::new("cust-1", now);
        cart.add_item(&test_product("1", 30_000, 10), 1, false, now).unwrap();
        cart.apply_coupon(test_coupon("POTONG10K", 10_000, Duration::days(1), 1), now)
            .unwrap();
        if let Some(c) = cart.coupon.as_mut() {
            c.quota = 0;
        }

        let summary = CartSummary::of(&cart, now, &PricingPolicy::default());
        assert_eq!(summary.coupon_state, CouponState::Exhausted);
        assert_eq!(summary.coupon_code.as_deref(), Some("POTONG10K"));
        assert_eq!(summary.totals.discount_amount, Money::zero());
        assert_eq!(summary.totals.grand_total.minor(), 30_000);
    }
}
