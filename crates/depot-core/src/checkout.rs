//! # Checkout
//!
//! Turns a cart into an order draft that the database layer persists.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cart ──► prepare_order(cart, order_id, now, policy)                    │
//! │              │                                                          │
//! │              ├── empty cart ─────────────► EmptyCart                    │
//! │              ├── coupon expired ─────────► ExpiredCoupon                │
//! │              ├── coupon quota 0 ─────────► ExhaustedCoupon              │
//! │              │                                                          │
//! │              ▼                                                          │
//! │          OrderDraft { order, items }     (totals frozen)                │
//! │              │                                                          │
//! │              ▼                                                          │
//! │  depot-db OrderRepository::place_order (one transaction)                │
//! │     insert order + items, consume coupon quota, decrement stock,        │
//! │     empty the cart                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult};
use crate::pricing::PricingPolicy;
use crate::types::{Order, OrderItem, OrderStatus};

/// An order ready to be persisted, with frozen totals and line snapshots.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderDraft {
    /// The coupon whose quota this order consumes, if any.
    pub fn coupon_code(&self) -> Option<&str> {
        self.order.coupon_code.as_deref()
    }
}

/// Builds the human-readable order code: `ORD-YYYYMMDD-XXXXXXXX`.
///
/// The suffix is the first 8 hex digits of the order id, uppercased.
pub fn order_code(order_id: Uuid, now: DateTime<Utc>) -> String {
    let hex = order_id.simple().to_string().to_uppercase();
    format!("ORD-{}-{}", now.format("%Y%m%d"), &hex[..8])
}

/// Validates the cart for checkout and snapshots it into an [`OrderDraft`].
///
/// The coupon is checked again here: a coupon that was fine when applied
/// may have expired or run out since. That is an error, not a silent drop.
pub fn prepare_order(
    cart: &Cart,
    order_id: Uuid,
    now: DateTime<Utc>,
    policy: &PricingPolicy,
) -> CoreResult<OrderDraft> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    if let Some(coupon) = &cart.coupon {
        coupon.check_applicable(now)?;
    }

    let totals = cart.totals(now, policy);
    let id = order_id.to_string();

    let order = Order {
        id: id.clone(),
        code: order_code(order_id, now),
        customer_id: cart.customer_id.clone(),
        status: OrderStatus::Pending,
        base_total: totals.base_total,
        jerigen_count: totals.jerigen_count,
        jerigen_fee: totals.jerigen_fee,
        discount_amount: totals.discount_amount,
        grand_total: totals.grand_total,
        coupon_code: cart.coupon_code().map(str::to_string),
        order_date: now,
        updated_at: now,
    };

    let items = cart
        .items
        .iter()
        .map(|item| OrderItem {
            id: Uuid::new_v4().to_string(),
            order_id: id.clone(),
            product_id: item.product_id.clone(),
            sku_snapshot: item.sku.clone(),
            name_snapshot: item.name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            use_jerigen: item.use_jerigen,
            line_total: item.line_total(),
        })
        .collect();

    Ok(OrderDraft { order, items })
}

/// Checks that an order may move to `next`.
pub fn ensure_transition(order: &Order, next: OrderStatus) -> CoreResult<()> {
    if order.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(CoreError::InvalidOrderStatus {
            order_code: order.code.clone(),
            current_status: order.status.to_string(),
            requested_status: next.to_string(),
        })
    }
}
