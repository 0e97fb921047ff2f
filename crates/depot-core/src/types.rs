//! # Domain Types
//!
//! Core domain records used throughout the storefront.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    CartItem     │   │     Coupon      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  product_id(FK) │   │  code (unique)  │       │
//! │  │  sku (business) │   │  cart_id (FK)   │   │  discount_amount│       │
//! │  │  price          │   │  unit_price     │   │  valid_until    │       │
//! │  │  stock_qty      │   │  use_jerigen    │   │  quota          │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Order       │   │   OrderItem     │   │  OrderStatus    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  code           │◄──│  order_id (FK)  │   │  Pending        │       │
//! │  │  grand_total    │   │  name_snapshot  │   │  Confirmed      │       │
//! │  │  coupon_code    │   │  line_total     │   │  Completed      │       │
//! │  └─────────────────┘   └─────────────────┘   │  Cancelled      │       │
//! │                                               └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (sku, coupon code, order code) - human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// Catalog visibility of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ProductStatus {
    /// Listed and purchasable.
    #[default]
    Active,
    /// Soft-deleted. Historical orders still reference it.
    Archived,
}

/// Stock flag maintained by the admin alongside the numeric stock level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum StockStatus {
    #[default]
    InStock,
    OutOfStock,
}

/// A product available in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name.
    pub name: String,

    /// Optional description for product details.
    pub description: Option<String>,

    /// Regular price.
    pub price: Money,

    /// Promotional price. Only used when lower than `price`.
    pub sale_price: Option<Money>,

    /// Units on hand.
    pub stock_qty: i64,

    pub stock_status: StockStatus,

    pub status: ProductStatus,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price a shopper pays right now.
    ///
    /// ## Example
    /// ```text
    /// price 15.000, sale_price None    → 15.000
    /// price 15.000, sale_price 12.000  → 12.000
    /// price 15.000, sale_price 18.000  → 15.000 (ignored, not a discount)
    /// ```
    pub fn effective_price(&self) -> Money {
        match self.sale_price {
            Some(sale) if sale < self.price => sale,
            _ => self.price,
        }
    }

    /// Checks if product is listed and flagged in stock.
    pub fn is_available(&self) -> bool {
        self.status == ProductStatus::Active && self.stock_status == StockStatus::InStock
    }

    /// Checks if `quantity` units can be sold from current stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.is_available() && self.stock_qty >= quantity
    }
}

// =============================================================================
// Coupon
// =============================================================================

/// A named discount voucher with an expiry and a consumption quota.
///
/// Validity rules live in [`crate::coupon`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Coupon {
    /// Case-sensitive unique code, e.g. `POTONG10K`.
    pub code: String,

    /// Fixed amount taken off the cart.
    pub discount_amount: Money,

    /// The coupon stops applying at this instant.
    #[ts(as = "String")]
    pub valid_until: DateTime<Utc>,

    /// Remaining uses. Consumed at order placement, never at apply time.
    pub quota: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Cart Item
// =============================================================================

/// A line in a shopping cart.
///
/// ## Snapshot Pattern
/// `sku`, `name` and `unit_price` are frozen when the line is created, so
/// the cart keeps its price even if the catalog price changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CartItem {
    pub id: String,
    pub cart_id: String,
    pub product_id: String,
    /// SKU at time of adding (frozen).
    pub sku: String,
    /// Product name at time of adding (frozen).
    pub name: String,
    /// Always ≥ 1.
    pub quantity: i64,
    /// Price at time of adding (frozen).
    pub unit_price: Money,
    /// Delivered in a returnable container; attracts the jerigen fee.
    pub use_jerigen: bool,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Calculates the line total (unit price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The lifecycle state of an order.
///
/// ## Transitions
/// ```text
/// ┌──────────┐     ┌───────────┐     ┌───────────┐
/// │ PENDING  │────►│ CONFIRMED │────►│ COMPLETED │
/// └────┬─────┘     └─────┬─────┘     └───────────┘
///      │                 │
///      ▼                 ▼
/// ┌──────────────────────────┐
/// │        CANCELLED         │
/// └──────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum OrderStatus {
    /// Placed, waiting for payment confirmation.
    #[default]
    Pending,
    /// Paid.
    Confirmed,
    /// Delivered.
    Completed,
    /// Abandoned or refunded.
    Cancelled,
}

impl OrderStatus {
    /// Returns whether an order in this status may move to `next`.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Completed) | (Confirmed, Cancelled)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Order
// =============================================================================

/// A placed order. Totals are frozen copies of the cart totals at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    /// Human-readable code, e.g. `ORD-20261019-1A2B3C4D`.
    pub code: String,
    pub customer_id: String,
    pub status: OrderStatus,
    pub base_total: Money,
    pub jerigen_count: i64,
    pub jerigen_fee: Money,
    pub discount_amount: Money,
    pub grand_total: Money,
    pub coupon_code: Option<String>,
    #[ts(as = "String")]
    pub order_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A line in an order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// SKU at time of sale (frozen).
    pub sku_snapshot: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub use_jerigen: bool,
    /// unit_price × quantity.
    pub line_total: Money,
}

/// An order together with its lines, as shown in order history.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderWithItems {
    #[serde(flatten)]
    #[ts(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: i64, sale_price: Option<i64>) -> Product {
        Product {
            id: "p-1".to_string(),
            sku: "AIR-19L".to_string(),
            name: "Air Mineral 19L".to_string(),
            description: None,
            price: Money::from_minor(price),
            sale_price: sale_price.map(Money::from_minor),
            stock_qty: 10,
            stock_status: StockStatus::InStock,
            status: ProductStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_effective_price_prefers_lower_sale_price() {
        assert_eq!(product(15_000, None).effective_price().minor(), 15_000);
        assert_eq!(product(15_000, Some(12_000)).effective_price().minor(), 12_000);
        assert_eq!(product(15_000, Some(18_000)).effective_price().minor(), 15_000);
    }

    #[test]
    fn test_can_sell() {
        let mut p = product(15_000, None);
        assert!(p.can_sell(10));
        assert!(!p.can_sell(11));

        p.status = ProductStatus::Archived;
        assert!(!p.can_sell(1));

        p.status = ProductStatus::Active;
        p.stock_status = StockStatus::OutOfStock;
        assert!(!p.can_sell(1));
    }

    #[test]
    fn test_order_status_transitions() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
    }

    #[test]
    fn test_order_status_serde() {
        let json = serde_json::to_string(&OrderStatus::Confirmed).unwrap();
        assert_eq!(json, "\"CONFIRMED\"");
        let status: OrderStatus = serde_json::from_str("\"CANCELLED\"").unwrap();
        assert_eq!(status, OrderStatus::Cancelled);
    }
}
