//! # depot-core: Pure Business Logic for the Depot Storefront
//!
//! This crate is the **heart** of the storefront. It contains the cart
//! pricing engine, coupon rules and checkout preparation as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Depot Storefront Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Frontend (React SPA)                         │   │
//! │  │    Catalog ──► Cart ──► Coupon ──► Checkout ──► Order History   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/storefront (axum)                       │   │
//! │  │    cart routes, checkout, order history, admin catalog          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ depot-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  pricing  │  │   cart    │  │ checkout  │  │   │
//! │  │   │  Product  │  │  Totals   │  │   Cart    │  │ OrderDraft│  │   │
//! │  │   │  Coupon   │  │  Jerigen  │  │ CartItem  │  │  Status   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • NO CLOCK READS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    depot-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Product, Coupon, Order, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - The cart pricing engine
//! - [`coupon`] - Coupon validity rules
//! - [`cart`] - Cart aggregate and its mutations
//! - [`checkout`] - Turning a cart into an order draft
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use depot_core::money::Money;
//! use depot_core::pricing::{compute_totals, PricedLine, PricingPolicy};
//!
//! let lines = [PricedLine::new(2, Money::from_minor(15_000), false)];
//! let now = chrono::Utc::now();
//!
//! let totals = compute_totals(&lines, None, now, &PricingPolicy::default());
//! assert_eq!(totals.base_total.minor(), 30_000);
//! assert_eq!(totals.grand_total.minor(), 30_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod coupon;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartSummary, CouponState};
pub use checkout::{prepare_order, OrderDraft};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{compute_totals, CartTotals, JerigenMode, PricedLine, PricingPolicy};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Container (jerigen) surcharge per counted container, in Rupiah.
///
/// ## Business Reason
/// Liquid products can be delivered in a returnable jerigen. Each one is
/// billed at a flat fee on top of the goods. Deployments can override the
/// fee through [`PricingPolicy`].
pub const DEFAULT_JERIGEN_FEE: Money = Money::from_minor(20_000);

/// Upper bound for any single amount an admin or deployment can set
/// (product price, sale price, coupon discount, jerigen fee): Rp 1.000.000.000.
///
/// A full cart at this price (MAX_CART_ITEMS × MAX_ITEM_QUANTITY units)
/// stays far inside `i64`.
pub const MAX_PRICE: Money = Money::from_minor(1_000_000_000);

/// Maximum lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line in cart.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: i64 = 999;
