//! HTTP routes.
//!
//! ```text
//! /health
//! /api/customers/{customer_id}/cart ............ cart::*
//! /api/customers/{customer_id}/checkout ........ checkout::checkout
//! /api/customers/{customer_id}/orders .......... orders::list_orders
//! /api/admin/... ............................... admin::*
//! ```

pub mod admin;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod orders;

use axum::routing::{get, post, put};
use axum::Router;

use crate::state::AppState;

/// Customer-facing routes mounted under `/api/customers/{customer_id}`.
fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart::get_cart).delete(cart::clear_cart))
        .route("/cart/items", post(cart::add_item))
        .route(
            "/cart/items/{item_id}",
            put(cart::update_item).delete(cart::remove_item),
        )
        .route(
            "/cart/coupon",
            post(cart::apply_coupon).delete(cart::remove_coupon),
        )
        .route("/checkout", post(checkout::checkout))
        .route("/orders", get(orders::list_orders))
}

/// All application routes, before middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .nest("/api/customers/{customer_id}", customer_routes())
        .nest("/api/admin", admin::routes())
}
