//! Back-office endpoints: catalog, coupons and orders.

pub mod coupons;
pub mod orders;
pub mod products;

use axum::routing::{get, put};
use axum::Router;

use crate::state::AppState;

/// Routes mounted under `/api/admin`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/products/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::archive_product),
        )
        .route(
            "/coupons",
            get(coupons::list_coupons).post(coupons::create_coupon),
        )
        .route("/orders/{id}", get(orders::get_order))
        .route("/orders/{id}/status", put(orders::update_order_status))
}
