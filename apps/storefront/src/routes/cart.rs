//! # Cart Handlers
//!
//! Every mutation follows the same sequence under the customer's lock:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  lock(customer) → load cart → mutate (depot-core) → save (versioned)    │
//! │                                           │                             │
//! │                                           └──► CartSummary (fresh totals)│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lookups that do not touch the cart (product, coupon) happen before the
//! lock is taken.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use depot_core::coupon::resolve_code;
use depot_core::validation::{validate_customer_id, validate_quantity, validate_uuid};
use depot_core::{Cart, CartSummary, CoreError};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub use_jerigen: bool,
}

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct ApplyCouponRequest {
    pub code: String,
}

/// Loads the cart under the customer's lock, applies `mutate` and saves.
///
/// `mutate` returns whether it changed anything; unchanged carts are not
/// written back.
async fn mutate_cart<F>(state: &AppState, customer_id: &str, mutate: F) -> ApiResult<CartSummary>
where
    F: FnOnce(&mut Cart, DateTime<Utc>) -> Result<bool, ApiError>,
{
    let _guard = state.cart_locks().lock(customer_id).await;
    let now = Utc::now();
    let carts = state.db().carts();

    let mut cart = carts.get_or_create(customer_id, now).await?;
    if mutate(&mut cart, now)? {
        carts.save(&mut cart, now).await?;
    }

    Ok(CartSummary::of(&cart, now, state.policy()))
}

/// GET /api/customers/{customer_id}/cart
pub async fn get_cart(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> ApiResult<Json<CartSummary>> {
    validate_customer_id(&customer_id)?;
    debug!(customer_id = %customer_id, "get_cart");

    let now = Utc::now();
    let cart = state.db().carts().get_or_create(&customer_id, now).await?;
    Ok(Json(CartSummary::of(&cart, now, state.policy())))
}

/// POST /api/customers/{customer_id}/cart/items
pub async fn add_item(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    Json(request): Json<AddItemRequest>,
) -> ApiResult<Json<CartSummary>> {
    validate_customer_id(&customer_id)?;
    validate_uuid("product_id", &request.product_id)?;
    validate_quantity(request.quantity)?;
    debug!(
        customer_id = %customer_id,
        product_id = %request.product_id,
        quantity = request.quantity,
        use_jerigen = request.use_jerigen,
        "add_item"
    );

    let product = state
        .db()
        .products()
        .get_by_id(&request.product_id)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(request.product_id.clone()))?;

    let summary = mutate_cart(&state, &customer_id, |cart, now| {
        cart.add_item(&product, request.quantity, request.use_jerigen, now)?;
        Ok(true)
    })
    .await?;

    Ok(Json(summary))
}

/// PUT /api/customers/{customer_id}/cart/items/{item_id}
///
/// A quantity of zero or less removes the line. A higher quantity is not
/// checked against stock here; a shortfall is rejected at checkout with
/// `INSUFFICIENT_STOCK`.
pub async fn update_item(
    State(state): State<AppState>,
    Path((customer_id, item_id)): Path<(String, String)>,
    Json(request): Json<UpdateItemRequest>,
) -> ApiResult<Json<CartSummary>> {
    validate_customer_id(&customer_id)?;
    debug!(customer_id = %customer_id, item_id = %item_id, quantity = request.quantity, "update_item");

    let summary = mutate_cart(&state, &customer_id, |cart, _| {
        cart.update_quantity(&item_id, request.quantity)?;
        Ok(true)
    })
    .await?;

    Ok(Json(summary))
}

/// DELETE /api/customers/{customer_id}/cart/items/{item_id}
pub async fn remove_item(
    State(state): State<AppState>,
    Path((customer_id, item_id)): Path<(String, String)>,
) -> ApiResult<Json<CartSummary>> {
    validate_customer_id(&customer_id)?;
    debug!(customer_id = %customer_id, item_id = %item_id, "remove_item");

    let summary = mutate_cart(&state, &customer_id, |cart, _| {
        cart.remove_item(&item_id)?;
        Ok(true)
    })
    .await?;

    Ok(Json(summary))
}

/// DELETE /api/customers/{customer_id}/cart
///
/// Drops every line and the coupon.
pub async fn clear_cart(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> ApiResult<Json<CartSummary>> {
    validate_customer_id(&customer_id)?;
    debug!(customer_id = %customer_id, "clear_cart");

    let summary = mutate_cart(&state, &customer_id, |cart, _| {
        let changed = !cart.is_empty() || cart.coupon.is_some();
        cart.clear();
        Ok(changed)
    })
    .await?;

    Ok(Json(summary))
}

/// POST /api/customers/{customer_id}/cart/coupon
///
/// Rejections (unknown, expired, exhausted, already applied) leave the cart
/// untouched.
pub async fn apply_coupon(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    Json(request): Json<ApplyCouponRequest>,
) -> ApiResult<Json<CartSummary>> {
    validate_customer_id(&customer_id)?;
    let code = request.code.trim().to_string();
    debug!(customer_id = %customer_id, code = %code, "apply_coupon");

    let found = if code.is_empty() {
        None
    } else {
        state.db().coupons().get_by_code(&code).await?
    };
    let coupon = resolve_code(&code, found)?;

    let summary = mutate_cart(&state, &customer_id, |cart, now| {
        cart.apply_coupon(coupon, now)?;
        Ok(true)
    })
    .await?;

    info!(
        customer_id = %customer_id,
        code = %code,
        discount = summary.totals.discount_amount.minor(),
        "Coupon applied"
    );
    Ok(Json(summary))
}

/// DELETE /api/customers/{customer_id}/cart/coupon
///
/// Removing when nothing is applied is not an error. Never touches quota.
pub async fn remove_coupon(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> ApiResult<Json<CartSummary>> {
    validate_customer_id(&customer_id)?;
    debug!(customer_id = %customer_id, "remove_coupon");

    let summary = mutate_cart(&state, &customer_id, |cart, _| Ok(cart.remove_coupon())).await?;

    Ok(Json(summary))
}
