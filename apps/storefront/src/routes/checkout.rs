//! # Checkout Handler
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  lock(customer)                                                         │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  prepare_order (depot-core)   empty cart, stale coupon → reject         │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  place_order (one transaction)                                          │
//! │     ├── Placed ............................ 201 + order                 │
//! │     ├── CouponExhausted / ProductUnavailable                            │
//! │     │   / InsufficientStock ............... 422                         │
//! │     └── CartChanged ....................... 409                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use depot_core::validation::validate_customer_id;
use depot_core::{prepare_order, CoreError, OrderWithItems};
use depot_db::PlaceOrderOutcome;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// POST /api/customers/{customer_id}/checkout
pub async fn checkout(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> ApiResult<(StatusCode, Json<OrderWithItems>)> {
    validate_customer_id(&customer_id)?;
    debug!(customer_id = %customer_id, "checkout");

    let _guard = state.cart_locks().lock(&customer_id).await;
    let now = Utc::now();

    let cart = state.db().carts().get_or_create(&customer_id, now).await?;
    let draft = prepare_order(&cart, Uuid::new_v4(), now, state.policy())?;

    match state.db().orders().place_order(&draft, &cart, now).await? {
        PlaceOrderOutcome::Placed(order) => {
            info!(
                order_code = %order.order.code,
                customer_id = %customer_id,
                grand_total = order.order.grand_total.minor(),
                coupon = ?order.order.coupon_code,
                "Order placed"
            );
            Ok((StatusCode::CREATED, Json(order)))
        }
        PlaceOrderOutcome::CouponExhausted { code } => Err(CoreError::ExhaustedCoupon(code).into()),
        PlaceOrderOutcome::ProductUnavailable { sku } => {
            Err(CoreError::ProductUnavailable { sku }.into())
        }
        PlaceOrderOutcome::InsufficientStock {
            sku,
            available,
            requested,
        } => Err(CoreError::InsufficientStock {
            sku,
            available,
            requested,
        }
        .into()),
        PlaceOrderOutcome::CartChanged => Err(ApiError::conflict(
            "Cart changed during checkout; reload and try again",
        )),
    }
}
