//! Order administration: lookup and status transitions.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use depot_core::checkout::ensure_transition;
use depot_core::{CoreError, OrderStatus, OrderWithItems};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// GET /api/admin/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderWithItems>> {
    debug!(id = %id, "get_order");

    let order = state
        .db()
        .orders()
        .get_by_id(&id)
        .await?
        .ok_or(CoreError::OrderNotFound(id))?;
    Ok(Json(order))
}

/// PUT /api/admin/orders/{id}/status
///
/// ```text
/// PENDING ──► CONFIRMED ──► COMPLETED
///    │            │
///    └────────────┴──► CANCELLED
/// ```
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> ApiResult<Json<OrderWithItems>> {
    debug!(id = %id, status = %request.status, "update_order_status");

    let orders = state.db().orders();
    let mut order = orders
        .get_by_id(&id)
        .await?
        .ok_or_else(|| CoreError::OrderNotFound(id.clone()))?;

    ensure_transition(&order.order, request.status)?;

    let now = Utc::now();
    orders
        .update_status(&id, order.order.status, request.status, now)
        .await?;

    info!(
        order_code = %order.order.code,
        from = %order.order.status,
        to = %request.status,
        "Order status updated"
    );
    order.order.status = request.status;
    order.order.updated_at = now;
    Ok(Json(order))
}
