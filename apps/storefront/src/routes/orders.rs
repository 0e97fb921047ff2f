//! Customer order history.

use axum::extract::{Path, State};
use axum::Json;
use depot_core::validation::validate_customer_id;
use depot_core::OrderWithItems;
use tracing::debug;

use crate::error::ApiResult;
use crate::state::AppState;

/// GET /api/customers/{customer_id}/orders
///
/// Newest first.
pub async fn list_orders(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> ApiResult<Json<Vec<OrderWithItems>>> {
    validate_customer_id(&customer_id)?;
    debug!(customer_id = %customer_id, "list_orders");

    let orders = state.db().orders().list_for_customer(&customer_id).await?;
    Ok(Json(orders))
}
