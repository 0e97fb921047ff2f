//! Coupon administration.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use depot_core::validation::{validate_coupon_code, validate_non_negative, validate_price};
use depot_core::{Coupon, Money};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCouponRequest {
    pub code: String,
    pub discount_amount: Money,
    pub valid_until: DateTime<Utc>,
    pub quota: i64,
}

/// GET /api/admin/coupons
pub async fn list_coupons(State(state): State<AppState>) -> ApiResult<Json<Vec<Coupon>>> {
    debug!("list_coupons");
    let coupons = state.db().coupons().list().await?;
    Ok(Json(coupons))
}

/// POST /api/admin/coupons
///
/// Codes are stored as given; lookups are case-sensitive.
pub async fn create_coupon(
    State(state): State<AppState>,
    Json(request): Json<CreateCouponRequest>,
) -> ApiResult<(StatusCode, Json<Coupon>)> {
    let code = request.code.trim().to_string();
    validate_coupon_code(&code)?;
    validate_price("discount_amount", request.discount_amount)?;
    validate_non_negative("quota", request.quota)?;
    debug!(code = %code, "create_coupon");

    let coupon = Coupon {
        code,
        discount_amount: request.discount_amount,
        valid_until: request.valid_until,
        quota: request.quota,
        created_at: Utc::now(),
    };

    let coupon = state.db().coupons().insert(&coupon).await?;
    info!(
        code = %coupon.code,
        discount = coupon.discount_amount.minor(),
        quota = coupon.quota,
        "Coupon created"
    );
    Ok((StatusCode::CREATED, Json(coupon)))
}
