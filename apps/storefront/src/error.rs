//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Storefront                         │
//! │                                                                         │
//! │  Handler: Result<Json<T>, ApiError>                                     │
//! │         │                                                               │
//! │         ├── ValidationError ──────────────┐                             │
//! │         ├── CoreError (business rule) ────┼──► ApiError { code, msg }   │
//! │         └── DbError (logged if internal) ─┘            │                │
//! │                                                        ▼                │
//! │                                       HTTP status + JSON body           │
//! │                                                                         │
//! │  NOT_FOUND ............................................ 404             │
//! │  VALIDATION_ERROR ..................................... 400             │
//! │  CONFLICT ............................................. 409             │
//! │  INVALID_COUPON, COUPON_*, INSUFFICIENT_STOCK, ... .... 422             │
//! │  DATABASE_ERROR ....................................... 500             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Internal failures are logged with their detail and returned with a
//! generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use depot_core::{CoreError, ValidationError};
use depot_db::DbError;
use serde::Serialize;
use tracing::{debug, warn};

/// API error returned from handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "COUPON_EXPIRED",
///   "message": "Coupon 'POTONG10K' has expired"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Concurrent modification or duplicate key (409)
    Conflict,

    /// Unknown coupon code (422)
    InvalidCoupon,

    /// Coupon past its validity (422)
    CouponExpired,

    /// Coupon has no uses left (422)
    CouponExhausted,

    /// Cart already carries an active coupon (422)
    CouponAlreadyApplied,

    /// Product archived or out of stock (422)
    ProductUnavailable,

    /// Not enough stock for the requested quantity (422)
    InsufficientStock,

    /// Cart operation rejected (422)
    CartError,

    /// Checkout of an empty cart (422)
    EmptyCart,

    /// Order status transition not allowed (422)
    InvalidOrderStatus,

    /// Database operation failed (500)
    DatabaseError,
}

impl ErrorCode {
    /// HTTP status for this error code.
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::InvalidCoupon
            | ErrorCode::CouponExpired
            | ErrorCode::CouponExhausted
            | ErrorCode::CouponAlreadyApplied
            | ErrorCode::ProductUnavailable
            | ErrorCode::InsufficientStock
            | ErrorCode::CartError
            | ErrorCode::EmptyCart
            | ErrorCode::InvalidOrderStatus => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Conflict, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                ApiError::conflict(format!("{} '{}' already exists", field, value))
            }
            DbError::Conflict { entity, .. } => ApiError::conflict(format!(
                "{} was modified by another request; reload and try again",
                entity
            )),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                tracing::error!("Database pool exhausted");
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        let code = match err {
            CoreError::InvalidCoupon(_) => ErrorCode::InvalidCoupon,
            CoreError::ExpiredCoupon(_) => ErrorCode::CouponExpired,
            CoreError::ExhaustedCoupon(_) => ErrorCode::CouponExhausted,
            CoreError::CouponAlreadyApplied(_) => ErrorCode::CouponAlreadyApplied,
            CoreError::ItemNotFound(_)
            | CoreError::ProductNotFound(_)
            | CoreError::OrderNotFound(_) => ErrorCode::NotFound,
            CoreError::InvalidQuantity { .. } => ErrorCode::ValidationError,
            CoreError::ProductUnavailable { .. } => ErrorCode::ProductUnavailable,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::CartTooLarge { .. } => ErrorCode::CartError,
            CoreError::EmptyCart => ErrorCode::EmptyCart,
            CoreError::InvalidOrderStatus { .. } => ErrorCode::InvalidOrderStatus,
            CoreError::Validation(e) => return e.into(),
        };
        ApiError::new(code, message)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::UNPROCESSABLE_ENTITY || status == StatusCode::CONFLICT {
            warn!(code = ?self.code, message = %self.message, "Request rejected");
        } else if status.is_client_error() {
            debug!(code = ?self.code, message = %self.message, "Request rejected");
        }
        (status, Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
