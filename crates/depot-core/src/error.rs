//! # Error Types
//!
//! Domain-specific error types for depot-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  depot-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  depot-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  storefront errors (in app)                                            │
//! │  └── ApiError         - What the HTTP client sees (serialized)         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → JSON response          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant is recoverable at the request boundary. None of them
//! should ever take the process down.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. Their `Display` output
/// is written to be shown to the shopper as-is.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No coupon exists with this code (codes are case-sensitive).
    #[error("Coupon code '{0}' is not valid")]
    InvalidCoupon(String),

    /// Coupon exists but its validity window has passed.
    #[error("Coupon '{0}' has expired")]
    ExpiredCoupon(String),

    /// Coupon exists and is in date, but its quota is used up.
    #[error("Coupon '{0}' has no remaining quota")]
    ExhaustedCoupon(String),

    /// The cart already carries a coupon; it must be removed first.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart has POTONG10K applied
    ///      │
    ///      ▼
    /// apply_coupon("HEMAT5K")
    ///      │
    ///      ▼
    /// CouponAlreadyApplied("POTONG10K")
    ///      │
    ///      ▼
    /// UI shows: "Remove coupon POTONG10K before applying another"
    /// ```
    #[error("Coupon '{0}' is already applied to this cart; remove it before applying another")]
    CouponAlreadyApplied(String),

    /// Cart item does not exist in this cart.
    #[error("Cart item not found: {0}")]
    ItemNotFound(String),

    /// Quantity is not acceptable for the operation.
    #[error("Invalid quantity {quantity}: {reason}")]
    InvalidQuantity { quantity: i64, reason: String },

    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product exists but is archived or out of stock.
    #[error("Product {sku} is not available for sale")]
    ProductUnavailable { sku: String },

    /// Insufficient stock to complete the operation.
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Cart has reached the maximum number of lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Checkout attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Order is not in a state that allows the requested transition.
    #[error("Order {order_code} is {current_status}, cannot move to {requested_status}")]
    InvalidOrderStatus {
        order_code: String,
        current_status: String,
        requested_status: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coupon_error_messages() {
        assert_eq!(
            CoreError::InvalidCoupon("NOPE".to_string()).to_string(),
            "Coupon code 'NOPE' is not valid"
        );
        assert_eq!(
            CoreError::ExpiredCoupon("POTONG10K".to_string()).to_string(),
            "Coupon 'POTONG10K' has expired"
        );
        assert_eq!(
            CoreError::ExhaustedCoupon("POTONG10K".to_string()).to_string(),
            "Coupon 'POTONG10K' has no remaining quota"
        );
    }

    #[test]
    fn test_stock_error_message() {
        let err = CoreError::InsufficientStock {
            sku: "AIR-19L".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for AIR-19L: available 3, requested 5"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "sku".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
