//! # Validation Module
//!
//! Input validation for the storefront and admin endpoints.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractor (axum Json / Path / Query)                    │
//! │  └── Type validation (deserialization)                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Field rules (length, charset, ranges, pagination bounds)          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints (sku, coupon code)                             │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use depot_core::validation::{validate_sku, validate_quantity};
//!
//! validate_sku("AIR-19L").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Default page size for paginated listings.
pub const DEFAULT_PER_PAGE: i64 = 20;

/// Largest page size a caller may ask for.
pub const MAX_PER_PAGE: i64 = 100;

fn identifier_chars(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, digits, hyphens, underscores only
///
/// ## Example
/// ```rust
/// use depot_core::validation::validate_sku;
///
/// assert!(validate_sku("AIR-19L").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !identifier_chars(sku) {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name (1-200 characters).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

pub fn validate_description(description: Option<&str>) -> ValidationResult<()> {
    match description {
        Some(d) if d.chars().count() > 2000 => Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: 2000,
        }),
        _ => Ok(()),
    }
}

/// Validates a coupon code.
///
/// Codes are case-sensitive and stored as typed; only the charset and
/// length are checked.
pub fn validate_coupon_code(code: &str) -> ValidationResult<()> {
    if code.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > 32 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 32,
        });
    }

    if !identifier_chars(code) {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates the customer identifier taken from the request path.
pub fn validate_customer_id(customer_id: &str) -> ValidationResult<()> {
    if customer_id.is_empty() {
        return Err(ValidationError::Required {
            field: "customer_id".to_string(),
        });
    }

    if customer_id.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "customer_id".to_string(),
            max: 64,
        });
    }

    if !identifier_chars(customer_id) {
        return Err(ValidationError::InvalidFormat {
            field: "customer_id".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (no filtering)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query, or `None` when it is blank.
pub fn validate_search_query(query: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(query) = query.map(str::trim) else {
        return Ok(None);
    };

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: 100,
        });
    }

    Ok((!query.is_empty()).then(|| query.to_string()))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
/// - Must not exceed MAX_PRICE (Rp 1.000.000.000)
///
/// ## Example
/// ```rust
/// use depot_core::money::Money;
/// use depot_core::validation::validate_price;
///
/// assert!(validate_price("price", Money::from_minor(15_000)).is_ok());
/// assert!(validate_price("price", Money::zero()).is_ok());
/// assert!(validate_price("price", Money::from_minor(-100)).is_err());
/// assert!(validate_price("price", Money::from_minor(i64::MAX)).is_err());
/// ```
pub fn validate_price(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() || amount > MAX_PRICE {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE.minor(),
        });
    }

    Ok(())
}

/// Validates a non-negative count such as stock level or coupon quota.
pub fn validate_non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Pagination
// =============================================================================

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    /// Rows to skip for this page.
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }
}

/// Validates pagination parameters, filling in defaults.
///
/// ## Rules
/// - `page` defaults to 1, must be ≥ 1
/// - `per_page` defaults to 20, must be within 1..=100
pub fn validate_pagination(page: Option<i64>, per_page: Option<i64>) -> ValidationResult<PageRequest> {
    let page = page.unwrap_or(1);
    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE);

    if page < 1 {
        return Err(ValidationError::MustBePositive {
            field: "page".to_string(),
        });
    }

    if !(1..=MAX_PER_PAGE).contains(&per_page) {
        return Err(ValidationError::OutOfRange {
            field: "per_page".to_string(),
            min: 1,
            max: MAX_PER_PAGE,
        });
    }

    Ok(PageRequest { page, per_page })
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use depot_core::validation::validate_uuid;
///
/// assert!(validate_uuid("product_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("product_id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
