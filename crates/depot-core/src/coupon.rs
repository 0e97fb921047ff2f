//! # Coupon Rules
//!
//! Decides whether a coupon may discount a cart at a given instant.
//!
//! ```text
//! check_applicable(now)
//!      │
//!      ├── now >= valid_until ──► ExpiredCoupon     (checked first)
//!      │
//!      ├── quota == 0 ──────────► ExhaustedCoupon
//!      │
//!      └── otherwise ───────────► Ok
//! ```
//!
//! Quota is never touched here. It is consumed when an order is placed.

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::types::Coupon;

impl Coupon {
    /// Validates the coupon for application at `now`.
    pub fn check_applicable(&self, now: DateTime<Utc>) -> CoreResult<()> {
        if now >= self.valid_until {
            return Err(CoreError::ExpiredCoupon(self.code.clone()));
        }
        if self.quota <= 0 {
            return Err(CoreError::ExhaustedCoupon(self.code.clone()));
        }
        Ok(())
    }

    /// Boolean form of [`Coupon::check_applicable`].
    #[inline]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.check_applicable(now).is_ok()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.valid_until
    }
}

/// Resolves a code lookup result into a coupon.
///
/// The storage layer looks codes up exactly (case-sensitive); a blank code
/// or a miss both surface as `InvalidCoupon` carrying what the shopper typed.
pub fn resolve_code(code: &str, found: Option<Coupon>) -> CoreResult<Coupon> {
    if code.trim().is_empty() {
        return Err(CoreError::InvalidCoupon(code.to_string()));
    }
    found.ok_or_else(|| CoreError::InvalidCoupon(code.to_string()))
}
