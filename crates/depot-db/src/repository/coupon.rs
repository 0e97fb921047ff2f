//! # Coupon Repository
//!
//! Lookup and administration of discount coupons.
//!
//! Quota is only ever decremented inside the checkout transaction
//! (see [`OrderRepository::place_order`](super::order::OrderRepository::place_order)).

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use depot_core::Coupon;

/// Repository for coupon database operations.
#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

impl CouponRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CouponRepository { pool }
    }

    /// Gets a coupon by its exact (case-sensitive) code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Coupon>> {
        let coupon = sqlx::query_as::<_, Coupon>(
            r#"
            SELECT code, discount_amount, valid_until, quota, created_at
            FROM coupons
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(coupon)
    }

    /// Inserts a new coupon.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Code already exists
    pub async fn insert(&self, coupon: &Coupon) -> DbResult<Coupon> {
        debug!(code = %coupon.code, quota = coupon.quota, "Inserting coupon");

        sqlx::query(
            r#"
            INSERT INTO coupons (code, discount_amount, valid_until, quota, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&coupon.code)
        .bind(coupon.discount_amount)
        .bind(coupon.valid_until)
        .bind(coupon.quota)
        .bind(coupon.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&coupon.code))?;

        Ok(coupon.clone())
    }

    /// Lists all coupons, newest first.
    pub async fn list(&self) -> DbResult<Vec<Coupon>> {
        let coupons = sqlx::query_as::<_, Coupon>(
            r#"
            SELECT code, discount_amount, valid_until, quota, created_at
            FROM coupons
            ORDER BY created_at DESC, code
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(coupons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{coupon, test_db};
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_insert_and_lookup_is_case_sensitive() {
        let db = test_db().await;
        let repo = db.coupons();

        let c = coupon("POTONG10K", 10_000, Utc::now() + Duration::days(10), 100);
        repo.insert(&c).await.unwrap();

        let loaded = repo.get_by_code("POTONG10K").await.unwrap().unwrap();
        assert_eq!(loaded.discount_amount.minor(), 10_000);
        assert_eq!(loaded.quota, 100);
        assert_eq!(loaded.valid_until.timestamp(), c.valid_until.timestamp());

        assert!(repo.get_by_code("potong10k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let db = test_db().await;
        let repo = db.coupons();
        let c = coupon("POTONG10K", 10_000, Utc::now() + Duration::days(1), 1);

        repo.insert(&c).await.unwrap();
        assert!(matches!(
            repo.insert(&c).await,
            Err(DbError::UniqueViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_list() {
        let db = test_db().await;
        let repo = db.coupons();
        let until = Utc::now() + Duration::days(1);

        repo.insert(&coupon("A", 1_000, until, 1)).await.unwrap();
        repo.insert(&coupon("B", 2_000, until, 1)).await.unwrap();

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
