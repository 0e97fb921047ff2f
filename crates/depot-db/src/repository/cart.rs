//! # Cart Repository
//!
//! Persists the [`Cart`] aggregate: one row in `carts`, its lines in
//! `cart_items`, and a reference to the applied coupon by code.
//!
//! ## Optimistic Concurrency
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Request A                          Request B                           │
//! │  load cart (version 4)              load cart (version 4)               │
//! │  add_item                           apply_coupon                        │
//! │  save: UPDATE ... WHERE version=4   │                                   │
//! │        → version 5  ✓               │                                   │
//! │                                     save: UPDATE ... WHERE version=4    │
//! │                                           → 0 rows → DbError::Conflict  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Within one process the storefront also serializes mutations per customer,
//! so a conflict means a writer in another process got there first.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use depot_core::{Cart, CartItem, Coupon, Money};

#[derive(Debug, FromRow)]
struct CartRow {
    id: String,
    customer_id: String,
    coupon_code: Option<String>,
    discount_snapshot: Money,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Loads a customer's cart with its lines and coupon.
    pub async fn find_by_customer(&self, customer_id: &str) -> DbResult<Option<Cart>> {
        let row = sqlx::query_as::<_, CartRow>(
            r#"
            SELECT id, customer_id, coupon_code, discount_snapshot, version, created_at, updated_at
            FROM carts
            WHERE customer_id = ?1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, CartItem>(
            r#"
            SELECT id, cart_id, product_id, sku, name, quantity, unit_price, use_jerigen, added_at
            FROM cart_items
            WHERE cart_id = ?1
            ORDER BY added_at, id
            "#,
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        let coupon = match &row.coupon_code {
            Some(code) => {
                sqlx::query_as::<_, Coupon>(
                    r#"
                    SELECT code, discount_amount, valid_until, quota, created_at
                    FROM coupons
                    WHERE code = ?1
                    "#,
                )
                .bind(code)
                .fetch_optional(&self.pool)
                .await?
            }
            None => None,
        };

        Ok(Some(Cart {
            id: row.id,
            customer_id: row.customer_id,
            items,
            coupon,
            discount_snapshot: row.discount_snapshot,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }

    /// Loads a customer's cart, creating an empty one on first use.
    pub async fn get_or_create(&self, customer_id: &str, now: DateTime<Utc>) -> DbResult<Cart> {
        if let Some(cart) = self.find_by_customer(customer_id).await? {
            return Ok(cart);
        }

        let cart = Cart::new(customer_id, now);
        debug!(customer_id = %customer_id, cart_id = %cart.id, "Creating cart");

        // Two first requests may race here; the loser's insert is a no-op
        sqlx::query(
            r#"
            INSERT INTO carts (id, customer_id, coupon_code, discount_snapshot, version, created_at, updated_at)
            VALUES (?1, ?2, NULL, 0, 0, ?3, ?3)
            ON CONFLICT (customer_id) DO NOTHING
            "#,
        )
        .bind(&cart.id)
        .bind(&cart.customer_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_by_customer(customer_id)
            .await?
            .ok_or_else(|| DbError::not_found("Cart", customer_id))
    }

    /// Writes the cart back if nobody else saved it since it was loaded.
    ///
    /// On success `cart.version` and `cart.updated_at` reflect the new row.
    pub async fn save(&self, cart: &mut Cart, now: DateTime<Utc>) -> DbResult<()> {
        debug!(
            cart_id = %cart.id,
            version = cart.version,
            items = cart.items.len(),
            coupon = ?cart.coupon_code(),
            "Saving cart"
        );

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE carts SET
                coupon_code = ?2,
                discount_snapshot = ?3,
                version = version + 1,
                updated_at = ?4
            WHERE id = ?1 AND version = ?5
            "#,
        )
        .bind(&cart.id)
        .bind(cart.coupon_code())
        .bind(cart.discount_snapshot)
        .bind(now)
        .bind(cart.version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict("Cart", &cart.id, cart.version));
        }

        sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1")
            .bind(&cart.id)
            .execute(&mut *tx)
            .await?;

        for item in &cart.items {
            sqlx::query(
                r#"
                INSERT INTO cart_items (
                    id, cart_id, product_id, sku, name,
                    quantity, unit_price, use_jerigen, added_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(&item.id)
            .bind(&cart.id)
            .bind(&item.product_id)
            .bind(&item.sku)
            .bind(&item.name)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.use_jerigen)
            .bind(item.added_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        cart.version += 1;
        cart.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{coupon, product, test_db};
    use chrono::Duration;

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let db = test_db().await;
        let repo = db.carts();
        let now = Utc::now();

        let first = repo.get_or_create("cust-1", now).await.unwrap();
        let second = repo.get_or_create("cust-1", now).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.version, 0);
        assert!(first.is_empty());

        let other = repo.get_or_create("cust-2", now).await.unwrap();
        assert_ne!(other.id, first.id);
    }

    #[tokio::test]
    async fn test_save_round_trips_items_and_coupon() {
        let db = test_db().await;
        let now = Utc::now();

        let p = product("AIR-19L", "Air Mineral 19L", 20_000, 10);
        db.products().insert(&p).await.unwrap();
        let c = coupon("POTONG10K", 10_000, now + Duration::days(10), 100);
        db.coupons().insert(&c).await.unwrap();

        let repo = db.carts();
        let mut cart = repo.get_or_create("cust-1", now).await.unwrap();
        cart.add_item(&p, 2, true, now).unwrap();
        cart.apply_coupon(c, now).unwrap();
        repo.save(&mut cart, now).await.unwrap();
        assert_eq!(cart.version, 1);

        let loaded = repo.find_by_customer("cust-1").await.unwrap().unwrap();
        assert_eq!(loaded.version, 1);
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.items[0].quantity, 2);
        assert!(loaded.items[0].use_jerigen);
        assert_eq!(loaded.items[0].unit_price.minor(), 20_000);
        assert_eq!(loaded.coupon_code(), Some("POTONG10K"));
        assert_eq!(loaded.discount_snapshot.minor(), 10_000);
    }

    #[tokio::test]
    async fn test_stale_save_conflicts() {
        let db = test_db().await;
        let now = Utc::now();
        let p = product("AIR-19L", "Air Mineral 19L", 20_000, 10);
        db.products().insert(&p).await.unwrap();

        let repo = db.carts();
        repo.get_or_create("cust-1", now).await.unwrap();

        let mut a = repo.find_by_customer("cust-1").await.unwrap().unwrap();
        let mut b = repo.find_by_customer("cust-1").await.unwrap().unwrap();

        a.add_item(&p, 1, false, now).unwrap();
        repo.save(&mut a, now).await.unwrap();

        b.add_item(&p, 3, false, now).unwrap();
        let err = repo.save(&mut b, now).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { expected: 0, .. }));

        let stored = repo.find_by_customer("cust-1").await.unwrap().unwrap();
        assert_eq!(stored.items[0].quantity, 1);
    }

    #[tokio::test]
    async fn test_removed_lines_are_deleted() {
        let db = test_db().await;
        let now = Utc::now();
        let p = product("AIR-19L", "Air Mineral 19L", 20_000, 10);
        db.products().insert(&p).await.unwrap();

        let repo = db.carts();
        let mut cart = repo.get_or_create("cust-1", now).await.unwrap();
        let id = cart.add_item(&p, 1, false, now).unwrap();
        repo.save(&mut cart, now).await.unwrap();

        cart.remove_item(&id).unwrap();
        repo.save(&mut cart, now).await.unwrap();

        let loaded = repo.find_by_customer("cust-1").await.unwrap().unwrap();
        assert!(loaded.is_empty());
        assert_eq!(loaded.version, 2);
    }
}
