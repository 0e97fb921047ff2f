//! # Order Repository
//!
//! The checkout transaction, order history and admin status changes.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   1. UPDATE carts ... WHERE id = ? AND version = ?   → 0 rows: CartChanged
//! │   2. INSERT orders, order_items                                         │
//! │   3. UPDATE coupons SET quota = quota - 1                               │
//! │        WHERE code = ? AND quota > 0 AND valid_until > ?                 │
//! │                                                       → 0 rows: CouponExhausted
//! │   4. UPDATE products SET stock_qty = stock_qty - ?                      │
//! │        WHERE id = ? AND status = 'ACTIVE' AND stock_qty >= ?            │
//! │                       → 0 rows: ProductUnavailable / InsufficientStock  │
//! │   5. DELETE cart_items; cart coupon cleared in step 1                   │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any non-Placed outcome drops the transaction, which rolls back.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use depot_core::{
    Cart, Order, OrderDraft, OrderItem, OrderStatus, OrderWithItems, ProductStatus, StockStatus,
};

const ORDER_COLUMNS: &str = r#"
    id, code, customer_id, status,
    base_total, jerigen_count, jerigen_fee, discount_amount, grand_total,
    coupon_code, order_date, updated_at
"#;

const ORDER_ITEM_COLUMNS: &str = r#"
    id, order_id, product_id, sku_snapshot, name_snapshot,
    quantity, unit_price, use_jerigen, line_total
"#;

/// What happened to a checkout attempt.
///
/// Lost races are outcomes rather than errors: the transaction was
/// rolled back and nothing changed.
#[derive(Debug)]
pub enum PlaceOrderOutcome {
    Placed(OrderWithItems),
    /// Another checkout consumed the last use of the coupon first.
    CouponExhausted { code: String },
    /// A product in the cart was archived after it was added.
    ProductUnavailable { sku: String },
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },
    /// The cart was saved by someone else after it was loaded.
    CartChanged,
}

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Persists an order drafted from `cart` and empties the cart.
    pub async fn place_order(
        &self,
        draft: &OrderDraft,
        cart: &Cart,
        now: DateTime<Utc>,
    ) -> DbResult<PlaceOrderOutcome> {
        debug!(
            order_code = %draft.order.code,
            customer_id = %draft.order.customer_id,
            items = draft.items.len(),
            coupon = ?draft.coupon_code(),
            "Placing order"
        );

        let mut tx = self.pool.begin().await?;

        // 1. Claim the cart at the version the draft was built from
        let claimed = sqlx::query(
            r#"
            UPDATE carts SET
                coupon_code = NULL,
                discount_snapshot = 0,
                version = version + 1,
                updated_at = ?2
            WHERE id = ?1 AND version = ?3
            "#,
        )
        .bind(&cart.id)
        .bind(now)
        .bind(cart.version)
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            warn!(cart_id = %cart.id, version = cart.version, "Cart changed during checkout");
            return Ok(PlaceOrderOutcome::CartChanged);
        }

        // 2. Order and lines
        insert_order(&mut tx, &draft.order).await?;
        for item in &draft.items {
            insert_order_item(&mut tx, item).await?;
        }

        // 3. Coupon quota
        if let Some(code) = draft.coupon_code() {
            let consumed = sqlx::query(
                r#"
                UPDATE coupons SET quota = quota - 1
                WHERE code = ?1 AND quota > 0 AND valid_until > ?2
                "#,
            )
            .bind(code)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if consumed.rows_affected() == 0 {
                warn!(code = %code, "Coupon quota lost at checkout");
                return Ok(PlaceOrderOutcome::CouponExhausted {
                    code: code.to_string(),
                });
            }
        }

        // 4. Stock, summed per product across container flags
        let mut wanted: BTreeMap<&str, (&str, i64)> = BTreeMap::new();
        for item in &draft.items {
            let entry = wanted
                .entry(item.product_id.as_str())
                .or_insert((item.sku_snapshot.as_str(), 0));
            entry.1 += item.quantity;
        }

        for (product_id, (sku, quantity)) in wanted {
            let taken = sqlx::query(
                r#"
                UPDATE products SET
                    stock_qty = stock_qty - ?2,
                    stock_status = CASE WHEN stock_qty - ?2 = 0 THEN ?3 ELSE stock_status END,
                    updated_at = ?4
                WHERE id = ?1 AND status = ?5 AND stock_qty >= ?2
                "#,
            )
            .bind(product_id)
            .bind(quantity)
            .bind(StockStatus::OutOfStock)
            .bind(now)
            .bind(ProductStatus::Active)
            .execute(&mut *tx)
            .await?;

            if taken.rows_affected() == 0 {
                let current: Option<(i64, ProductStatus)> =
                    sqlx::query_as("SELECT stock_qty, status FROM products WHERE id = ?1")
                        .bind(product_id)
                        .fetch_optional(&mut *tx)
                        .await?;

                let available = match current {
                    Some((stock_qty, ProductStatus::Active)) => stock_qty,
                    _ => {
                        warn!(sku = %sku, "Product no longer sold at checkout");
                        return Ok(PlaceOrderOutcome::ProductUnavailable {
                            sku: sku.to_string(),
                        });
                    }
                };

                warn!(sku = %sku, available, requested = quantity, "Stock short at checkout");
                return Ok(PlaceOrderOutcome::InsufficientStock {
                    sku: sku.to_string(),
                    available,
                    requested: quantity,
                });
            }
        }

        // 5. Empty the cart
        sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1")
            .bind(&cart.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            order_code = %draft.order.code,
            grand_total = %draft.order.grand_total,
            "Order placed"
        );

        Ok(PlaceOrderOutcome::Placed(OrderWithItems {
            order: draft.order.clone(),
            items: draft.items.clone(),
        }))
    }

    /// Gets an order and its lines by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<OrderWithItems>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match order {
            Some(order) => {
                let items = self.get_items(&order.id).await?;
                Ok(Some(OrderWithItems { order, items }))
            }
            None => Ok(None),
        }
    }

    /// Lists a customer's orders, newest first.
    pub async fn list_for_customer(&self, customer_id: &str) -> DbResult<Vec<OrderWithItems>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = ?1 ORDER BY order_date DESC, code DESC"
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;

        let mut history = Vec::with_capacity(orders.len());
        for order in orders {
            let items = self.get_items(&order.id).await?;
            history.push(OrderWithItems { order, items });
        }

        debug!(customer_id = %customer_id, count = history.len(), "Loaded order history");
        Ok(history)
    }

    /// Gets the lines of an order.
    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let sql = format!("SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = ?1 ORDER BY sku_snapshot, id");
        let items = sqlx::query_as::<_, OrderItem>(&sql)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Moves an order from `from` to `to`.
    ///
    /// The caller checks the transition is allowed. The update is guarded on
    /// `from`, so a concurrent change surfaces as `DbError::Conflict`.
    pub async fn update_status(
        &self,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(id = %id, from = %from, to = %to, "Updating order status");

        let result = sqlx::query(
            "UPDATE orders SET status = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?2",
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let exists: Option<String> = sqlx::query_scalar("SELECT id FROM orders WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

            return Err(match exists {
                Some(_) => DbError::Conflict {
                    entity: "Order".to_string(),
                    id: id.to_string(),
                    expected: 0,
                },
                None => DbError::not_found("Order", id),
            });
        }

        Ok(())
    }
}

async fn insert_order(tx: &mut Transaction<'_, Sqlite>, order: &Order) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO orders (
            id, code, customer_id, status,
            base_total, jerigen_count, jerigen_fee, discount_amount, grand_total,
            coupon_code, order_date, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4,
            ?5, ?6, ?7, ?8, ?9,
            ?10, ?11, ?12
        )
        "#,
    )
    .bind(&order.id)
    .bind(&order.code)
    .bind(&order.customer_id)
    .bind(order.status)
    .bind(order.base_total)
    .bind(order.jerigen_count)
    .bind(order.jerigen_fee)
    .bind(order.discount_amount)
    .bind(order.grand_total)
    .bind(&order.coupon_code)
    .bind(order.order_date)
    .bind(order.updated_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn insert_order_item(tx: &mut Transaction<'_, Sqlite>, item: &OrderItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO order_items (
            id, order_id, product_id, sku_snapshot, name_snapshot,
            quantity, unit_price, use_jerigen, line_total
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&item.id)
    .bind(&item.order_id)
    .bind(&item.product_id)
    .bind(&item.sku_snapshot)
    .bind(&item.name_snapshot)
    .bind(item.quantity)
    .bind(item.unit_price)
    .bind(item.use_jerigen)
    .bind(item.line_total)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{coupon, product, test_db};
    use crate::Database;
    use chrono::Duration;
    use depot_core::{prepare_order, PricingPolicy, Product};
    use uuid::Uuid;

    async fn cart_with(db: &Database, customer: &str, p: &Product, qty: i64, code: Option<&str>) -> Cart {
        let now = Utc::now();
        let mut cart = db.carts().get_or_create(customer, now).await.unwrap();
        cart.add_item(p, qty, true, now).unwrap();
        if let Some(code) = code {
            let c = db.coupons().get_by_code(code).await.unwrap().unwrap();
            cart.apply_coupon(c, now).unwrap();
        }
        db.carts().save(&mut cart, now).await.unwrap();
        cart
    }

    #[tokio::test]
    async fn test_place_order_consumes_quota_and_stock() {
        let db = test_db().await;
        let now = Utc::now();
        let p = product("AIR-19L", "Air Mineral 19L", 10_000, 5);
        db.products().insert(&p).await.unwrap();
        db.coupons()
            .insert(&coupon("POTONG10K", 10_000, now + Duration::days(10), 5))
            .await
            .unwrap();

        let cart = cart_with(&db, "cust-1", &p, 1, Some("POTONG10K")).await;
        let draft = prepare_order(&cart, Uuid::new_v4(), now, &PricingPolicy::default()).unwrap();

        let outcome = db.orders().place_order(&draft, &cart, now).await.unwrap();
        let placed = match outcome {
            PlaceOrderOutcome::Placed(placed) => placed,
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_eq!(placed.order.grand_total.minor(), 20_000);
        assert_eq!(placed.order.jerigen_fee.minor(), 20_000);

        let c = db.coupons().get_by_code("POTONG10K").await.unwrap().unwrap();
        assert_eq!(c.quota, 4);

        let stock = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(stock.stock_qty, 4);

        let emptied = db.carts().find_by_customer("cust-1").await.unwrap().unwrap();
        assert!(emptied.is_empty());
        assert!(emptied.coupon.is_none());

        let history = db.orders().list_for_customer("cust-1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].items.len(), 1);
        assert_eq!(history[0].order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_last_quota_race_rolls_back() {
        let db = test_db().await;
        let now = Utc::now();
        let p = product("AIR-19L", "Air Mineral 19L", 10_000, 10);
        db.products().insert(&p).await.unwrap();
        db.coupons()
            .insert(&coupon("LAST1", 5_000, now + Duration::days(1), 1))
            .await
            .unwrap();

        let a = cart_with(&db, "cust-a", &p, 1, Some("LAST1")).await;
        let b = cart_with(&db, "cust-b", &p, 1, Some("LAST1")).await;

        let draft_a = prepare_order(&a, Uuid::new_v4(), now, &PricingPolicy::default()).unwrap();
        let draft_b = prepare_order(&b, Uuid::new_v4(), now, &PricingPolicy::default()).unwrap();

        assert!(matches!(
            db.orders().place_order(&draft_a, &a, now).await.unwrap(),
            PlaceOrderOutcome::Placed(_)
        ));
        assert!(matches!(
            db.orders().place_order(&draft_b, &b, now).await.unwrap(),
            PlaceOrderOutcome::CouponExhausted { ref code } if code == "LAST1"
        ));

        // Loser's cart and the stock are untouched
        let b_after = db.carts().find_by_customer("cust-b").await.unwrap().unwrap();
        assert_eq!(b_after.items.len(), 1);
        assert_eq!(b_after.version, b.version);
        assert_eq!(
            db.products().get_by_id(&p.id).await.unwrap().unwrap().stock_qty,
            9
        );
        assert!(db.orders().list_for_customer("cust-b").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stock_shortfall_rolls_back() {
        let db = test_db().await;
        let now = Utc::now();
        let p = product("OIL-5L", "Minyak Goreng 5L", 85_000, 3);
        db.products().insert(&p).await.unwrap();

        let cart = cart_with(&db, "cust-1", &p, 3, None).await;
        let draft = prepare_order(&cart, Uuid::new_v4(), now, &PricingPolicy::default()).unwrap();

        let mut drained = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        drained.stock_qty = 2;
        db.products().update(&drained).await.unwrap();

        let outcome = db.orders().place_order(&draft, &cart, now).await.unwrap();
        assert!(matches!(
            outcome,
            PlaceOrderOutcome::InsufficientStock { available: 2, requested: 3, .. }
        ));
        assert!(db.orders().list_for_customer("cust-1").await.unwrap().is_empty());
        assert_eq!(
            db.carts().find_by_customer("cust-1").await.unwrap().unwrap().items.len(),
            1
        );
    }

    #[tokio::test]
    async fn test_archived_product_blocks_checkout() {
        let db = test_db().await;
        let now = Utc::now();
        let p = product("AIR-19L", "Air Mineral 19L", 10_000, 10);
        db.products().insert(&p).await.unwrap();

        let cart = cart_with(&db, "cust-1", &p, 2, None).await;
        let draft = prepare_order(&cart, Uuid::new_v4(), now, &PricingPolicy::default()).unwrap();
        db.products().archive(&p.id, now).await.unwrap();

        assert!(matches!(
            db.orders().place_order(&draft, &cart, now).await.unwrap(),
            PlaceOrderOutcome::ProductUnavailable { ref sku } if sku == "AIR-19L"
        ));
        assert!(db.orders().list_for_customer("cust-1").await.unwrap().is_empty());
        assert_eq!(
            db.products().get_by_id(&p.id).await.unwrap().unwrap().stock_qty,
            10
        );
        assert_eq!(
            db.carts().find_by_customer("cust-1").await.unwrap().unwrap().items.len(),
            1
        );
    }

    #[tokio::test]
    async fn test_selling_out_flips_stock_status() {
        let db = test_db().await;
        let now = Utc::now();
        let p = product("OIL-5L", "Minyak Goreng 5L", 85_000, 2);
        db.products().insert(&p).await.unwrap();

        let cart = cart_with(&db, "cust-1", &p, 2, None).await;
        let draft = prepare_order(&cart, Uuid::new_v4(), now, &PricingPolicy::default()).unwrap();
        db.orders().place_order(&draft, &cart, now).await.unwrap();

        let sold_out = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(sold_out.stock_qty, 0);
        assert_eq!(sold_out.stock_status, StockStatus::OutOfStock);
    }

    #[tokio::test]
    async fn test_stale_cart_is_reported() {
        let db = test_db().await;
        let now = Utc::now();
        let p = product("AIR-19L", "Air Mineral 19L", 10_000, 10);
        db.products().insert(&p).await.unwrap();

        let stale = cart_with(&db, "cust-1", &p, 1, None).await;
        let mut fresh = db.carts().find_by_customer("cust-1").await.unwrap().unwrap();
        fresh.add_item(&p, 1, true, now).unwrap();
        db.carts().save(&mut fresh, now).await.unwrap();

        let draft = prepare_order(&stale, Uuid::new_v4(), now, &PricingPolicy::default()).unwrap();
        assert!(matches!(
            db.orders().place_order(&draft, &stale, now).await.unwrap(),
            PlaceOrderOutcome::CartChanged
        ));
    }

    #[tokio::test]
    async fn test_update_status() {
        let db = test_db().await;
        let now = Utc::now();
        let p = product("AIR-19L", "Air Mineral 19L", 10_000, 10);
        db.products().insert(&p).await.unwrap();

        let cart = cart_with(&db, "cust-1", &p, 1, None).await;
        let draft = prepare_order(&cart, Uuid::new_v4(), now, &PricingPolicy::default()).unwrap();
        db.orders().place_order(&draft, &cart, now).await.unwrap();

        let repo = db.orders();
        repo.update_status(&draft.order.id, OrderStatus::Pending, OrderStatus::Confirmed, now)
            .await
            .unwrap();

        let loaded = repo.get_by_id(&draft.order.id).await.unwrap().unwrap();
        assert_eq!(loaded.order.status, OrderStatus::Confirmed);

        assert!(matches!(
            repo.update_status(&draft.order.id, OrderStatus::Pending, OrderStatus::Cancelled, now)
                .await,
            Err(DbError::Conflict { .. })
        ));
        assert!(matches!(
            repo.update_status("missing", OrderStatus::Pending, OrderStatus::Cancelled, now)
                .await,
            Err(DbError::NotFound { .. })
        ));
    }
}
