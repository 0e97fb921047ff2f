//! # Repository Module
//!
//! Database repository implementations for the storefront.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.carts().get_or_create("cust-42", now)                      │
//! │       ▼                                                                 │
//! │  CartRepository                                                        │
//! │  ├── find_by_customer(&self, customer_id)                              │
//! │  ├── get_or_create(&self, customer_id, now)                            │
//! │  └── save(&self, cart, now)          ← optimistic version check        │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Repositories return depot-core records; business rules stay in core.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog CRUD, search, pagination
//! - [`CouponRepository`](coupon::CouponRepository) - Coupon lookup and creation
//! - [`CartRepository`](cart::CartRepository) - Cart load/save
//! - [`OrderRepository`](order::OrderRepository) - Checkout transaction and order history

use serde::Serialize;

use depot_core::validation::PageRequest;

pub mod cart;
pub mod coupon;
pub mod order;
pub mod product;

/// One page of a listing plus the numbers a pager needs.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + request.per_page - 1) / request.per_page
        };

        Page {
            items,
            total,
            page: request.page,
            per_page: request.per_page,
            total_pages,
        }
    }
}

/// Shared connection for repository tests.
#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, Duration, Utc};
    use depot_core::{Coupon, Money, Product, ProductStatus, StockStatus};
    use uuid::Uuid;

    use crate::{Database, DbConfig};

    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub fn product(sku: &str, name: &str, price: i64, stock_qty: i64) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4().to_string(),
            sku: sku.to_string(),
            name: name.to_string(),
            description: None,
            price: Money::from_minor(price),
            sale_price: None,
            stock_qty,
            stock_status: StockStatus::InStock,
            status: ProductStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn coupon(code: &str, discount: i64, valid_until: DateTime<Utc>, quota: i64) -> Coupon {
        Coupon {
            code: code.to_string(),
            discount_amount: Money::from_minor(discount),
            valid_until,
            quota,
            created_at: Utc::now() - Duration::days(1),
        }
    }
}
