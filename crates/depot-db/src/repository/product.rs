//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - CRUD operations
//! - Archive (soft delete)
//! - Case-insensitive search over name and SKU with pagination
//!
//! ## Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Admin types: "air"                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  pattern "%air%" (LIKE metacharacters in the input escaped)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  name LIKE ?  OR  sku LIKE ?     (ASCII case-insensitive in SQLite)    │
//! │       │                                                                 │
//! │       ├──► COUNT(*)              → total                               │
//! │       └──► ORDER BY name LIMIT per_page OFFSET (page-1)*per_page       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::Page;
use depot_core::validation::PageRequest;
use depot_core::{Product, ProductStatus};

const PRODUCT_COLUMNS: &str = r#"
    id, sku, name, description,
    price, sale_price, stock_qty, stock_status, status,
    created_at, updated_at
"#;

/// Listing filter for the admin catalog.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Trimmed, non-empty search text.
    pub search: Option<String>,
    pub status: Option<ProductStatus>,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists products matching `filter`, one page at a time.
    pub async fn list(&self, filter: &ProductFilter, page: PageRequest) -> DbResult<Page<Product>> {
        let pattern = filter.search.as_deref().map(like_pattern);

        debug!(
            search = ?filter.search,
            status = ?filter.status,
            page = page.page,
            per_page = page.per_page,
            "Listing products"
        );

        let where_clause = r#"
            WHERE (?1 IS NULL OR name LIKE ?1 ESCAPE '\' OR sku LIKE ?1 ESCAPE '\')
            AND (?2 IS NULL OR status = ?2)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM products {where_clause}"))
            .bind(&pattern)
            .bind(filter.status)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products {where_clause} ORDER BY name, id LIMIT ?3 OFFSET ?4"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(&pattern)
            .bind(filter.status)
            .bind(page.per_page)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), total, "Listing returned products");
        Ok(Page::new(products, total, page))
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The inserted product
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, description,
                price, sale_price, stock_qty, stock_status, status,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8, ?9,
                ?10, ?11
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.sale_price)
        .bind(product.stock_qty)
        .bind(product.stock_status)
        .bind(product.status)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&product.sku))?;

        Ok(product.clone())
    }

    /// Updates an existing product.
    ///
    /// ## Returns
    /// * `Ok(())` - Update successful
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                sku = ?2,
                name = ?3,
                description = ?4,
                price = ?5,
                sale_price = ?6,
                stock_qty = ?7,
                stock_status = ?8,
                status = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.sale_price)
        .bind(product.stock_qty)
        .bind(product.stock_status)
        .bind(product.status)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&product.sku))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Archives a product (soft delete).
    ///
    /// ## Why Soft Delete?
    /// Order lines and open carts still reference the product row.
    pub async fn archive(&self, id: &str, now: DateTime<Utc>) -> DbResult<()> {
        debug!(id = %id, "Archiving product");

        let result = sqlx::query("UPDATE products SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(ProductStatus::Archived)
            .bind(now)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE status = ?1")
            .bind(ProductStatus::Active)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

/// Wraps a search term for `LIKE ... ESCAPE '\'`.
fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for ch in search.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{product, test_db};
    use depot_core::validation::validate_pagination;
    use depot_core::{Money, StockStatus};

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("air"), "%air%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let repo = db.products();

        let mut p = product("AIR-19L", "Air Mineral 19L", 20_000, 12);
        p.sale_price = Some(Money::from_minor(18_000));
        repo.insert(&p).await.unwrap();

        let loaded = repo.get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(loaded.sku, "AIR-19L");
        assert_eq!(loaded.sale_price, Some(Money::from_minor(18_000)));
        assert_eq!(loaded.stock_status, StockStatus::InStock);
        assert_eq!(loaded.status, ProductStatus::Active);

        let by_sku = repo.get_by_sku("AIR-19L").await.unwrap().unwrap();
        assert_eq!(by_sku.id, p.id);

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(&product("AIR-19L", "Air 19L", 20_000, 1)).await.unwrap();
        let err = repo
            .insert(&product("AIR-19L", "Other", 1_000, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "AIR-19L"));
    }

    #[tokio::test]
    async fn test_update_and_archive() {
        let db = test_db().await;
        let repo = db.products();

        let mut p = product("OIL-5L", "Minyak Goreng 5L", 85_000, 3);
        repo.insert(&p).await.unwrap();

        p.price = Money::from_minor(82_000);
        p.stock_status = StockStatus::OutOfStock;
        repo.update(&p).await.unwrap();

        let loaded = repo.get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(loaded.price.minor(), 82_000);
        assert_eq!(loaded.stock_status, StockStatus::OutOfStock);

        repo.archive(&p.id, Utc::now()).await.unwrap();
        let loaded = repo.get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, ProductStatus::Archived);
        assert_eq!(repo.count_active().await.unwrap(), 0);

        assert!(matches!(
            repo.archive("missing", Utc::now()).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_search_and_paginate() {
        let db = test_db().await;
        let repo = db.products();

        for (sku, name) in [
            ("AIR-19L", "Air Mineral 19L"),
            ("AIR-600", "Air Mineral 600ml"),
            ("OIL-5L", "Minyak Goreng 5L"),
            ("SOAP-1L", "Sabun Cair 1L"),
        ] {
            repo.insert(&product(sku, name, 10_000, 5)).await.unwrap();
        }

        let filter = ProductFilter {
            search: Some("mineral".to_string()),
            status: None,
        };
        let page = repo
            .list(&filter, validate_pagination(None, None).unwrap())
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items.len(), 2);

        let filter = ProductFilter {
            search: Some("oil".to_string()),
            status: None,
        };
        let page = repo
            .list(&filter, validate_pagination(None, None).unwrap())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].sku, "OIL-5L");

        let all = ProductFilter::default();
        let second = repo
            .list(&all, validate_pagination(Some(2), Some(3)).unwrap())
            .await
            .unwrap();
        assert_eq!(second.total, 4);
        assert_eq!(second.total_pages, 2);
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].name, "Sabun Cair 1L");
    }

    #[tokio::test]
    async fn test_filter_by_status() {
        let db = test_db().await;
        let repo = db.products();

        let keep = product("AIR-19L", "Air 19L", 20_000, 5);
        let gone = product("OLD-1", "Old Stock", 1_000, 0);
        repo.insert(&keep).await.unwrap();
        repo.insert(&gone).await.unwrap();
        repo.archive(&gone.id, Utc::now()).await.unwrap();

        let filter = ProductFilter {
            search: None,
            status: Some(ProductStatus::Active),
        };
        let page = repo
            .list(&filter, validate_pagination(None, None).unwrap())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, keep.id);
    }
}
