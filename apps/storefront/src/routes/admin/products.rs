//! # Catalog Administration
//!
//! Products are never hard-deleted: `DELETE` archives them, so open carts
//! and placed orders keep their references.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use depot_core::validation::{
    validate_description, validate_non_negative, validate_pagination, validate_price,
    validate_product_name, validate_search_query, validate_sku,
};
use depot_core::{CoreError, Money, Product, ProductStatus, StockStatus};
use depot_db::repository::product::generate_product_id;
use depot_db::{Page, ProductFilter};
use serde::{Deserialize, Deserializer};
use tracing::{debug, info};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListProductsQuery {
    pub search: Option<String>,
    pub status: Option<ProductStatus>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub sale_price: Option<Money>,
    #[serde(default)]
    pub stock_qty: i64,
    /// Derived from `stock_qty` when omitted.
    pub stock_status: Option<StockStatus>,
}

/// Partial update. Absent fields are left as they are; `null` clears the
/// nullable ones.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub sku: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub price: Option<Money>,
    #[serde(default, deserialize_with = "double_option")]
    pub sale_price: Option<Option<Money>>,
    pub stock_qty: Option<i64>,
    pub stock_status: Option<StockStatus>,
    pub status: Option<ProductStatus>,
}

/// Distinguishes a field set to `null` from a missing one.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn stock_status_for(stock_qty: i64) -> StockStatus {
    if stock_qty > 0 {
        StockStatus::InStock
    } else {
        StockStatus::OutOfStock
    }
}

/// GET /api/admin/products?search=&status=&page=&per_page=
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> ApiResult<Json<Page<Product>>> {
    let search = validate_search_query(query.search.as_deref())?;
    let page = validate_pagination(query.page, query.per_page)?;
    debug!(search = ?search, page = page.page, per_page = page.per_page, "list_products");

    let filter = ProductFilter {
        search,
        status: query.status,
    };
    let products = state.db().products().list(&filter, page).await?;
    Ok(Json(products))
}

/// POST /api/admin/products
pub async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let sku = request.sku.trim().to_string();
    let name = request.name.trim().to_string();
    validate_sku(&sku)?;
    validate_product_name(&name)?;
    validate_description(request.description.as_deref())?;
    validate_price("price", request.price)?;
    if let Some(sale_price) = request.sale_price {
        validate_price("sale_price", sale_price)?;
    }
    validate_non_negative("stock_qty", request.stock_qty)?;
    debug!(sku = %sku, "create_product");

    let now = Utc::now();
    let product = Product {
        id: generate_product_id(),
        sku,
        name,
        description: request.description,
        price: request.price,
        sale_price: request.sale_price,
        stock_qty: request.stock_qty,
        stock_status: request
            .stock_status
            .unwrap_or_else(|| stock_status_for(request.stock_qty)),
        status: ProductStatus::Active,
        created_at: now,
        updated_at: now,
    };

    let product = state.db().products().insert(&product).await?;
    info!(id = %product.id, sku = %product.sku, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /api/admin/products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    debug!(id = %id, "get_product");

    let product = state
        .db()
        .products()
        .get_by_id(&id)
        .await?
        .ok_or(CoreError::ProductNotFound(id))?;
    Ok(Json(product))
}

/// PUT /api/admin/products/{id}
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateProductRequest>,
) -> ApiResult<Json<Product>> {
    debug!(id = %id, "update_product");

    let products = state.db().products();
    let mut product = products
        .get_by_id(&id)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(id.clone()))?;

    if let Some(sku) = request.sku {
        let sku = sku.trim().to_string();
        validate_sku(&sku)?;
        product.sku = sku;
    }
    if let Some(name) = request.name {
        let name = name.trim().to_string();
        validate_product_name(&name)?;
        product.name = name;
    }
    if let Some(description) = request.description {
        validate_description(description.as_deref())?;
        product.description = description;
    }
    if let Some(price) = request.price {
        validate_price("price", price)?;
        product.price = price;
    }
    if let Some(sale_price) = request.sale_price {
        if let Some(amount) = sale_price {
            validate_price("sale_price", amount)?;
        }
        product.sale_price = sale_price;
    }
    if let Some(stock_qty) = request.stock_qty {
        validate_non_negative("stock_qty", stock_qty)?;
        product.stock_qty = stock_qty;
        product.stock_status = stock_status_for(stock_qty);
    }
    if let Some(stock_status) = request.stock_status {
        product.stock_status = stock_status;
    }
    if let Some(status) = request.status {
        product.status = status;
    }
    product.updated_at = Utc::now();

    products.update(&product).await?;
    info!(id = %product.id, sku = %product.sku, "Product updated");
    Ok(Json(product))
}

/// DELETE /api/admin/products/{id}
pub async fn archive_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    debug!(id = %id, "archive_product");

    state.db().products().archive(&id, Utc::now()).await?;
    info!(id = %id, "Product archived");
    Ok(StatusCode::NO_CONTENT)
}
