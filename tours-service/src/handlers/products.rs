//! Product catalog and order handlers.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;

use crate::handlers::{PageQuery, Pagination};
use crate::middleware::AuthUser;
use crate::models::{
    Action, AuditLog, Capability, CreateOrderRequest, CreateProductRequest, Module, Order,
    OrderItem, OrderResponse, OrderStatus, PaymentStatus, Product, ProductResponse,
    ProductStatus, ProductType, UpdateOrderStatusRequest, UpdateProductRequest,
};
use crate::utils::{client_ip, slugify, ValidatedJson};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    pub product_type: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductsListResponse {
    pub products: Vec<ProductResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
    pub client_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct OrdersListResponse {
    pub orders: Vec<OrderResponse>,
    pub pagination: Pagination,
}

// ============================================================================
// Public product endpoints
// ============================================================================

/// Active products only.
pub async fn list_active_products(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
    Query(query): Query<ListProductsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (limit, offset) = page.limit_offset();
    let (products, total) = state
        .db
        .list_products(
            query.product_type.as_deref(),
            Some(ProductStatus::Active.as_str()),
            limit,
            offset,
        )
        .await?;

    Ok(Json(ProductsListResponse {
        products: products.into_iter().map(ProductResponse::from).collect(),
        pagination: Pagination::new(&page, total),
    }))
}

pub async fn get_active_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let product = state
        .db
        .find_product_by_slug(&slug)
        .await?
        .filter(|p| p.status == ProductStatus::Active.as_str())
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?;

    Ok(Json(ProductResponse::from(product)))
}

// ============================================================================
// Admin product handlers
// ============================================================================

pub async fn list_products(
    State(state): State<AppState>,
    user: AuthUser,
    Query(page): Query<PageQuery>,
    Query(query): Query<ListProductsQuery>,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Products, Action::View))?;

    let (limit, offset) = page.limit_offset();
    let (products, total) = state
        .db
        .list_products(
            query.product_type.as_deref(),
            query.status.as_deref(),
            limit,
            offset,
        )
        .await?;

    Ok(Json(ProductsListResponse {
        products: products.into_iter().map(ProductResponse::from).collect(),
        pagination: Pagination::new(&page, total),
    }))
}

pub async fn create_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateProductRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Products, Action::Create))?;

    let product_type = ProductType::parse(&req.product_type).ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!("Unknown product type: {}", req.product_type))
    })?;
    let status = match req.status.as_deref() {
        None => ProductStatus::Active,
        Some(s) => ProductStatus::parse(s).ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!("Unknown product status: {}", s))
        })?,
    };

    let slug = req.slug.unwrap_or_else(|| slugify(&req.name));
    if slug.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Name does not produce a usable slug"
        )));
    }

    let now = Utc::now();
    let product = Product {
        product_id: Uuid::new_v4(),
        name: req.name,
        slug,
        description: req.description,
        short_description: req.short_description,
        sku: req.sku,
        product_type: product_type.as_str().to_string(),
        price: req.price,
        currency: req.currency.unwrap_or_else(|| "USD".to_string()),
        status: status.as_str().to_string(),
        is_featured: req.is_featured.unwrap_or(false),
        is_digital: req.is_digital.unwrap_or(true),
        created_utc: now,
        updated_utc: now,
    };

    let audit = AuditLog::new(
        Some(user.user_id()?),
        "create_product",
        "product",
        Some(product.product_id.to_string()),
        client_ip(&headers),
    );
    state.db.insert_product(&product, &audit).await?;

    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))))
}

pub async fn update_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateProductRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Products, Action::Edit))?;

    let mut product = state
        .db
        .find_product_by_id(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?;

    if let Some(v) = req.name {
        product.name = v;
    }
    if let Some(v) = req.slug {
        product.slug = v;
    }
    if let Some(v) = req.description {
        product.description = Some(v);
    }
    if let Some(v) = req.short_description {
        product.short_description = Some(v);
    }
    if let Some(v) = req.sku {
        product.sku = Some(v);
    }
    if let Some(v) = req.product_type {
        let product_type = ProductType::parse(&v).ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!("Unknown product type: {}", v))
        })?;
        product.product_type = product_type.as_str().to_string();
    }
    if let Some(v) = req.price {
        product.price = v;
    }
    if let Some(v) = req.currency {
        product.currency = v;
    }
    if let Some(v) = req.status {
        let status = ProductStatus::parse(&v).ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!("Unknown product status: {}", v))
        })?;
        product.status = status.as_str().to_string();
    }
    if let Some(v) = req.is_featured {
        product.is_featured = v;
    }
    if let Some(v) = req.is_digital {
        product.is_digital = v;
    }

    let audit = AuditLog::new(
        Some(user.user_id()?),
        "update_product",
        "product",
        Some(product.product_id.to_string()),
        client_ip(&headers),
    );
    state.db.update_product(&product, &audit).await?;

    Ok(Json(ProductResponse::from(product)))
}

pub async fn delete_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Products, Action::Delete))?;

    let audit = AuditLog::new(
        Some(user.user_id()?),
        "delete_product",
        "product",
        Some(product_id.to_string()),
        client_ip(&headers),
    );
    state.db.delete_product(product_id, &audit).await?;

    Ok(Json(serde_json::json!({
        "message": "Product deleted successfully"
    })))
}

// ============================================================================
// Order handlers
// ============================================================================

pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(page): Query<PageQuery>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Orders, Action::View))?;

    let (limit, offset) = page.limit_offset();
    let (orders, total) = state
        .db
        .list_orders(query.status.as_deref(), query.client_id, limit, offset)
        .await?;

    let mut responses = Vec::with_capacity(orders.len());
    for order in orders {
        let items = state.db.list_order_items(order.order_id).await?;
        responses.push(OrderResponse::from_parts(order, items));
    }

    Ok(Json(OrdersListResponse {
        orders: responses,
        pagination: Pagination::new(&page, total),
    }))
}

pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Orders, Action::View))?;

    let order = state
        .db
        .find_order_by_id(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Order not found")))?;
    let items = state.db.list_order_items(order_id).await?;

    Ok(Json(OrderResponse::from_parts(order, items)))
}

/// Place an order for a client. Prices are snapshotted from the catalog at
/// order time.
pub async fn create_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Orders, Action::Create))?;

    state
        .db
        .find_client_by_id(req.client_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Client not found")))?;

    let order_id = Uuid::new_v4();
    let mut subtotal = Decimal::ZERO;
    let mut items = Vec::with_capacity(req.items.len());
    let mut currency: Option<String> = None;

    for line in &req.items {
        let product = state
            .db
            .find_product_by_id(line.product_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!("Product {} not found", line.product_id))
            })?;

        if product.status != ProductStatus::Active.as_str() {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Product {} is not active",
                product.slug
            )));
        }

        match &currency {
            None => currency = Some(product.currency.clone()),
            Some(c) if *c != product.currency => {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Order mixes currencies: {} and {}",
                    c,
                    product.currency
                )));
            }
            Some(_) => {}
        }

        let quantity = Decimal::from(line.quantity);
        let total_price = product.price * quantity;
        subtotal += total_price;

        items.push(OrderItem {
            item_id: Uuid::new_v4(),
            order_id,
            product_id: product.product_id,
            quantity: line.quantity,
            unit_price: product.price,
            total_price,
            product_name: product.name.clone(),
            product_sku: product.sku.clone(),
            created_utc: Utc::now(),
        });
    }

    let now = Utc::now();
    let order = Order {
        order_id,
        order_number: generate_order_number(),
        client_id: req.client_id,
        subtotal,
        tax_amount: Decimal::ZERO,
        discount_amount: Decimal::ZERO,
        total_amount: subtotal,
        currency: currency.unwrap_or_else(|| "USD".to_string()),
        status: OrderStatus::Pending.as_str().to_string(),
        payment_status: PaymentStatus::Pending.as_str().to_string(),
        payment_method: req.payment_method,
        payment_reference: None,
        created_utc: now,
        updated_utc: now,
    };

    let audit = AuditLog::new(
        Some(user.user_id()?),
        "create_order",
        "order",
        Some(order.order_number.clone()),
        client_ip(&headers),
    );
    state.db.create_order(&order, &items, &audit).await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderResponse::from_parts(order, items)),
    ))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateOrderStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Orders, Action::Edit))?;

    let target = OrderStatus::parse(&req.status).ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!("Unknown order status: {}", req.status))
    })?;
    let payment_status = match req.payment_status.as_deref() {
        None => None,
        Some(s) => Some(
            PaymentStatus::parse(s)
                .ok_or_else(|| {
                    AppError::BadRequest(anyhow::anyhow!("Unknown payment status: {}", s))
                })?
                .as_str(),
        ),
    };

    let order = state
        .db
        .find_order_by_id(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Order not found")))?;

    if matches!(order.current_status(), Some(s) if s.is_final()) {
        return Err(AppError::InvalidTransition(anyhow::anyhow!(
            "Order {} is already {}",
            order.order_number,
            order.status
        )));
    }

    let audit = AuditLog::new(
        Some(user.user_id()?),
        "update_order_status",
        "order",
        Some(order.order_number.clone()),
        client_ip(&headers),
    )
    .with_details(format!("Status changed from {} to {}", order.status, target.as_str()));

    let updated = state
        .db
        .update_order_status(
            order_id,
            target.as_str(),
            payment_status,
            req.payment_reference.as_deref(),
            &audit,
        )
        .await?;

    let items = state.db.list_order_items(order_id).await?;
    Ok(Json(OrderResponse::from_parts(updated, items)))
}

/// Order numbers look like `ORD20250807A1B2C3`.
fn generate_order_number() -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix: String = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
    format!("ORD{}{}", date, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_numbers_have_the_documented_shape() {
        let n = generate_order_number();
        assert!(n.starts_with("ORD"));
        assert_eq!(n.len(), 3 + 8 + 6);
    }
}
