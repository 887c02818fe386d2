//! Product and order models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Product kinds (eSIMs, one-off services, physical goods).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Esim,
    Service,
    Physical,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Esim => "esim",
            ProductType::Service => "service",
            ProductType::Physical => "physical",
        }
    }

    pub fn parse(s: &str) -> Option<ProductType> {
        match s {
            "esim" => Some(ProductType::Esim),
            "service" => Some(ProductType::Service),
            "physical" => Some(ProductType::Physical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Active,
    Inactive,
    Discontinued,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Inactive => "inactive",
            ProductStatus::Discontinued => "discontinued",
        }
    }

    pub fn parse(s: &str) -> Option<ProductStatus> {
        match s {
            "active" => Some(ProductStatus::Active),
            "inactive" => Some(ProductStatus::Inactive),
            "discontinued" => Some(ProductStatus::Discontinued),
            _ => None,
        }
    }
}

/// Product entity.
#[derive(Debug, Clone, FromRow)]
pub struct Product {
    pub product_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub sku: Option<String>,
    pub product_type: String,
    pub price: Decimal,
    pub currency: String,
    pub status: String,
    pub is_featured: bool,
    pub is_digital: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub sku: Option<String>,
    #[validate(length(min = 1))]
    pub product_type: String,
    pub price: Decimal,
    pub currency: Option<String>,
    pub status: Option<String>,
    pub is_featured: Option<bool>,
    pub is_digital: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub sku: Option<String>,
    pub product_type: Option<String>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub status: Option<String>,
    pub is_featured: Option<bool>,
    pub is_digital: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub product_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub sku: Option<String>,
    pub product_type: String,
    pub price: Decimal,
    pub currency: String,
    pub status: String,
    pub is_featured: bool,
    pub is_digital: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            product_id: p.product_id,
            name: p.name,
            slug: p.slug,
            description: p.description,
            short_description: p.short_description,
            sku: p.sku,
            product_type: p.product_type,
            price: p.price,
            currency: p.currency,
            status: p.status,
            is_featured: p.is_featured,
            is_digital: p.is_digital,
            created_utc: p.created_utc,
            updated_utc: p.updated_utc,
        }
    }
}

/// Order lifecycle. Completed, cancelled and refunded orders are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<OrderStatus> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "processing" => Some(OrderStatus::Processing),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            "refunded" => Some(OrderStatus::Refunded),
            _ => None,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Cancelled | OrderStatus::Refunded
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<PaymentStatus> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

/// Order entity.
#[derive(Debug, Clone, FromRow)]
pub struct Order {
    pub order_id: Uuid,
    pub order_number: String,
    pub client_id: Uuid,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
    pub currency: String,
    pub status: String,
    pub payment_status: String,
    pub payment_method: Option<String>,
    pub payment_reference: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Order {
    pub fn current_status(&self) -> Option<OrderStatus> {
        OrderStatus::parse(&self.status)
    }
}

/// Order line item with a product snapshot taken at order time.
#[derive(Debug, Clone, FromRow)]
pub struct OrderItem {
    pub item_id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub product_name: String,
    pub product_sku: Option<String>,
    pub created_utc: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub client_id: Uuid,
    #[validate(length(min = 1), nested)]
    pub items: Vec<OrderItemRequest>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrderStatusRequest {
    #[validate(length(min = 1))]
    pub status: String,
    pub payment_status: Option<String>,
    pub payment_reference: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub product_name: String,
    pub product_sku: Option<String>,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(i: OrderItem) -> Self {
        Self {
            product_id: i.product_id,
            quantity: i.quantity,
            unit_price: i.unit_price,
            total_price: i.total_price,
            product_name: i.product_name,
            product_sku: i.product_sku,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order_id: Uuid,
    pub order_number: String,
    pub client_id: Uuid,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
    pub currency: String,
    pub status: String,
    pub payment_status: String,
    pub payment_method: Option<String>,
    pub payment_reference: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<OrderItemResponse>,
}

impl OrderResponse {
    pub fn from_parts(order: Order, items: Vec<OrderItem>) -> Self {
        Self {
            order_id: order.order_id,
            order_number: order.order_number,
            client_id: order.client_id,
            subtotal: order.subtotal,
            tax_amount: order.tax_amount,
            discount_amount: order.discount_amount,
            total_amount: order.total_amount,
            currency: order.currency,
            status: order.status,
            payment_status: order.payment_status,
            payment_method: order.payment_method,
            payment_reference: order.payment_reference,
            created_utc: order.created_utc,
            updated_utc: order.updated_utc,
            items: items.into_iter().map(OrderItemResponse::from).collect(),
        }
    }
}
