use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::pricing::Transmission;

/// Order status enum representing the lifecycle of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Placed,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Convert status to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Placed => "placed",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment status enum representing the payment state of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Refunded,
}

impl PaymentStatus {
    /// Convert payment status to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Unpaid
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Domain model representing an order in the database
///
/// `lesson`, `postcode`, `band` and `transmission` are the fields the
/// pricing engine contributes; `postcode` and `band` are NULL when unset so
/// "no band" stays distinguishable from a band code.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub order_no: String,
    pub customer_id: Option<i32>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub lesson: bool,
    pub postcode: Option<String>,
    pub band: Option<String>,
    pub transmission: Transmission,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Domain model representing an item within an order
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub id: i32,
    pub order_id: Uuid,
    pub product_id: i32,
    pub quantity: i32,
    pub price_snapshot: Decimal,
    pub subtotal: Decimal,
}

/// Request DTO for an order line
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderItemRequest {
    #[schema(example = 1)]
    pub product_id: i32,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    #[schema(example = 1, minimum = 1)]
    pub quantity: i32,
}

/// Request DTO for creating a new order
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    #[schema(example = 42)]
    pub customer_id: Option<i32>,
    #[validate(custom = "crate::validation::validate_postcode")]
    #[schema(example = "AB1 2CD")]
    pub postcode: Option<String>,
    #[validate(custom = "crate::validation::validate_band_code")]
    #[schema(example = "A")]
    pub band: Option<String>,
    pub transmission: Option<Transmission>,
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Vec<OrderItemRequest>,
}

/// Request DTO for updating order status
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Request DTO for updating payment status
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePaymentRequest {
    pub payment_status: PaymentStatus,
}

/// Response DTO for order with items
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    #[schema(example = "K7TQX2NMBF")]
    pub order_no: String,
    pub customer_id: Option<i32>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub lesson: bool,
    #[schema(example = "AB1")]
    pub postcode: Option<String>,
    #[schema(example = "A")]
    pub band: Option<String>,
    pub transmission: Transmission,
    #[schema(value_type = f64, example = 230.00)]
    pub subtotal: Decimal,
    #[schema(value_type = f64, example = 230.00)]
    pub total: Decimal,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderResponse {
    /// Assemble the response from an order and its items
    pub fn from_order(order: Order, items: Vec<OrderItem>) -> Self {
        Self {
            id: order.id,
            order_no: order.order_no,
            customer_id: order.customer_id,
            status: order.status,
            payment_status: order.payment_status,
            lesson: order.lesson,
            postcode: order.postcode,
            band: order.band,
            transmission: order.transmission,
            subtotal: order.subtotal,
            total: order.total,
            items: items.into_iter().map(|item| item.into()).collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// Response DTO for an order item
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: i32,
    pub product_id: i32,
    pub quantity: i32,
    #[schema(value_type = f64, example = 23.00)]
    pub price_snapshot: Decimal,
    #[schema(value_type = f64, example = 230.00)]
    pub subtotal: Decimal,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            quantity: item.quantity,
            price_snapshot: item.price_snapshot,
            subtotal: item.subtotal,
        }
    }
}
