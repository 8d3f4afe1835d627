use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Product;
use crate::orders::error::OrderError;
use crate::orders::totals::LessonFields;
use crate::orders::{Order, OrderItem, OrderStatus, PaymentStatus};

const ORDER_COLUMNS: &str = "id, order_no, customer_id, status, payment_status, lesson, \
                             postcode, band, transmission, subtotal, total, created_at, updated_at";

/// Repository for catalog product operations
#[derive(Clone)]
pub struct ProductsRepository {
    pool: PgPool,
}

impl ProductsRepository {
    /// Create a new ProductsRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a product by ID
    pub async fn find_by_id(&self, id: i32) -> Result<Option<Product>, OrderError> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT product_id, name, price, sale_price, lesson, course \
             FROM products WHERE product_id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Find multiple products by IDs
    pub async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Product>, OrderError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT product_id, name, price, sale_price, lesson, course \
             FROM products WHERE product_id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Whether a product is a lesson item; unknown products are not
    pub async fn is_lesson(&self, product_id: i32) -> Result<bool, OrderError> {
        let lesson: Option<bool> =
            sqlx::query_scalar("SELECT lesson FROM products WHERE product_id = $1")
                .bind(product_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(lesson.unwrap_or(false))
    }
}

/// New order data assembled by the service before persistence
#[derive(Debug)]
pub struct NewOrder {
    pub order_no: String,
    pub customer_id: Option<i32>,
    pub fields: LessonFields,
    pub subtotal: Decimal,
    pub total: Decimal,
}

/// Repository for order operations
#[derive(Clone)]
pub struct OrdersRepository {
    pool: PgPool,
}

impl OrdersRepository {
    /// Create a new OrdersRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new order with items in a transaction
    ///
    /// The pricing fields (lesson flag, postcode, band, transmission) come
    /// from the lesson context; postcode and band persist as NULL when
    /// unset.
    pub async fn create(
        &self,
        new_order: NewOrder,
        items: Vec<(i32, i32, Decimal, Decimal)>, // (product_id, quantity, price_snapshot, subtotal)
    ) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO orders \
                 (order_no, customer_id, status, payment_status, lesson, postcode, band, \
                  transmission, subtotal, total) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(&new_order.order_no)
        .bind(new_order.customer_id)
        .bind(OrderStatus::Pending)
        .bind(PaymentStatus::Unpaid)
        .bind(new_order.fields.lesson)
        .bind(&new_order.fields.postcode)
        .bind(&new_order.fields.band)
        .bind(new_order.fields.transmission)
        .bind(new_order.subtotal)
        .bind(new_order.total)
        .fetch_one(&mut *tx)
        .await?;

        for (product_id, quantity, price_snapshot, subtotal) in items {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, price_snapshot, subtotal) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(order.id)
            .bind(product_id)
            .bind(quantity)
            .bind(price_snapshot)
            .bind(subtotal)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(order)
    }

    /// Find an order by ID
    pub async fn find_by_id(&self, order_id: Uuid) -> Result<Option<Order>, OrderError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Find an order by its order number
    pub async fn find_by_order_no(&self, order_no: &str) -> Result<Option<Order>, OrderError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_no = $1"
        ))
        .bind(order_no)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Update order status
    pub async fn update_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<Order, OrderError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET status = $1, updated_at = NOW() \
             WHERE id = $2 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(new_status)
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(OrderError::NotFound)?;

        Ok(order)
    }

    /// Rewrite an order's totals, pricing fields and line prices
    ///
    /// Used by the recomputation path: the order row and its line
    /// snapshots change together or not at all.
    pub async fn update_totals(
        &self,
        order_id: Uuid,
        fields: &LessonFields,
        subtotal: Decimal,
        total: Decimal,
        items: Vec<(i32, Decimal, Decimal)>, // (item_id, price_snapshot, subtotal)
    ) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders \
             SET lesson = $1, postcode = $2, band = $3, transmission = $4, \
                 subtotal = $5, total = $6, updated_at = NOW() \
             WHERE id = $7 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(fields.lesson)
        .bind(&fields.postcode)
        .bind(&fields.band)
        .bind(fields.transmission)
        .bind(subtotal)
        .bind(total)
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(OrderError::NotFound)?;

        for (item_id, price_snapshot, item_subtotal) in items {
            sqlx::query(
                "UPDATE order_items SET price_snapshot = $1, subtotal = $2 WHERE id = $3",
            )
            .bind(price_snapshot)
            .bind(item_subtotal)
            .bind(item_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(order)
    }

    /// Update payment status
    pub async fn update_payment_status(
        &self,
        order_id: Uuid,
        new_payment_status: PaymentStatus,
    ) -> Result<Order, OrderError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET payment_status = $1, updated_at = NOW() \
             WHERE id = $2 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(new_payment_status)
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(OrderError::NotFound)?;

        Ok(order)
    }
}

/// Repository for order items operations
#[derive(Clone)]
pub struct OrderItemsRepository {
    pool: PgPool,
}

impl OrderItemsRepository {
    /// Create a new OrderItemsRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find all items for a given order
    pub async fn find_by_order_id(&self, order_id: Uuid) -> Result<Vec<OrderItem>, OrderError> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT id, order_id, product_id, quantity, price_snapshot, subtotal \
             FROM order_items WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    // Repository methods run against a live database and are exercised
    // through the service layer in deployment.
}
