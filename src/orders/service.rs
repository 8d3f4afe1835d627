use rand::Rng;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::Product;
use crate::notifications;
use crate::orders::repository::NewOrder;
use crate::orders::totals::{LessonAwareTotals, LessonContext, TotalsCalculator};
use crate::orders::{
    CreateOrderRequest, Order, OrderError, OrderItemsRepository, OrderResponse, OrderStatus,
    OrdersRepository, PaymentStatus, ProductsRepository, StatusMachine,
};
use crate::pricing::LessonPricingEngine;

/// Service for order business logic
///
/// Owns the checkout orchestration: the pricing engine is injected as a
/// capability, not inherited, and only its narrow resolver/totals interfaces
/// are used here.
#[derive(Clone)]
pub struct OrderService {
    orders_repo: OrdersRepository,
    order_items_repo: OrderItemsRepository,
    products_repo: ProductsRepository,
    engine: Arc<LessonPricingEngine>,
}

impl OrderService {
    /// Create a new OrderService
    pub fn new(
        orders_repo: OrdersRepository,
        order_items_repo: OrderItemsRepository,
        products_repo: ProductsRepository,
        engine: Arc<LessonPricingEngine>,
    ) -> Self {
        Self {
            orders_repo,
            order_items_repo,
            products_repo,
            engine,
        }
    }

    /// Create a new order
    ///
    /// Walks the requested lines once through LessonAwareTotals so the
    /// lesson flag and band binding happen exactly as they would on a
    /// basket recomputation, then prices each line:
    /// - band-priced lesson products resolve through the bound band
    ///   (sale price preferred when the course carries an offer rate)
    /// - everything else uses its catalog price, sale price preferred
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<Order, OrderError> {
        if request.items.is_empty() {
            return Err(OrderError::ValidationError(
                "Order must contain at least one item".to_string(),
            ));
        }

        let product_ids: Vec<i32> = request
            .items
            .iter()
            .map(|item| {
                if item.quantity <= 0 {
                    return Err(OrderError::InvalidQuantity(format!(
                        "Quantity must be positive, got {}",
                        item.quantity
                    )));
                }
                Ok(item.product_id)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let products = self.products_repo.find_by_ids(&product_ids).await?;
        let product_map: HashMap<i32, Product> = products
            .into_iter()
            .map(|product| (product.product_id, product))
            .collect();

        // Seed the lesson context from the request, then walk the lines
        let mut context = LessonContext::new(request.transmission.unwrap_or_default());
        if let Some(ref postcode) = request.postcode {
            context.set_postcode(postcode);
        }
        if let Some(ref band) = request.band {
            context.set_band(band);
        }

        let mut totals = LessonAwareTotals::new(self.engine.resolver(), context);

        for item in &request.items {
            let product = product_map
                .get(&item.product_id)
                .ok_or(OrderError::ProductNotFound(item.product_id))?;
            totals.observe_line(product.lesson).await?;
        }

        // Price each line against the (now bound) context
        let mut order_items = Vec::with_capacity(request.items.len());
        let mut subtotals = Vec::with_capacity(request.items.len());

        for item in &request.items {
            let product = &product_map[&item.product_id];
            let unit_price = self.unit_price(product, &totals).await?;

            let subtotal = TotalsCalculator::line_subtotal(item.quantity, unit_price);
            subtotals.push(subtotal);
            order_items.push((item.product_id, item.quantity, unit_price, subtotal));
        }

        let subtotal = TotalsCalculator::order_total(&subtotals);

        let order = self
            .orders_repo
            .create(
                NewOrder {
                    order_no: generate_order_no(),
                    customer_id: request.customer_id,
                    fields: totals.persist_fields(),
                    subtotal,
                    total: subtotal,
                },
                order_items,
            )
            .await?;

        tracing::info!(
            "Created order {} (lesson: {}, band: {:?})",
            order.order_no,
            order.lesson,
            order.band
        );

        Ok(order)
    }

    /// Recompute an order's totals from current band and course data
    ///
    /// The lesson context is rebuilt from the persisted record (first
    /// observation wins, so fields already on the order are kept), the
    /// lines are walked again, and the row plus its line snapshots are
    /// rewritten atomically. Recomputing an unchanged order is idempotent:
    /// the lesson flag never flips back and the same band resolves again.
    pub async fn recompute_totals(&self, order_id: Uuid) -> Result<Order, OrderError> {
        let order = self
            .orders_repo
            .find_by_id(order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        let items = self.order_items_repo.find_by_order_id(order.id).await?;
        let product_ids: Vec<i32> = items.iter().map(|item| item.product_id).collect();
        let products = self.products_repo.find_by_ids(&product_ids).await?;
        let product_map: HashMap<i32, Product> = products
            .into_iter()
            .map(|product| (product.product_id, product))
            .collect();

        let mut context = LessonContext::new(order.transmission);
        if let Some(ref postcode) = order.postcode {
            context.adopt_postcode(postcode);
        }
        if let Some(ref band) = order.band {
            context.adopt_band(band);
        }
        if order.lesson {
            context.observe_line(true);
        }

        let mut totals = LessonAwareTotals::new(self.engine.resolver(), context);

        for item in &items {
            let product = product_map
                .get(&item.product_id)
                .ok_or(OrderError::ProductNotFound(item.product_id))?;
            totals.observe_line(product.lesson).await?;
        }

        let mut item_updates = Vec::with_capacity(items.len());
        let mut subtotals = Vec::with_capacity(items.len());

        for item in &items {
            let product = &product_map[&item.product_id];
            let unit_price = self.unit_price(product, &totals).await?;

            let subtotal = TotalsCalculator::line_subtotal(item.quantity, unit_price);
            subtotals.push(subtotal);
            item_updates.push((item.id, unit_price, subtotal));
        }

        let subtotal = TotalsCalculator::order_total(&subtotals);

        let updated_order = self
            .orders_repo
            .update_totals(
                order.id,
                &totals.persist_fields(),
                subtotal,
                subtotal,
                item_updates,
            )
            .await?;

        Ok(updated_order)
    }

    /// The unit price for one order line
    async fn unit_price(
        &self,
        product: &Product,
        totals: &LessonAwareTotals,
    ) -> Result<Decimal, OrderError> {
        if product.is_band_priced() {
            let course = product.course.as_deref().ok_or_else(|| {
                OrderError::ValidationError(format!(
                    "Lesson product {} has no course relation",
                    product.product_id
                ))
            })?;

            let resolved = totals.unit_price(course).await?;
            Ok(resolved.sale_price.unwrap_or(resolved.price))
        } else {
            product.catalog_price().ok_or_else(|| {
                OrderError::ValidationError(format!(
                    "Product {} has no price",
                    product.product_id
                ))
            })
        }
    }

    /// Get an order with its items by order number
    pub async fn get_order(&self, order_no: &str) -> Result<OrderResponse, OrderError> {
        let order = self
            .orders_repo
            .find_by_order_no(order_no)
            .await?
            .ok_or(OrderError::NotFound)?;

        let items = self.order_items_repo.find_by_order_id(order.id).await?;

        Ok(OrderResponse::from_order(order, items))
    }

    /// Update order status
    ///
    /// The transition must be valid according to the StatusMachine.
    pub async fn update_order_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<Order, OrderError> {
        let order = self
            .orders_repo
            .find_by_id(order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        StatusMachine::transition(order.status, new_status)
            .map_err(OrderError::InvalidTransition)?;

        let updated_order = self.orders_repo.update_status(order_id, new_status).await?;

        Ok(updated_order)
    }

    /// Update payment status
    ///
    /// Transitioning to Paid triggers the purchase-confirmation
    /// notification; composing and sending the mail belongs to the
    /// notification subsystem.
    pub async fn update_payment_status(
        &self,
        order_id: Uuid,
        new_payment_status: PaymentStatus,
    ) -> Result<Order, OrderError> {
        let order = self
            .orders_repo
            .find_by_id(order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        let updated_order = self
            .orders_repo
            .update_payment_status(order_id, new_payment_status)
            .await?;

        if new_payment_status == PaymentStatus::Paid && order.payment_status != PaymentStatus::Paid
        {
            let notification = notifications::confirmation_for(&updated_order);
            let template = notification.kind.template();
            tracing::info!(
                "Order {} paid; queued {} notification (template {})",
                updated_order.order_no,
                notification.kind,
                template.subject
            );
        }

        Ok(updated_order)
    }
}

/// Generate a short, unambiguous order number
fn generate_order_no() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
    let mut rng = rand::thread_rng();

    (0..10)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_numbers_use_unambiguous_charset() {
        for _ in 0..50 {
            let order_no = generate_order_no();
            assert_eq!(order_no.len(), 10);
            assert!(order_no
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
            // 0, 1, I and O are excluded as easily confused
            assert!(!order_no.contains(['0', '1', 'I', 'O']));
        }
    }
}
