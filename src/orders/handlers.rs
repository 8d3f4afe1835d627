// HTTP handlers for order endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::orders::{
    CreateOrderRequest, OrderError, OrderResponse, UpdatePaymentRequest, UpdateStatusRequest,
};

/// Handler for POST /api/orders
/// Creates a new order, pricing lesson lines through the band engine
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "Invalid request or unpriceable line"),
        (status = 404, description = "Postcode or band not found")
    ),
    tag = "orders"
)]
pub async fn create_order_handler(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), OrderError> {
    request
        .validate()
        .map_err(|e| OrderError::ValidationError(e.to_string()))?;

    let order = state.order_service.create_order(request).await?;

    let items = state.order_items_repo.find_by_order_id(order.id).await?;
    let response = OrderResponse::from_order(order, items);

    Ok((StatusCode::CREATED, Json(response)))
}

/// Handler for GET /api/orders/{id}
/// Retrieves an order with its items by order number
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = String, Path, description = "Order number")),
    responses(
        (status = 200, description = "Order details", body = OrderResponse),
        (status = 404, description = "Order not found")
    ),
    tag = "orders"
)]
pub async fn get_order_handler(
    State(state): State<crate::AppState>,
    Path(order_no): Path<String>,
) -> Result<Json<OrderResponse>, OrderError> {
    let order = state.order_service.get_order(&order_no).await?;
    Ok(Json(order))
}

/// Handler for POST /api/orders/{id}/recompute
/// Recomputes an order's totals from current band and course data
///
/// Calling this twice on an unchanged order yields identical results.
#[utoipa::path(
    post,
    path = "/api/orders/{id}/recompute",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Totals recomputed", body = OrderResponse),
        (status = 404, description = "Order not found")
    ),
    tag = "orders"
)]
pub async fn recompute_totals_handler(
    State(state): State<crate::AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderResponse>, OrderError> {
    let order = state.order_service.recompute_totals(order_id).await?;

    let items = state.order_items_repo.find_by_order_id(order.id).await?;
    Ok(Json(OrderResponse::from_order(order, items)))
}

/// Handler for PUT /api/orders/{id}/status
/// Updates the status of an order
#[utoipa::path(
    put,
    path = "/api/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = OrderResponse),
        (status = 400, description = "Invalid transition"),
        (status = 404, description = "Order not found")
    ),
    tag = "orders"
)]
pub async fn update_order_status_handler(
    State(state): State<crate::AppState>,
    Path(order_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, OrderError> {
    let order = state
        .order_service
        .update_order_status(order_id, request.status)
        .await?;

    let items = state.order_items_repo.find_by_order_id(order.id).await?;
    Ok(Json(OrderResponse::from_order(order, items)))
}

/// Handler for PUT /api/orders/{id}/payment
/// Updates the payment status of an order; paid orders trigger the
/// confirmation notification
#[utoipa::path(
    put,
    path = "/api/orders/{id}/payment",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdatePaymentRequest,
    responses(
        (status = 200, description = "Payment status updated", body = OrderResponse),
        (status = 404, description = "Order not found")
    ),
    tag = "orders"
)]
pub async fn update_payment_handler(
    State(state): State<crate::AppState>,
    Path(order_id): Path<Uuid>,
    Json(request): Json<UpdatePaymentRequest>,
) -> Result<Json<OrderResponse>, OrderError> {
    let order = state
        .order_service
        .update_payment_status(order_id, request.payment_status)
        .await?;

    let items = state.order_items_repo.find_by_order_id(order.id).await?;
    Ok(Json(OrderResponse::from_order(order, items)))
}
