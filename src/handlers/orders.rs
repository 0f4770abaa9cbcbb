use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::entities::order::OrderStatus;
use crate::handlers::common::{pagination, Principal};
use crate::services::orders::{
    CreateOrderRequest, OrderListResponse, OrderResponse, RecordPaymentRequest,
};
use crate::{errors::ServiceError, ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Filter by order status token (e.g. `pending`, `shipping`).
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CancelOrderRequest {
    pub reason: Option<String>,
}

fn map_status_str(status: &str) -> Result<OrderStatus, ServiceError> {
    match status.to_ascii_lowercase().as_str() {
        "pending" => Ok(OrderStatus::Pending),
        "waiting" => Ok(OrderStatus::Waiting),
        "processing" => Ok(OrderStatus::Processing),
        "shipping" => Ok(OrderStatus::Shipping),
        "delivered" => Ok(OrderStatus::Delivered),
        "canceled" | "cancelled" => Ok(OrderStatus::Canceled),
        other => Err(ServiceError::InvalidStatus(format!(
            "Unknown order status: {other}"
        ))),
    }
}

/// List orders with pagination and optional status filter
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Orders listed", body = ApiResponse<OrderListResponse>)
    ),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> ApiResult<OrderListResponse> {
    let (page, limit) = pagination(query.page, query.limit);
    let status = query.status.as_deref().map(map_status_str).transpose()?;
    let orders = state
        .services
        .orders
        .list_orders(page, limit, status)
        .await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// Fetch one order with lines and payments
#[utoipa::path(
    get,
    path = "/api/v1/orders/:id",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order fetched", body = ApiResponse<OrderResponse>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<OrderResponse> {
    match state.services.orders.get_order(id).await? {
        Some(order) => Ok(Json(ApiResponse::success(order))),
        None => Err(ServiceError::NotFound(format!("Order {} not found", id))),
    }
}

/// Create an order, decrementing stock for each line
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order created", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Invalid request or insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<CreateOrderRequest>,
) -> ApiResult<OrderResponse> {
    let order = state
        .services
        .orders
        .create_order(payload, principal.name())
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Record a payment against an order
#[utoipa::path(
    post,
    path = "/api/v1/orders/:id/payments",
    request_body = RecordPaymentRequest,
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Payment recorded", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Invalid payment", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn record_payment(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordPaymentRequest>,
) -> ApiResult<OrderResponse> {
    let order = state
        .services
        .orders
        .record_payment(id, payload, principal.name())
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Advance an order along the forward status path
#[utoipa::path(
    put,
    path = "/api/v1/orders/:id/status",
    request_body = UpdateOrderStatusRequest,
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Invalid transition", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> ApiResult<OrderResponse> {
    let order = state
        .services
        .orders
        .update_status(id, payload.status)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Cancel an order, restoring its stock
#[utoipa::path(
    post,
    path = "/api/v1/orders/:id/cancel",
    request_body = CancelOrderRequest,
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order canceled", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Order cannot be canceled", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(payload): Json<CancelOrderRequest>,
) -> ApiResult<OrderResponse> {
    let order = state
        .services
        .orders
        .cancel_order(id, payload.reason, principal.name())
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_map_to_enum_tokens() {
        assert_eq!(map_status_str("pending").unwrap(), OrderStatus::Pending);
        assert_eq!(map_status_str("SHIPPING").unwrap(), OrderStatus::Shipping);
        assert_eq!(map_status_str("cancelled").unwrap(), OrderStatus::Canceled);
        assert!(map_status_str("archived").is_err());
    }
}
