use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::handlers::common::{pagination, Principal};
use crate::services::inventory::{
    BatchResponse, CreateItemRequest, ImportBatchRequest, ItemListResponse, ItemResponse,
};
use crate::{errors::ServiceError, ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InventoryListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// List stocked items with pagination
#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    params(InventoryListQuery),
    responses(
        (status = 200, description = "Items listed", body = ApiResponse<ItemListResponse>)
    ),
    tag = "inventory"
)]
pub async fn list_inventory(
    State(state): State<AppState>,
    Query(query): Query<InventoryListQuery>,
) -> ApiResult<ItemListResponse> {
    let (page, limit) = pagination(query.page, query.limit);
    let items = state.services.inventory.list_items(page, limit).await?;
    Ok(Json(ApiResponse::success(items)))
}

/// Fetch one stocked item with its variant breakdown
#[utoipa::path(
    get,
    path = "/api/v1/inventory/:id",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item fetched", body = ApiResponse<ItemResponse>),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn get_inventory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ItemResponse> {
    match state.services.inventory.get_item(id).await? {
        Some(item) => Ok(Json(ApiResponse::success(item))),
        None => Err(ServiceError::NotFound(format!(
            "Inventory item {} not found",
            id
        ))),
    }
}

/// Register a new stocked item
#[utoipa::path(
    post,
    path = "/api/v1/inventory",
    request_body = CreateItemRequest,
    responses(
        (status = 200, description = "Item created", body = ApiResponse<ItemResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn create_inventory(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<CreateItemRequest>,
) -> ApiResult<ItemResponse> {
    let item = state
        .services
        .inventory
        .create_item(payload, principal.name())
        .await?;
    Ok(Json(ApiResponse::success(item)))
}

/// Import a purchase batch into an item
#[utoipa::path(
    post,
    path = "/api/v1/inventory/:id/batches",
    request_body = ImportBatchRequest,
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Batch merged into the item", body = ApiResponse<ItemResponse>),
        (status = 400, description = "Invalid batch payload or duplicate batch number", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn import_batch(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(payload): Json<ImportBatchRequest>,
) -> ApiResult<ItemResponse> {
    let item = state
        .services
        .inventory
        .import_batch(id, payload, principal.name())
        .await?;
    Ok(Json(ApiResponse::success(item)))
}

/// List the batch history of an item, newest first
#[utoipa::path(
    get,
    path = "/api/v1/inventory/:id/batches",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Batch history", body = ApiResponse<Vec<BatchResponse>>),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn list_batches(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<BatchResponse>> {
    let batches = state.services.inventory.list_batches(id).await?;
    Ok(Json(ApiResponse::success(batches)))
}

/// Delete an item with its variants and batch history
#[utoipa::path(
    delete,
    path = "/api/v1/inventory/:id",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn delete_inventory(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    state.services.inventory.delete_item(id).await?;
    Ok(Json(ApiResponse::success(serde_json::json!({
        "deleted": id
    }))))
}
