use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::handlers::common::{pagination, Principal};
use crate::services::warranties::{
    ActivateWarrantyRequest, CreateWarrantyRequest, WarrantyListResponse, WarrantyResponse,
};
use crate::{errors::ServiceError, ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WarrantyListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Filter by the owning item.
    pub item_id: Option<Uuid>,
}

/// List warranties, optionally narrowed to one item
#[utoipa::path(
    get,
    path = "/api/v1/warranties",
    params(WarrantyListQuery),
    responses(
        (status = 200, description = "Warranties listed", body = ApiResponse<WarrantyListResponse>)
    ),
    tag = "warranties"
)]
pub async fn list_warranties(
    State(state): State<AppState>,
    Query(query): Query<WarrantyListQuery>,
) -> ApiResult<WarrantyListResponse> {
    if let Some(item_id) = query.item_id {
        let warranties = state
            .services
            .warranties
            .list_warranties_for_item(item_id)
            .await?;
        let total = warranties.len() as u64;
        return Ok(Json(ApiResponse::success(WarrantyListResponse {
            warranties,
            total,
            page: 1,
            per_page: total.max(1),
        })));
    }

    let (page, limit) = pagination(query.page, query.limit);
    let warranties = state
        .services
        .warranties
        .list_warranties(page, limit)
        .await?;
    Ok(Json(ApiResponse::success(warranties)))
}

/// Fetch one warranty
#[utoipa::path(
    get,
    path = "/api/v1/warranties/:id",
    params(("id" = Uuid, Path, description = "Warranty ID")),
    responses(
        (status = 200, description = "Warranty fetched", body = ApiResponse<WarrantyResponse>),
        (status = 404, description = "Warranty not found", body = crate::errors::ErrorResponse)
    ),
    tag = "warranties"
)]
pub async fn get_warranty(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<WarrantyResponse> {
    match state.services.warranties.get_warranty(id).await? {
        Some(warranty) => Ok(Json(ApiResponse::success(warranty))),
        None => Err(ServiceError::NotFound(format!(
            "Warranty {} not found",
            id
        ))),
    }
}

/// Register a pending warranty for a product
#[utoipa::path(
    post,
    path = "/api/v1/warranties",
    request_body = CreateWarrantyRequest,
    responses(
        (status = 200, description = "Warranty created", body = ApiResponse<WarrantyResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "warranties"
)]
pub async fn create_warranty(
    State(state): State<AppState>,
    _principal: Principal,
    Json(payload): Json<CreateWarrantyRequest>,
) -> ApiResult<WarrantyResponse> {
    let warranty = state.services.warranties.create_warranty(payload).await?;
    Ok(Json(ApiResponse::success(warranty)))
}

/// Activate a pending warranty against a delivered order
#[utoipa::path(
    post,
    path = "/api/v1/warranties/:id/activate",
    request_body = ActivateWarrantyRequest,
    params(("id" = Uuid, Path, description = "Warranty ID")),
    responses(
        (status = 200, description = "Warranty activated", body = ApiResponse<WarrantyResponse>),
        (status = 400, description = "Warranty not pending or order not eligible", body = crate::errors::ErrorResponse),
        (status = 404, description = "Warranty not found", body = crate::errors::ErrorResponse)
    ),
    tag = "warranties"
)]
pub async fn activate_warranty(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<Uuid>,
    Json(payload): Json<ActivateWarrantyRequest>,
) -> ApiResult<WarrantyResponse> {
    let warranty = state
        .services
        .warranties
        .activate_warranty(id, payload)
        .await?;
    Ok(Json(ApiResponse::success(warranty)))
}
