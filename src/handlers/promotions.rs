use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::handlers::common::{pagination, Principal};
use crate::services::promotions::{
    CreatePromotionRequest, PromotionListResponse, PromotionResponse,
};
use crate::{errors::ServiceError, ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PromotionListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PreviewDiscountRequest {
    pub total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PreviewDiscountResponse {
    pub total: Decimal,
    pub discount: Decimal,
    pub payable: Decimal,
}

/// List promotions with their derived lifecycle status
#[utoipa::path(
    get,
    path = "/api/v1/promotions",
    params(PromotionListQuery),
    responses(
        (status = 200, description = "Promotions listed", body = ApiResponse<PromotionListResponse>)
    ),
    tag = "promotions"
)]
pub async fn list_promotions(
    State(state): State<AppState>,
    Query(query): Query<PromotionListQuery>,
) -> ApiResult<PromotionListResponse> {
    let (page, limit) = pagination(query.page, query.limit);
    let promotions = state
        .services
        .promotions
        .list_promotions(page, limit)
        .await?;
    Ok(Json(ApiResponse::success(promotions)))
}

/// Fetch one promotion
#[utoipa::path(
    get,
    path = "/api/v1/promotions/:id",
    params(("id" = Uuid, Path, description = "Promotion ID")),
    responses(
        (status = 200, description = "Promotion fetched", body = ApiResponse<PromotionResponse>),
        (status = 404, description = "Promotion not found", body = crate::errors::ErrorResponse)
    ),
    tag = "promotions"
)]
pub async fn get_promotion(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<PromotionResponse> {
    match state.services.promotions.get_promotion(id).await? {
        Some(promotion) => Ok(Json(ApiResponse::success(promotion))),
        None => Err(ServiceError::NotFound(format!(
            "Promotion {} not found",
            id
        ))),
    }
}

/// Create a promotion
#[utoipa::path(
    post,
    path = "/api/v1/promotions",
    request_body = CreatePromotionRequest,
    responses(
        (status = 200, description = "Promotion created", body = ApiResponse<PromotionResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "promotions"
)]
pub async fn create_promotion(
    State(state): State<AppState>,
    _principal: Principal,
    Json(payload): Json<CreatePromotionRequest>,
) -> ApiResult<PromotionResponse> {
    let promotion = state.services.promotions.create_promotion(payload).await?;
    Ok(Json(ApiResponse::success(promotion)))
}

/// Preview the discount a promotion grants on an order total
#[utoipa::path(
    post,
    path = "/api/v1/promotions/:id/preview-discount",
    request_body = PreviewDiscountRequest,
    params(("id" = Uuid, Path, description = "Promotion ID")),
    responses(
        (status = 200, description = "Discount computed", body = ApiResponse<PreviewDiscountResponse>),
        (status = 400, description = "Promotion not applicable", body = crate::errors::ErrorResponse),
        (status = 404, description = "Promotion not found", body = crate::errors::ErrorResponse)
    ),
    tag = "promotions"
)]
pub async fn preview_discount(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PreviewDiscountRequest>,
) -> ApiResult<PreviewDiscountResponse> {
    let discount = state
        .services
        .promotions
        .preview_discount(id, payload.total)
        .await?;
    Ok(Json(ApiResponse::success(PreviewDiscountResponse {
        total: payload.total,
        discount,
        payable: payload.total - discount,
    })))
}

/// Delete a promotion
#[utoipa::path(
    delete,
    path = "/api/v1/promotions/:id",
    params(("id" = Uuid, Path, description = "Promotion ID")),
    responses(
        (status = 200, description = "Promotion deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Promotion not found", body = crate::errors::ErrorResponse)
    ),
    tag = "promotions"
)]
pub async fn delete_promotion(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    state.services.promotions.delete_promotion(id).await?;
    Ok(Json(ApiResponse::success(serde_json::json!({
        "deleted": id
    }))))
}
