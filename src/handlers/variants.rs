use axum::{
    extract::{Path, State},
    response::Json,
};
use uuid::Uuid;

use crate::handlers::common::Principal;
use crate::services::variants::{
    AttributeResponse, CreateAttributeRequest, UpdateAttributeRequest,
};
use crate::{errors::ServiceError, ApiResponse, ApiResult, AppState};

/// List variant attribute definitions
#[utoipa::path(
    get,
    path = "/api/v1/variants",
    responses(
        (status = 200, description = "Attributes listed", body = ApiResponse<Vec<AttributeResponse>>)
    ),
    tag = "variants"
)]
pub async fn list_attributes(
    State(state): State<AppState>,
) -> ApiResult<Vec<AttributeResponse>> {
    let attributes = state.services.variants.list_attributes().await?;
    Ok(Json(ApiResponse::success(attributes)))
}

/// Fetch one attribute definition
#[utoipa::path(
    get,
    path = "/api/v1/variants/:id",
    params(("id" = Uuid, Path, description = "Attribute ID")),
    responses(
        (status = 200, description = "Attribute fetched", body = ApiResponse<AttributeResponse>),
        (status = 404, description = "Attribute not found", body = crate::errors::ErrorResponse)
    ),
    tag = "variants"
)]
pub async fn get_attribute(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<AttributeResponse> {
    match state.services.variants.get_attribute(id).await? {
        Some(attribute) => Ok(Json(ApiResponse::success(attribute))),
        None => Err(ServiceError::NotFound(format!(
            "Variant attribute {} not found",
            id
        ))),
    }
}

/// Define a variant attribute with its allowed values
#[utoipa::path(
    post,
    path = "/api/v1/variants",
    request_body = CreateAttributeRequest,
    responses(
        (status = 200, description = "Attribute created", body = ApiResponse<AttributeResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Attribute name already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "variants"
)]
pub async fn create_attribute(
    State(state): State<AppState>,
    _principal: Principal,
    Json(payload): Json<CreateAttributeRequest>,
) -> ApiResult<AttributeResponse> {
    let attribute = state.services.variants.create_attribute(payload).await?;
    Ok(Json(ApiResponse::success(attribute)))
}

/// Replace the allowed values of an attribute
#[utoipa::path(
    put,
    path = "/api/v1/variants/:id",
    request_body = UpdateAttributeRequest,
    params(("id" = Uuid, Path, description = "Attribute ID")),
    responses(
        (status = 200, description = "Attribute updated", body = ApiResponse<AttributeResponse>),
        (status = 404, description = "Attribute not found", body = crate::errors::ErrorResponse)
    ),
    tag = "variants"
)]
pub async fn update_attribute(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAttributeRequest>,
) -> ApiResult<AttributeResponse> {
    let attribute = state
        .services
        .variants
        .update_attribute(id, payload)
        .await?;
    Ok(Json(ApiResponse::success(attribute)))
}

/// Delete an attribute definition; rejected while referenced by any variant
#[utoipa::path(
    delete,
    path = "/api/v1/variants/:id",
    params(("id" = Uuid, Path, description = "Attribute ID")),
    responses(
        (status = 200, description = "Attribute deleted", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Attribute still referenced", body = crate::errors::ErrorResponse),
        (status = 404, description = "Attribute not found", body = crate::errors::ErrorResponse)
    ),
    tag = "variants"
)]
pub async fn delete_attribute(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    state.services.variants.delete_attribute(id).await?;
    Ok(Json(ApiResponse::success(serde_json::json!({
        "deleted": id
    }))))
}
