use axum::{
    extract::{Path, State},
    response::Json,
};
use uuid::Uuid;

use crate::handlers::common::Principal;
use crate::services::catalog::{
    CategoryResponse, CreateCategoryRequest, CreateSupplierRequest, SupplierResponse,
};
use crate::{ApiResponse, ApiResult, AppState};

/// List product categories
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses(
        (status = 200, description = "Categories listed", body = ApiResponse<Vec<CategoryResponse>>)
    ),
    tag = "catalog"
)]
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Vec<CategoryResponse>> {
    let categories = state.services.catalog.list_categories().await?;
    Ok(Json(ApiResponse::success(categories)))
}

/// Create a product category
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 200, description = "Category created", body = ApiResponse<CategoryResponse>),
        (status = 409, description = "Category name already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn create_category(
    State(state): State<AppState>,
    _principal: Principal,
    Json(payload): Json<CreateCategoryRequest>,
) -> ApiResult<CategoryResponse> {
    let category = state.services.catalog.create_category(payload).await?;
    Ok(Json(ApiResponse::success(category)))
}

/// Delete a category; rejected while items reference it
#[utoipa::path(
    delete,
    path = "/api/v1/categories/:id",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Category still referenced", body = crate::errors::ErrorResponse),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    state.services.catalog.delete_category(id).await?;
    Ok(Json(ApiResponse::success(serde_json::json!({
        "deleted": id
    }))))
}

/// List suppliers
#[utoipa::path(
    get,
    path = "/api/v1/suppliers",
    responses(
        (status = 200, description = "Suppliers listed", body = ApiResponse<Vec<SupplierResponse>>)
    ),
    tag = "catalog"
)]
pub async fn list_suppliers(State(state): State<AppState>) -> ApiResult<Vec<SupplierResponse>> {
    let suppliers = state.services.catalog.list_suppliers().await?;
    Ok(Json(ApiResponse::success(suppliers)))
}

/// Create a supplier
#[utoipa::path(
    post,
    path = "/api/v1/suppliers",
    request_body = CreateSupplierRequest,
    responses(
        (status = 200, description = "Supplier created", body = ApiResponse<SupplierResponse>)
    ),
    tag = "catalog"
)]
pub async fn create_supplier(
    State(state): State<AppState>,
    _principal: Principal,
    Json(payload): Json<CreateSupplierRequest>,
) -> ApiResult<SupplierResponse> {
    let supplier = state.services.catalog.create_supplier(payload).await?;
    Ok(Json(ApiResponse::success(supplier)))
}

/// Delete a supplier; rejected while items reference it
#[utoipa::path(
    delete,
    path = "/api/v1/suppliers/:id",
    params(("id" = Uuid, Path, description = "Supplier ID")),
    responses(
        (status = 200, description = "Supplier deleted", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Supplier still referenced", body = crate::errors::ErrorResponse),
        (status = 404, description = "Supplier not found", body = crate::errors::ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn delete_supplier(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    state.services.catalog.delete_supplier(id).await?;
    Ok(Json(ApiResponse::success(serde_json::json!({
        "deleted": id
    }))))
}
