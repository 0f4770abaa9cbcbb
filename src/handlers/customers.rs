use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::handlers::common::{pagination, Principal};
use crate::services::customers::{
    CreateCustomerRequest, CustomerListResponse, CustomerResponse, UpdateCustomerRequest,
};
use crate::{errors::ServiceError, ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CustomerListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Match against name or phone.
    pub search: Option<String>,
}

/// List customers with pagination and optional search
#[utoipa::path(
    get,
    path = "/api/v1/customers",
    params(CustomerListQuery),
    responses(
        (status = 200, description = "Customers listed", body = ApiResponse<CustomerListResponse>)
    ),
    tag = "customers"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<CustomerListQuery>,
) -> ApiResult<CustomerListResponse> {
    let (page, limit) = pagination(query.page, query.limit);
    let customers = state
        .services
        .customers
        .list_customers(page, limit, query.search)
        .await?;
    Ok(Json(ApiResponse::success(customers)))
}

/// Fetch one customer
#[utoipa::path(
    get,
    path = "/api/v1/customers/:id",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer fetched", body = ApiResponse<CustomerResponse>),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse)
    ),
    tag = "customers"
)]
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<CustomerResponse> {
    match state.services.customers.get_customer(id).await? {
        Some(customer) => Ok(Json(ApiResponse::success(customer))),
        None => Err(ServiceError::NotFound(format!(
            "Customer {} not found",
            id
        ))),
    }
}

/// Register a customer
#[utoipa::path(
    post,
    path = "/api/v1/customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 200, description = "Customer created", body = ApiResponse<CustomerResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Phone number already registered", body = crate::errors::ErrorResponse)
    ),
    tag = "customers"
)]
pub async fn create_customer(
    State(state): State<AppState>,
    _principal: Principal,
    Json(payload): Json<CreateCustomerRequest>,
) -> ApiResult<CustomerResponse> {
    let customer = state.services.customers.create_customer(payload).await?;
    Ok(Json(ApiResponse::success(customer)))
}

/// Update a customer's profile
#[utoipa::path(
    put,
    path = "/api/v1/customers/:id",
    request_body = UpdateCustomerRequest,
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer updated", body = ApiResponse<CustomerResponse>),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse)
    ),
    tag = "customers"
)]
pub async fn update_customer(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCustomerRequest>,
) -> ApiResult<CustomerResponse> {
    let customer = state
        .services
        .customers
        .update_customer(id, payload)
        .await?;
    Ok(Json(ApiResponse::success(customer)))
}

/// Delete a customer
#[utoipa::path(
    delete,
    path = "/api/v1/customers/:id",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse)
    ),
    tag = "customers"
)]
pub async fn delete_customer(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    state.services.customers.delete_customer(id).await?;
    Ok(Json(ApiResponse::success(serde_json::json!({
        "deleted": id
    }))))
}
