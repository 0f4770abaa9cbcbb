use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::handlers::common::{pagination, Principal};
use crate::services::employees::{CreateEmployeeRequest, EmployeeListResponse, EmployeeResponse};
use crate::{errors::ServiceError, ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeeListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// List employees with pagination
#[utoipa::path(
    get,
    path = "/api/v1/employees",
    params(EmployeeListQuery),
    responses(
        (status = 200, description = "Employees listed", body = ApiResponse<EmployeeListResponse>)
    ),
    tag = "employees"
)]
pub async fn list_employees(
    State(state): State<AppState>,
    Query(query): Query<EmployeeListQuery>,
) -> ApiResult<EmployeeListResponse> {
    let (page, limit) = pagination(query.page, query.limit);
    let employees = state.services.employees.list_employees(page, limit).await?;
    Ok(Json(ApiResponse::success(employees)))
}

/// Fetch one employee
#[utoipa::path(
    get,
    path = "/api/v1/employees/:id",
    params(("id" = Uuid, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee fetched", body = ApiResponse<EmployeeResponse>),
        (status = 404, description = "Employee not found", body = crate::errors::ErrorResponse)
    ),
    tag = "employees"
)]
pub async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<EmployeeResponse> {
    match state.services.employees.get_employee(id).await? {
        Some(employee) => Ok(Json(ApiResponse::success(employee))),
        None => Err(ServiceError::NotFound(format!(
            "Employee {} not found",
            id
        ))),
    }
}

/// Create an employee and its login identity in one transaction
#[utoipa::path(
    post,
    path = "/api/v1/employees",
    request_body = CreateEmployeeRequest,
    responses(
        (status = 200, description = "Employee created", body = ApiResponse<EmployeeResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Username already taken", body = crate::errors::ErrorResponse)
    ),
    tag = "employees"
)]
pub async fn create_employee(
    State(state): State<AppState>,
    _principal: Principal,
    Json(payload): Json<CreateEmployeeRequest>,
) -> ApiResult<EmployeeResponse> {
    let employee = state.services.employees.create_employee(payload).await?;
    Ok(Json(ApiResponse::success(employee)))
}

/// Delete an employee and its backing user
#[utoipa::path(
    delete,
    path = "/api/v1/employees/:id",
    params(("id" = Uuid, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Employee not found", body = crate::errors::ErrorResponse)
    ),
    tag = "employees"
)]
pub async fn delete_employee(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    state.services.employees.delete_employee(id).await?;
    Ok(Json(ApiResponse::success(serde_json::json!({
        "deleted": id
    }))))
}
