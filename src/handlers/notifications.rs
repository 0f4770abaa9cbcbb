use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::handlers::common::{pagination, Principal};
use crate::services::notifications::{
    CreateNotificationRequest, NotificationListResponse, NotificationResponse,
};
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NotificationListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    #[serde(default)]
    pub unread_only: bool,
}

/// List stored notifications
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    params(NotificationListQuery),
    responses(
        (status = 200, description = "Notifications listed", body = ApiResponse<NotificationListResponse>)
    ),
    tag = "notifications"
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationListQuery>,
) -> ApiResult<NotificationListResponse> {
    let (page, limit) = pagination(query.page, query.limit);
    let notifications = state
        .services
        .notifications
        .list_notifications(page, limit, query.unread_only)
        .await?;
    Ok(Json(ApiResponse::success(notifications)))
}

/// Store a notification for the dashboard
#[utoipa::path(
    post,
    path = "/api/v1/notifications",
    request_body = CreateNotificationRequest,
    responses(
        (status = 200, description = "Notification stored", body = ApiResponse<NotificationResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "notifications"
)]
pub async fn create_notification(
    State(state): State<AppState>,
    _principal: Principal,
    Json(payload): Json<CreateNotificationRequest>,
) -> ApiResult<NotificationResponse> {
    let notification = state
        .services
        .notifications
        .create_notification(payload)
        .await?;
    Ok(Json(ApiResponse::success(notification)))
}

/// Mark a notification as read
#[utoipa::path(
    post,
    path = "/api/v1/notifications/:id/read",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification marked read", body = ApiResponse<NotificationResponse>),
        (status = 404, description = "Notification not found", body = crate::errors::ErrorResponse)
    ),
    tag = "notifications"
)]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<NotificationResponse> {
    let notification = state.services.notifications.mark_read(id).await?;
    Ok(Json(ApiResponse::success(notification)))
}

/// Delete a notification
#[utoipa::path(
    delete,
    path = "/api/v1/notifications/:id",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Notification not found", body = crate::errors::ErrorResponse)
    ),
    tag = "notifications"
)]
pub async fn delete_notification(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    state.services.notifications.delete_notification(id).await?;
    Ok(Json(ApiResponse::success(serde_json::json!({
        "deleted": id
    }))))
}
