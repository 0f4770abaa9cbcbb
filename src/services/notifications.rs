use crate::{
    db::DbPool,
    entities::notification::{self, Entity as NotificationEntity, Model as NotificationModel},
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateNotificationRequest {
    #[validate(length(min = 1, message = "Notification title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Notification body is required"))]
    pub body: String,
    #[validate(length(min = 1, message = "Recipient role is required"))]
    pub recipient_role: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub recipient_role: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Stores dashboard notifications; delivery channels are out of scope.
#[derive(Clone)]
pub struct NotificationService {
    db_pool: Arc<DbPool>,
}

impl NotificationService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, request), fields(title = %request.title))]
    pub async fn create_notification(
        &self,
        request: CreateNotificationRequest,
    ) -> Result<NotificationResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let notification_id = Uuid::new_v4();

        let notification = notification::ActiveModel {
            id: Set(notification_id),
            title: Set(request.title.clone()),
            body: Set(request.body.clone()),
            recipient_role: Set(request.recipient_role.clone()),
            is_read: Set(false),
            created_at: Set(Utc::now()),
        };
        let model = notification.insert(db).await?;

        info!(notification_id = %notification_id, "Notification stored");
        Ok(model_to_response(model))
    }

    #[instrument(skip(self))]
    pub async fn list_notifications(
        &self,
        page: u64,
        per_page: u64,
        unread_only: bool,
    ) -> Result<NotificationListResponse, ServiceError> {
        let db = &*self.db_pool;

        let mut query = NotificationEntity::find().order_by_desc(notification::Column::CreatedAt);
        if unread_only {
            query = query.filter(notification::Column::IsRead.eq(false));
        }
        let paginator = query.paginate(db, per_page);
        let total = paginator.num_items().await?;
        let notifications = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(NotificationListResponse {
            notifications: notifications.into_iter().map(model_to_response).collect(),
            total,
            page,
            per_page,
        })
    }

    #[instrument(skip(self), fields(notification_id = %notification_id))]
    pub async fn mark_read(
        &self,
        notification_id: Uuid,
    ) -> Result<NotificationResponse, ServiceError> {
        let db = &*self.db_pool;

        let notification = NotificationEntity::find_by_id(notification_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Notification {} not found", notification_id))
            })?;

        let mut active: notification::ActiveModel = notification.into();
        active.is_read = Set(true);
        let updated = active.update(db).await?;

        Ok(model_to_response(updated))
    }

    #[instrument(skip(self), fields(notification_id = %notification_id))]
    pub async fn delete_notification(&self, notification_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let result = NotificationEntity::delete_by_id(notification_id)
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Notification {} not found",
                notification_id
            )));
        }
        Ok(())
    }
}

fn model_to_response(model: NotificationModel) -> NotificationResponse {
    NotificationResponse {
        id: model.id,
        title: model.title,
        body: model.body,
        recipient_role: model.recipient_role,
        is_read: model.is_read,
        created_at: model.created_at,
    }
}
