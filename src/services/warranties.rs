use crate::{
    db::DbPool,
    entities::customer::Entity as CustomerEntity,
    entities::inventory_item::Entity as ItemEntity,
    entities::order::{Entity as OrderEntity, OrderStatus},
    entities::order_item::{self, Entity as OrderItemEntity},
    entities::warranty::{self, Entity as WarrantyEntity, Model as WarrantyModel, WarrantyStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Months, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateWarrantyRequest {
    pub item_id: Uuid,
    /// Coverage length in calendar months.
    #[validate(range(min = 1, max = 120, message = "Warranty period must be 1-120 months"))]
    #[serde(default = "default_period_months")]
    pub period_months: i32,
}

fn default_period_months() -> i32 {
    12
}

/// Activation is keyed by the explicit warranty + order + customer triple.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ActivateWarrantyRequest {
    pub order_id: Uuid,
    pub customer_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WarrantyResponse {
    pub id: Uuid,
    pub warranty_number: String,
    pub item_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    pub status: WarrantyStatus,
    pub period_months: i32,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WarrantyListResponse {
    pub warranties: Vec<WarrantyResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Computes the expiry of a coverage window using calendar months, so a
/// warranty started on Jan 31 ends on Feb 28/29 rather than a fixed day
/// count later.
pub fn coverage_end(
    start: DateTime<Utc>,
    period_months: i32,
) -> Result<DateTime<Utc>, ServiceError> {
    start
        .checked_add_months(Months::new(period_months as u32))
        .ok_or_else(|| {
            ServiceError::InternalError(format!(
                "Coverage period of {} months overflows the calendar",
                period_months
            ))
        })
}

/// Service for managing warranties. A warranty starts product-bound and
/// pending; activation binds the customer and order and stamps the coverage
/// window exactly once.
#[derive(Clone)]
pub struct WarrantyService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl WarrantyService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Registers a pending warranty for a product.
    #[instrument(skip(self, request), fields(item_id = %request.item_id))]
    pub async fn create_warranty(
        &self,
        request: CreateWarrantyRequest,
    ) -> Result<WarrantyResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let now = Utc::now();
        let warranty_id = Uuid::new_v4();

        if ItemEntity::find_by_id(request.item_id)
            .one(db)
            .await?
            .is_none()
        {
            return Err(ServiceError::ValidationError(format!(
                "Warranty references an unknown item ({})",
                request.item_id
            )));
        }

        let warranty = warranty::ActiveModel {
            id: Set(warranty_id),
            warranty_number: Set(generate_warranty_number(warranty_id)),
            item_id: Set(request.item_id),
            customer_id: Set(None),
            order_id: Set(None),
            status: Set(WarrantyStatus::PendingActivation),
            period_months: Set(request.period_months),
            start_date: Set(None),
            end_date: Set(None),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };
        let model = warranty.insert(db).await.map_err(|e| {
            error!(error = %e, warranty_id = %warranty_id, "Failed to create warranty");
            ServiceError::DatabaseError(e)
        })?;

        info!(warranty_id = %warranty_id, "Warranty created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::WarrantyCreated(warranty_id)).await {
                warn!(error = %e, warranty_id = %warranty_id, "Failed to send warranty event");
            }
        }

        Ok(model_to_response(model, now))
    }

    /// Activates a pending warranty against a delivered order of the given
    /// customer, stamping `start_date` and `end_date = start + period`
    /// calendar months. A second activation always fails.
    #[instrument(skip(self, request), fields(warranty_id = %warranty_id, order_id = %request.order_id))]
    pub async fn activate_warranty(
        &self,
        warranty_id: Uuid,
        request: ActivateWarrantyRequest,
    ) -> Result<WarrantyResponse, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let existing = WarrantyEntity::find_by_id(warranty_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Warranty {} not found", warranty_id))
            })?;

        if existing.status != WarrantyStatus::PendingActivation {
            return Err(ServiceError::InvalidOperation(format!(
                "Warranty {} is not pending activation",
                existing.warranty_number
            )));
        }

        if CustomerEntity::find_by_id(request.customer_id)
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(ServiceError::ValidationError(format!(
                "Activation references an unknown customer ({})",
                request.customer_id
            )));
        }

        let order = OrderEntity::find_by_id(request.order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Activation references an unknown order ({})",
                    request.order_id
                ))
            })?;

        if order.customer_id != request.customer_id {
            return Err(ServiceError::ValidationError(format!(
                "Order {} does not belong to customer {}",
                order.order_number, request.customer_id
            )));
        }
        if order.status != OrderStatus::Delivered {
            return Err(ServiceError::InvalidOperation(format!(
                "Order {} must be delivered before warranty activation",
                order.order_number
            )));
        }

        let covers_item = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .filter(order_item::Column::ItemId.eq(existing.item_id))
            .count(&txn)
            .await?;
        if covers_item == 0 {
            return Err(ServiceError::ValidationError(format!(
                "Order {} does not include the warranted item",
                order.order_number
            )));
        }

        let end_date = coverage_end(now, existing.period_months)?;
        let warranty_number = existing.warranty_number.clone();

        let mut active: warranty::ActiveModel = existing.into();
        active.customer_id = Set(Some(request.customer_id));
        active.order_id = Set(Some(request.order_id));
        active.status = Set(WarrantyStatus::Active);
        active.start_date = Set(Some(now));
        active.end_date = Set(Some(end_date));
        active.updated_at = Set(Some(now));
        let updated = active.update(&txn).await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(
            warranty_id = %warranty_id,
            warranty_number = %warranty_number,
            end_date = %end_date,
            "Warranty activated"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::WarrantyActivated {
                    warranty_id,
                    order_id: request.order_id,
                })
                .await
            {
                warn!(error = %e, warranty_id = %warranty_id, "Failed to send activation event");
            }
        }

        Ok(model_to_response(updated, now))
    }

    #[instrument(skip(self), fields(warranty_id = %warranty_id))]
    pub async fn get_warranty(
        &self,
        warranty_id: Uuid,
    ) -> Result<Option<WarrantyResponse>, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();
        Ok(WarrantyEntity::find_by_id(warranty_id)
            .one(db)
            .await?
            .map(|m| model_to_response(m, now)))
    }

    #[instrument(skip(self))]
    pub async fn list_warranties(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<WarrantyListResponse, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();

        let paginator = WarrantyEntity::find()
            .order_by_desc(warranty::Column::CreatedAt)
            .paginate(db, per_page);
        let total = paginator.num_items().await?;
        let warranties = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(WarrantyListResponse {
            warranties: warranties
                .into_iter()
                .map(|m| model_to_response(m, now))
                .collect(),
            total,
            page,
            per_page,
        })
    }

    /// Warranties of one product, for the support view.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn list_warranties_for_item(
        &self,
        item_id: Uuid,
    ) -> Result<Vec<WarrantyResponse>, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();

        let warranties = WarrantyEntity::find()
            .filter(warranty::Column::ItemId.eq(item_id))
            .order_by_desc(warranty::Column::CreatedAt)
            .all(db)
            .await?;

        Ok(warranties
            .into_iter()
            .map(|m| model_to_response(m, now))
            .collect())
    }
}

fn generate_warranty_number(warranty_id: Uuid) -> String {
    let simple = warranty_id.simple().to_string();
    format!("WR-{}", simple[..12].to_ascii_uppercase())
}

/// Maps a stored model to the response shape, deriving `expired` from the
/// end date instead of mutating the row.
fn model_to_response(model: WarrantyModel, now: DateTime<Utc>) -> WarrantyResponse {
    let status = model.effective_status(now);
    WarrantyResponse {
        id: model.id,
        warranty_number: model.warranty_number,
        item_id: model.item_id,
        customer_id: model.customer_id,
        order_id: model.order_id,
        status,
        period_months: model.period_months,
        start_date: model.start_date,
        end_date: model.end_date,
        created_at: model.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn coverage_uses_calendar_months_not_day_counts() {
        let start = Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 0).unwrap();
        let end = coverage_end(start, 1).unwrap();
        // Jan 31 + 1 calendar month clamps to the end of February.
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 2, 28, 12, 0, 0).unwrap());

        let leap_start = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let leap_end = coverage_end(leap_start, 1).unwrap();
        assert_eq!(leap_end, Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap());
    }

    #[test]
    fn twelve_month_coverage_lands_on_the_same_day_next_year() {
        let start = Utc.with_ymd_and_hms(2025, 3, 15, 8, 30, 0).unwrap();
        let end = coverage_end(start, 12).unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 3, 15, 8, 30, 0).unwrap());
    }

    #[test]
    fn effective_status_derives_expiry_on_read() {
        let now = Utc::now();
        let model = WarrantyModel {
            id: Uuid::new_v4(),
            warranty_number: "WR-TEST".to_string(),
            item_id: Uuid::new_v4(),
            customer_id: Some(Uuid::new_v4()),
            order_id: Some(Uuid::new_v4()),
            status: WarrantyStatus::Active,
            period_months: 12,
            start_date: Some(now - chrono::Duration::days(400)),
            end_date: Some(now - chrono::Duration::days(30)),
            created_at: now,
            updated_at: None,
        };
        assert_eq!(model.effective_status(now), WarrantyStatus::Expired);

        let pending = WarrantyModel {
            status: WarrantyStatus::PendingActivation,
            start_date: None,
            end_date: None,
            ..model
        };
        assert_eq!(
            pending.effective_status(now),
            WarrantyStatus::PendingActivation
        );
    }
}
