use crate::{
    db::DbPool,
    entities::promotion::{self, Entity as PromotionEntity, Model as PromotionModel, PromotionStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePromotionRequest {
    #[validate(length(min = 1, message = "Promotion name is required"))]
    pub name: String,
    pub discount_percent: Decimal,
    pub min_order_value: Decimal,
    pub max_discount: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PromotionResponse {
    pub id: Uuid,
    pub name: String,
    pub discount_percent: Decimal,
    pub min_order_value: Decimal,
    pub max_discount: Decimal,
    pub status: PromotionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PromotionListResponse {
    pub promotions: Vec<PromotionResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Computes the discount a promotion grants on an order total:
/// `min(total × percent, max_discount)`, refused outside the active window
/// or below the minimum order value.
pub fn compute_discount(
    promotion: &PromotionModel,
    total: Decimal,
    now: DateTime<Utc>,
) -> Result<Decimal, ServiceError> {
    if promotion.status_at(now) != PromotionStatus::Active {
        return Err(ServiceError::InvalidOperation(format!(
            "Promotion {} is not active",
            promotion.name
        )));
    }
    if total < promotion.min_order_value {
        return Err(ServiceError::InvalidOperation(format!(
            "Order total {} is below the minimum order value {} for promotion {}",
            total, promotion.min_order_value, promotion.name
        )));
    }

    let discount = total * promotion.discount_percent / Decimal::from(100);
    Ok(discount.min(promotion.max_discount).min(total))
}

/// Service for managing promotions.
#[derive(Clone)]
pub struct PromotionService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl PromotionService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_promotion(
        &self,
        request: CreatePromotionRequest,
    ) -> Result<PromotionResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        validate_promotion_bounds(&request)?;

        let db = &*self.db_pool;
        let now = Utc::now();
        let promotion_id = Uuid::new_v4();

        let promotion = promotion::ActiveModel {
            id: Set(promotion_id),
            name: Set(request.name.clone()),
            discount_percent: Set(request.discount_percent),
            min_order_value: Set(request.min_order_value),
            max_discount: Set(request.max_discount),
            start_date: Set(request.start_date),
            end_date: Set(request.end_date),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };
        let model = promotion.insert(db).await?;

        info!(promotion_id = %promotion_id, "Promotion created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::PromotionCreated(promotion_id)).await {
                warn!(error = %e, promotion_id = %promotion_id, "Failed to send promotion event");
            }
        }

        Ok(model_to_response(model, now))
    }

    #[instrument(skip(self), fields(promotion_id = %promotion_id))]
    pub async fn get_promotion(
        &self,
        promotion_id: Uuid,
    ) -> Result<Option<PromotionResponse>, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();
        Ok(PromotionEntity::find_by_id(promotion_id)
            .one(db)
            .await?
            .map(|m| model_to_response(m, now)))
    }

    #[instrument(skip(self))]
    pub async fn list_promotions(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<PromotionListResponse, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();

        let paginator = PromotionEntity::find()
            .order_by_desc(promotion::Column::CreatedAt)
            .paginate(db, per_page);
        let total = paginator.num_items().await?;
        let promotions = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(PromotionListResponse {
            promotions: promotions
                .into_iter()
                .map(|m| model_to_response(m, now))
                .collect(),
            total,
            page,
            per_page,
        })
    }

    /// Previews the discount a promotion would grant on a given total.
    #[instrument(skip(self), fields(promotion_id = %promotion_id, total = %total))]
    pub async fn preview_discount(
        &self,
        promotion_id: Uuid,
        total: Decimal,
    ) -> Result<Decimal, ServiceError> {
        let db = &*self.db_pool;
        let promotion = PromotionEntity::find_by_id(promotion_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Promotion {} not found", promotion_id))
            })?;
        compute_discount(&promotion, total, Utc::now())
    }

    #[instrument(skip(self), fields(promotion_id = %promotion_id))]
    pub async fn delete_promotion(&self, promotion_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let result = PromotionEntity::delete_by_id(promotion_id).exec(db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Promotion {} not found",
                promotion_id
            )));
        }
        info!(promotion_id = %promotion_id, "Promotion deleted");
        Ok(())
    }
}

fn validate_promotion_bounds(request: &CreatePromotionRequest) -> Result<(), ServiceError> {
    if request.discount_percent <= Decimal::ZERO || request.discount_percent > Decimal::from(100) {
        return Err(ServiceError::ValidationError(
            "Discount percent must be between 0 and 100".to_string(),
        ));
    }
    if request.min_order_value < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Minimum order value must not be negative".to_string(),
        ));
    }
    if request.max_discount <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Maximum discount must be a positive number".to_string(),
        ));
    }
    if request.end_date <= request.start_date {
        return Err(ServiceError::ValidationError(
            "Promotion end date must be after the start date".to_string(),
        ));
    }
    Ok(())
}

fn model_to_response(model: PromotionModel, now: DateTime<Utc>) -> PromotionResponse {
    PromotionResponse {
        id: model.id,
        status: model.status_at(now),
        name: model.name,
        discount_percent: model.discount_percent,
        min_order_value: model.min_order_value,
        max_discount: model.max_discount,
        start_date: model.start_date,
        end_date: model.end_date,
        created_at: model.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn promotion(
        percent: Decimal,
        min_order_value: Decimal,
        max_discount: Decimal,
    ) -> PromotionModel {
        let now = Utc::now();
        PromotionModel {
            id: Uuid::new_v4(),
            name: "Tet Sale".to_string(),
            discount_percent: percent,
            min_order_value,
            max_discount,
            start_date: now - Duration::days(1),
            end_date: now + Duration::days(1),
            created_at: now,
            updated_at: None,
        }
    }

    #[test]
    fn discount_is_capped_at_max_discount() {
        // 10% of 500_000 is 50_000, capped at 40_000.
        let promo = promotion(dec!(10), dec!(0), dec!(40000));
        let discount = compute_discount(&promo, dec!(500000), Utc::now()).unwrap();
        assert_eq!(discount, dec!(40000));
    }

    #[test]
    fn discount_below_cap_is_the_plain_percentage() {
        let promo = promotion(dec!(10), dec!(0), dec!(100000));
        let discount = compute_discount(&promo, dec!(500000), Utc::now()).unwrap();
        assert_eq!(discount, dec!(50000));
    }

    #[test]
    fn totals_below_the_minimum_are_refused() {
        let promo = promotion(dec!(10), dec!(200000), dec!(40000));
        let err = compute_discount(&promo, dec!(150000), Utc::now()).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidOperation(_)));
    }

    #[test]
    fn promotions_outside_their_window_are_refused() {
        let now = Utc::now();
        let mut promo = promotion(dec!(10), dec!(0), dec!(40000));
        promo.start_date = now + Duration::days(1);
        promo.end_date = now + Duration::days(2);
        assert_eq!(promo.status_at(now), PromotionStatus::Upcoming);
        assert!(compute_discount(&promo, dec!(500000), now).is_err());

        promo.start_date = now - Duration::days(2);
        promo.end_date = now - Duration::days(1);
        assert_eq!(promo.status_at(now), PromotionStatus::Expired);
        assert!(compute_discount(&promo, dec!(500000), now).is_err());
    }

    #[test]
    fn discount_never_exceeds_the_total() {
        let promo = promotion(dec!(100), dec!(0), dec!(1000000));
        let discount = compute_discount(&promo, dec!(5000), Utc::now()).unwrap();
        assert_eq!(discount, dec!(5000));
    }
}
