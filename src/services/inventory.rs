use crate::{
    db::DbPool,
    entities::attribute_set::AttributeSet,
    entities::inventory_batch::{self, Entity as BatchEntity},
    entities::inventory_item::{self, Entity as ItemEntity, Model as ItemModel},
    entities::inventory_variant::{self, Entity as VariantEntity, Model as VariantModel},
    entities::product_category::Entity as CategoryEntity,
    entities::supplier::Entity as SupplierEntity,
    errors::ServiceError,
    events::{Event, EventSender},
    services::variants::validate_attribute_set,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Request/Response types for the inventory service
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateItemRequest {
    #[validate(length(min = 1, message = "Item name is required"))]
    pub name: String,
    pub category_id: Uuid,
    pub supplier_id: Uuid,
    /// Attribute combinations for a variant item; empty for a plain item.
    #[serde(default)]
    pub variants: Vec<AttributeSet>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ImportBatchRequest {
    #[validate(length(min = 1, message = "Batch number is required"))]
    pub batch_number: String,
    pub batch_date: Option<DateTime<Utc>>,
    pub note: Option<String>,
    #[validate(length(min = 1, message = "At least one batch line is required"))]
    pub lines: Vec<BatchLine>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BatchLine {
    /// Required for variant items, forbidden for plain items.
    pub attributes: Option<AttributeSet>,
    pub quantity: i32,
    pub unit_cost: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VariantResponse {
    pub id: Uuid,
    pub attributes: AttributeSet,
    pub quantity: i32,
    pub average_unit_cost: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemResponse {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub category_id: Uuid,
    pub supplier_id: Uuid,
    pub has_variants: bool,
    pub quantity: i32,
    pub cost_total: Decimal,
    pub average_unit_cost: Decimal,
    pub available: bool,
    pub variants: Vec<VariantResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemListResponse {
    pub items: Vec<ItemResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BatchResponse {
    pub id: Uuid,
    pub batch_number: String,
    pub batch_date: DateTime<Utc>,
    pub quantity: i32,
    pub unit_cost: Decimal,
    pub note: Option<String>,
    pub received_by: String,
}

/// Service for managing stocked items and batch imports.
///
/// Aggregate columns (`quantity`, `cost_total`) are only ever changed through
/// additive `UPDATE` expressions inside a transaction, so concurrent imports
/// cannot lose each other's contribution and the average unit cost
/// (`cost_total / quantity`) never drifts from the batch history.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a new stocked item with a generated `MDxx` code.
    #[instrument(skip(self, request), fields(name = %request.name, actor = %actor))]
    pub async fn create_item(
        &self,
        request: CreateItemRequest,
        actor: &str,
    ) -> Result<ItemResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let now = Utc::now();
        let item_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for item creation");
            ServiceError::DatabaseError(e)
        })?;

        if CategoryEntity::find_by_id(request.category_id)
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(ServiceError::ValidationError(format!(
                "Item references an unknown category ({})",
                request.category_id
            )));
        }
        if SupplierEntity::find_by_id(request.supplier_id)
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(ServiceError::ValidationError(format!(
                "Item references an unknown supplier ({})",
                request.supplier_id
            )));
        }

        for (idx, attrs) in request.variants.iter().enumerate() {
            if attrs.is_empty() {
                return Err(ServiceError::ValidationError(
                    "Variant attribute combinations must not be empty".to_string(),
                ));
            }
            validate_attribute_set(&txn, attrs).await?;
            if request.variants[..idx].contains(attrs) {
                return Err(ServiceError::InvalidOperation(format!(
                    "Duplicate variant combination ({})",
                    attrs.canonical_string()
                )));
            }
        }

        let code = next_item_code(&txn).await?;
        let has_variants = !request.variants.is_empty();

        let item = inventory_item::ActiveModel {
            id: Set(item_id),
            name: Set(request.name.clone()),
            code: Set(code),
            category_id: Set(request.category_id),
            supplier_id: Set(request.supplier_id),
            has_variants: Set(has_variants),
            quantity: Set(0),
            cost_total: Set(Decimal::ZERO),
            created_by: Set(actor.to_string()),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            version: Set(1),
        };
        let item_model = item.insert(&txn).await.map_err(|e| {
            error!(error = %e, item_id = %item_id, "Failed to create inventory item");
            ServiceError::DatabaseError(e)
        })?;

        let mut variant_models = Vec::with_capacity(request.variants.len());
        for attrs in request.variants {
            let variant = inventory_variant::ActiveModel {
                id: Set(Uuid::new_v4()),
                item_id: Set(item_id),
                attributes: Set(attrs),
                quantity: Set(0),
                cost_total: Set(Decimal::ZERO),
                created_at: Set(now),
                updated_at: Set(Some(now)),
            };
            variant_models.push(variant.insert(&txn).await?);
        }

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(item_id = %item_id, code = %item_model.code, "Inventory item created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::InventoryItemCreated(item_id)).await {
                warn!(error = %e, item_id = %item_id, "Failed to send item created event");
            }
        }

        Ok(item_to_response(item_model, variant_models))
    }

    /// Merges a received batch into an item: summed quantities, additive cost
    /// totals, and one immutable batch record. Duplicate batch numbers and
    /// non-positive quantities or costs are rejected before any write.
    #[instrument(skip(self, request), fields(item_id = %item_id, batch_number = %request.batch_number, actor = %actor))]
    pub async fn import_batch(
        &self,
        item_id: Uuid,
        request: ImportBatchRequest,
        actor: &str,
    ) -> Result<ItemResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        for line in &request.lines {
            if line.quantity <= 0 {
                return Err(ServiceError::ValidationError(
                    "Batch quantity must be a positive number".to_string(),
                ));
            }
            if line.unit_cost <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Batch unit cost must be a positive number".to_string(),
                ));
            }
        }

        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for batch import");
            ServiceError::DatabaseError(e)
        })?;

        let item = ItemEntity::find_by_id(item_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Inventory item {} not found", item_id)))?;

        let duplicate = BatchEntity::find()
            .filter(inventory_batch::Column::ItemId.eq(item_id))
            .filter(inventory_batch::Column::BatchNumber.eq(request.batch_number.clone()))
            .count(&txn)
            .await?;
        if duplicate > 0 {
            return Err(ServiceError::InvalidOperation(format!(
                "Batch number {} already recorded for item {}",
                request.batch_number, item.code
            )));
        }

        if item.has_variants {
            self.apply_variant_lines(&txn, &item, &request.lines, now)
                .await?;
        } else {
            if request.lines.len() != 1 {
                return Err(ServiceError::InvalidInput(
                    "A plain item batch must have exactly one line".to_string(),
                ));
            }
            if request.lines[0]
                .attributes
                .as_ref()
                .is_some_and(|a| !a.is_empty())
            {
                return Err(ServiceError::InvalidInput(format!(
                    "Item {} does not have variants",
                    item.code
                )));
            }
        }

        let batch_quantity: i32 = request.lines.iter().map(|l| l.quantity).sum();
        let batch_cost: Decimal = request
            .lines
            .iter()
            .map(|l| l.unit_cost * Decimal::from(l.quantity))
            .sum();

        // Additive aggregate update; the average stays derivable from the sums.
        ItemEntity::update_many()
            .col_expr(
                inventory_item::Column::Quantity,
                Expr::col(inventory_item::Column::Quantity).add(batch_quantity),
            )
            .col_expr(
                inventory_item::Column::CostTotal,
                Expr::col(inventory_item::Column::CostTotal).add(batch_cost),
            )
            .col_expr(inventory_item::Column::UpdatedAt, Expr::value(now))
            .col_expr(
                inventory_item::Column::Version,
                Expr::col(inventory_item::Column::Version).add(1),
            )
            .filter(inventory_item::Column::Id.eq(item_id))
            .exec(&txn)
            .await?;

        let batch = inventory_batch::ActiveModel {
            id: Set(Uuid::new_v4()),
            item_id: Set(item_id),
            batch_number: Set(request.batch_number.clone()),
            batch_date: Set(request.batch_date.unwrap_or(now)),
            quantity: Set(batch_quantity),
            unit_cost: Set(batch_cost / Decimal::from(batch_quantity)),
            note: Set(request.note.clone()),
            received_by: Set(actor.to_string()),
            created_at: Set(now),
        };
        batch.insert(&txn).await.map_err(|e| {
            error!(error = %e, item_id = %item_id, "Failed to record batch");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(
            item_id = %item_id,
            batch_number = %request.batch_number,
            quantity = batch_quantity,
            "Batch imported"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::InventoryBatchImported {
                    item_id,
                    batch_number: request.batch_number.clone(),
                    quantity: batch_quantity,
                })
                .await
            {
                warn!(error = %e, item_id = %item_id, "Failed to send batch imported event");
            }
        }

        self.get_item(item_id)
            .await?
            .ok_or_else(|| ServiceError::InternalError("Imported item disappeared".to_string()))
    }

    /// Matches each variant line against the existing combinations, applying
    /// the additive update on a match and appending a new combination
    /// otherwise.
    async fn apply_variant_lines(
        &self,
        txn: &DatabaseTransaction,
        item: &ItemModel,
        lines: &[BatchLine],
        now: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        let existing = VariantEntity::find()
            .filter(inventory_variant::Column::ItemId.eq(item.id))
            .all(txn)
            .await?;

        for line in lines {
            let attrs = match &line.attributes {
                Some(attrs) if !attrs.is_empty() => attrs,
                _ => {
                    return Err(ServiceError::InvalidInput(format!(
                        "Item {} has variants; every batch line needs attributes",
                        item.code
                    )))
                }
            };
            validate_attribute_set(txn, attrs).await?;

            let line_cost = line.unit_cost * Decimal::from(line.quantity);
            match existing.iter().find(|v| &v.attributes == attrs) {
                Some(variant) => {
                    VariantEntity::update_many()
                        .col_expr(
                            inventory_variant::Column::Quantity,
                            Expr::col(inventory_variant::Column::Quantity).add(line.quantity),
                        )
                        .col_expr(
                            inventory_variant::Column::CostTotal,
                            Expr::col(inventory_variant::Column::CostTotal).add(line_cost),
                        )
                        .col_expr(inventory_variant::Column::UpdatedAt, Expr::value(now))
                        .filter(inventory_variant::Column::Id.eq(variant.id))
                        .exec(txn)
                        .await?;
                }
                None => {
                    let variant = inventory_variant::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        item_id: Set(item.id),
                        attributes: Set(attrs.clone()),
                        quantity: Set(line.quantity),
                        cost_total: Set(line_cost),
                        created_at: Set(now),
                        updated_at: Set(Some(now)),
                    };
                    variant.insert(txn).await?;
                }
            }
        }

        Ok(())
    }

    /// Retrieves an item with its variant breakdown.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn get_item(&self, item_id: Uuid) -> Result<Option<ItemResponse>, ServiceError> {
        let db = &*self.db_pool;

        let item = ItemEntity::find_by_id(item_id).one(db).await?;
        match item {
            Some(item) => {
                let variants = VariantEntity::find()
                    .filter(inventory_variant::Column::ItemId.eq(item_id))
                    .all(db)
                    .await?;
                Ok(Some(item_to_response(item, variants)))
            }
            None => Ok(None),
        }
    }

    /// Lists items with pagination.
    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<ItemListResponse, ServiceError> {
        let db = &*self.db_pool;

        let paginator = ItemEntity::find()
            .order_by_desc(inventory_item::Column::CreatedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count inventory items");
            ServiceError::DatabaseError(e)
        })?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        let mut responses = Vec::with_capacity(items.len());
        for item in items {
            let variants = if item.has_variants {
                VariantEntity::find()
                    .filter(inventory_variant::Column::ItemId.eq(item.id))
                    .all(db)
                    .await?
            } else {
                Vec::new()
            };
            responses.push(item_to_response(item, variants));
        }

        Ok(ItemListResponse {
            items: responses,
            total,
            page,
            per_page,
        })
    }

    /// Lists the batch history of an item, newest first.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn list_batches(&self, item_id: Uuid) -> Result<Vec<BatchResponse>, ServiceError> {
        let db = &*self.db_pool;

        if ItemEntity::find_by_id(item_id).one(db).await?.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Inventory item {} not found",
                item_id
            )));
        }

        let batches = BatchEntity::find()
            .filter(inventory_batch::Column::ItemId.eq(item_id))
            .order_by_desc(inventory_batch::Column::CreatedAt)
            .all(db)
            .await?;

        Ok(batches
            .into_iter()
            .map(|b| BatchResponse {
                id: b.id,
                batch_number: b.batch_number,
                batch_date: b.batch_date,
                quantity: b.quantity,
                unit_cost: b.unit_cost,
                note: b.note,
                received_by: b.received_by,
            })
            .collect())
    }

    /// Deletes an item together with its variants and batch history.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn delete_item(&self, item_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        if ItemEntity::find_by_id(item_id).one(&txn).await?.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Inventory item {} not found",
                item_id
            )));
        }

        BatchEntity::delete_many()
            .filter(inventory_batch::Column::ItemId.eq(item_id))
            .exec(&txn)
            .await?;
        VariantEntity::delete_many()
            .filter(inventory_variant::Column::ItemId.eq(item_id))
            .exec(&txn)
            .await?;
        ItemEntity::delete_by_id(item_id).exec(&txn).await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(item_id = %item_id, "Inventory item deleted");
        Ok(())
    }
}

/// Decrements stock for an order line inside the caller's transaction,
/// returning the average unit cost snapshot used for the decrement. The
/// update is guarded by a `quantity >= n` filter so a concurrent decrement
/// cannot drive stock negative.
pub(crate) async fn decrement_stock(
    txn: &DatabaseTransaction,
    item: &ItemModel,
    variant: Option<&VariantModel>,
    quantity: i32,
) -> Result<Decimal, ServiceError> {
    let unit_cost = match variant {
        Some(v) => v.average_unit_cost(),
        None => item.average_unit_cost(),
    };
    let cost_delta = unit_cost * Decimal::from(quantity);

    if let Some(variant) = variant {
        let result = VariantEntity::update_many()
            .col_expr(
                inventory_variant::Column::Quantity,
                Expr::col(inventory_variant::Column::Quantity).sub(quantity),
            )
            .col_expr(
                inventory_variant::Column::CostTotal,
                Expr::col(inventory_variant::Column::CostTotal).sub(cost_delta),
            )
            .filter(inventory_variant::Column::Id.eq(variant.id))
            .filter(inventory_variant::Column::Quantity.gte(quantity))
            .exec(txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::InsufficientStock(format!(
                "Not enough stock for item {} ({})",
                item.code,
                variant.attributes.canonical_string()
            )));
        }
    }

    let result = ItemEntity::update_many()
        .col_expr(
            inventory_item::Column::Quantity,
            Expr::col(inventory_item::Column::Quantity).sub(quantity),
        )
        .col_expr(
            inventory_item::Column::CostTotal,
            Expr::col(inventory_item::Column::CostTotal).sub(cost_delta),
        )
        .col_expr(
            inventory_item::Column::Version,
            Expr::col(inventory_item::Column::Version).add(1),
        )
        .filter(inventory_item::Column::Id.eq(item.id))
        .filter(inventory_item::Column::Quantity.gte(quantity))
        .exec(txn)
        .await?;
    if result.rows_affected == 0 {
        return Err(ServiceError::InsufficientStock(format!(
            "Not enough stock for item {}",
            item.code
        )));
    }

    Ok(unit_cost)
}

/// Restores stock removed by an order line, symmetric to `decrement_stock`
/// via the cost snapshot taken at decrement time.
pub(crate) async fn restore_stock(
    txn: &DatabaseTransaction,
    item_id: Uuid,
    variant_id: Option<Uuid>,
    quantity: i32,
    unit_cost: Decimal,
) -> Result<(), ServiceError> {
    let cost_delta = unit_cost * Decimal::from(quantity);

    if let Some(variant_id) = variant_id {
        VariantEntity::update_many()
            .col_expr(
                inventory_variant::Column::Quantity,
                Expr::col(inventory_variant::Column::Quantity).add(quantity),
            )
            .col_expr(
                inventory_variant::Column::CostTotal,
                Expr::col(inventory_variant::Column::CostTotal).add(cost_delta),
            )
            .filter(inventory_variant::Column::Id.eq(variant_id))
            .exec(txn)
            .await?;
    }

    ItemEntity::update_many()
        .col_expr(
            inventory_item::Column::Quantity,
            Expr::col(inventory_item::Column::Quantity).add(quantity),
        )
        .col_expr(
            inventory_item::Column::CostTotal,
            Expr::col(inventory_item::Column::CostTotal).add(cost_delta),
        )
        .col_expr(
            inventory_item::Column::Version,
            Expr::col(inventory_item::Column::Version).add(1),
        )
        .filter(inventory_item::Column::Id.eq(item_id))
        .exec(txn)
        .await?;

    Ok(())
}

/// Generates the next `MDxx` item code from the highest existing suffix.
/// The unique index on `code` turns a concurrent-create collision into a
/// conflict instead of a silent duplicate.
async fn next_item_code<C: ConnectionTrait>(conn: &C) -> Result<String, ServiceError> {
    let codes: Vec<String> = ItemEntity::find()
        .select_only()
        .column(inventory_item::Column::Code)
        .into_tuple()
        .all(conn)
        .await?;

    let max = codes
        .iter()
        .filter_map(|c| c.strip_prefix("MD").and_then(|n| n.parse::<u32>().ok()))
        .max()
        .unwrap_or(0);

    Ok(format!("MD{:02}", max + 1))
}

fn item_to_response(item: ItemModel, variants: Vec<VariantModel>) -> ItemResponse {
    let average_unit_cost = item.average_unit_cost();
    let available = item.is_available();
    ItemResponse {
        id: item.id,
        name: item.name,
        code: item.code,
        category_id: item.category_id,
        supplier_id: item.supplier_id,
        has_variants: item.has_variants,
        quantity: item.quantity,
        cost_total: item.cost_total,
        average_unit_cost,
        available,
        variants: variants
            .into_iter()
            .map(|v| VariantResponse {
                id: v.id,
                average_unit_cost: v.average_unit_cost(),
                attributes: v.attributes,
                quantity: v.quantity,
            })
            .collect(),
        created_at: item.created_at,
        updated_at: item.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item_with(quantity: i32, cost_total: Decimal) -> ItemModel {
        ItemModel {
            id: Uuid::new_v4(),
            name: "Widget".to_string(),
            code: "MD01".to_string(),
            category_id: Uuid::new_v4(),
            supplier_id: Uuid::new_v4(),
            has_variants: false,
            quantity,
            cost_total,
            created_by: "tester".to_string(),
            created_at: Utc::now(),
            updated_at: None,
            version: 1,
        }
    }

    #[test]
    fn average_unit_cost_is_weighted_mean_of_batches() {
        // Two batches of 10 @ 100 and 10 @ 200 leave an average of 150.
        let item = item_with(20, dec!(100) * dec!(10) + dec!(200) * dec!(10));
        assert_eq!(item.quantity, 20);
        assert_eq!(item.average_unit_cost(), dec!(150));
    }

    #[test]
    fn empty_item_has_zero_average_and_is_unavailable() {
        let item = item_with(0, Decimal::ZERO);
        assert_eq!(item.average_unit_cost(), Decimal::ZERO);
        assert!(!item.is_available());
    }

    #[test]
    fn availability_follows_quantity() {
        assert!(item_with(1, dec!(5)).is_available());
        assert!(!item_with(0, Decimal::ZERO).is_available());
    }

    #[test]
    fn item_codes_continue_from_highest_suffix() {
        let codes = ["MD01", "MD07", "MD03"];
        let max = codes
            .iter()
            .filter_map(|c| c.strip_prefix("MD").and_then(|n| n.parse::<u32>().ok()))
            .max()
            .unwrap_or(0);
        assert_eq!(format!("MD{:02}", max + 1), "MD08");
    }

    #[test]
    fn item_response_exposes_derived_fields() {
        let item = item_with(4, dec!(100));
        let response = item_to_response(item, Vec::new());
        assert_eq!(response.average_unit_cost, dec!(25));
        assert!(response.available);
        assert!(response.variants.is_empty());
    }
}
