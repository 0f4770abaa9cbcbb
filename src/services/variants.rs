use crate::{
    db::DbPool,
    entities::attribute_set::{AttributeSet, AttributeValues},
    entities::inventory_variant::Entity as InventoryVariantEntity,
    entities::variant_attribute::{
        self, Entity as VariantAttributeEntity, Model as VariantAttributeModel,
    },
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateAttributeRequest {
    #[validate(length(min = 1, message = "Attribute name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "At least one allowed value is required"))]
    pub values: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateAttributeRequest {
    #[validate(length(min = 1, message = "At least one allowed value is required"))]
    pub values: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AttributeResponse {
    pub id: Uuid,
    pub name: String,
    pub values: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Checks an attribute combination against the registered definitions: every
/// key must be a defined attribute and every value must belong to its
/// allowed set.
pub(crate) async fn validate_attribute_set<C: ConnectionTrait>(
    conn: &C,
    attrs: &AttributeSet,
) -> Result<(), ServiceError> {
    for (key, value) in attrs.iter() {
        let definition = VariantAttributeEntity::find()
            .filter(variant_attribute::Column::Name.eq(key.clone()))
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!("Unknown variant attribute '{}'", key))
            })?;
        if !definition.values.contains(value) {
            return Err(ServiceError::ValidationError(format!(
                "Value '{}' is not allowed for attribute '{}'",
                value, key
            )));
        }
    }
    Ok(())
}

/// Service for managing variant attribute definitions.
#[derive(Clone)]
pub struct VariantService {
    db_pool: Arc<DbPool>,
}

impl VariantService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_attribute(
        &self,
        request: CreateAttributeRequest,
    ) -> Result<AttributeResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        let values = normalize_values(request.values)?;

        let db = &*self.db_pool;
        let now = Utc::now();
        let attribute_id = Uuid::new_v4();

        let existing = VariantAttributeEntity::find()
            .filter(variant_attribute::Column::Name.eq(request.name.clone()))
            .count(db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        if existing > 0 {
            return Err(ServiceError::Conflict(format!(
                "Attribute '{}' already exists",
                request.name
            )));
        }

        let attribute = variant_attribute::ActiveModel {
            id: Set(attribute_id),
            name: Set(request.name.clone()),
            values: Set(AttributeValues(values)),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };
        let model = attribute.insert(db).await?;

        info!(attribute_id = %attribute_id, name = %model.name, "Variant attribute created");
        Ok(model_to_response(model))
    }

    #[instrument(skip(self, request), fields(attribute_id = %attribute_id))]
    pub async fn update_attribute(
        &self,
        attribute_id: Uuid,
        request: UpdateAttributeRequest,
    ) -> Result<AttributeResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        let values = normalize_values(request.values)?;

        let db = &*self.db_pool;
        let now = Utc::now();

        let attribute = VariantAttributeEntity::find_by_id(attribute_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Variant attribute {} not found", attribute_id))
            })?;

        let mut active: variant_attribute::ActiveModel = attribute.into();
        active.values = Set(AttributeValues(values));
        active.updated_at = Set(Some(now));
        let updated = active.update(db).await?;

        info!(attribute_id = %attribute_id, "Variant attribute updated");
        Ok(model_to_response(updated))
    }

    #[instrument(skip(self))]
    pub async fn list_attributes(&self) -> Result<Vec<AttributeResponse>, ServiceError> {
        let db = &*self.db_pool;
        let attributes = VariantAttributeEntity::find()
            .order_by_asc(variant_attribute::Column::Name)
            .all(db)
            .await?;
        Ok(attributes.into_iter().map(model_to_response).collect())
    }

    #[instrument(skip(self), fields(attribute_id = %attribute_id))]
    pub async fn get_attribute(
        &self,
        attribute_id: Uuid,
    ) -> Result<Option<AttributeResponse>, ServiceError> {
        let db = &*self.db_pool;
        Ok(VariantAttributeEntity::find_by_id(attribute_id)
            .one(db)
            .await?
            .map(model_to_response))
    }

    /// Deletes an attribute definition. Rejected while any inventory variant
    /// still uses the attribute in its combination.
    #[instrument(skip(self), fields(attribute_id = %attribute_id))]
    pub async fn delete_attribute(&self, attribute_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let attribute = VariantAttributeEntity::find_by_id(attribute_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Variant attribute {} not found", attribute_id))
            })?;

        let variants = InventoryVariantEntity::find().all(db).await?;
        let referencing = variants
            .iter()
            .filter(|v| v.attributes.contains_key(&attribute.name))
            .count();
        if referencing > 0 {
            return Err(ServiceError::InvalidOperation(format!(
                "Attribute '{}' is used by {} variant(s) and cannot be deleted",
                attribute.name, referencing
            )));
        }

        VariantAttributeEntity::delete_by_id(attribute_id)
            .exec(db)
            .await?;

        info!(attribute_id = %attribute_id, name = %attribute.name, "Variant attribute deleted");
        Ok(())
    }
}

/// Trims, rejects empties, and deduplicates while preserving order.
fn normalize_values(values: Vec<String>) -> Result<Vec<String>, ServiceError> {
    let mut normalized: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let trimmed = value.trim().to_string();
        if trimmed.is_empty() {
            return Err(ServiceError::ValidationError(
                "Attribute values must not be empty".to_string(),
            ));
        }
        if !normalized.contains(&trimmed) {
            normalized.push(trimmed);
        }
    }
    Ok(normalized)
}

fn model_to_response(model: VariantAttributeModel) -> AttributeResponse {
    AttributeResponse {
        id: model.id,
        name: model.name,
        values: model.values.0,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_are_trimmed_and_deduplicated() {
        let values = normalize_values(vec![
            " red ".to_string(),
            "blue".to_string(),
            "red".to_string(),
        ])
        .unwrap();
        assert_eq!(values, vec!["red".to_string(), "blue".to_string()]);
    }

    #[test]
    fn empty_values_are_rejected() {
        assert!(normalize_values(vec!["red".to_string(), "  ".to_string()]).is_err());
    }
}
