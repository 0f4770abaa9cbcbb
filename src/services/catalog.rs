use crate::{
    db::DbPool,
    entities::inventory_item::{self, Entity as ItemEntity},
    entities::product_category::{self, Entity as CategoryEntity, Model as CategoryModel},
    entities::supplier::{self, Entity as SupplierEntity, Model as SupplierModel},
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
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, message = "Category name is required"))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateSupplierRequest {
    #[validate(length(min = 1, message = "Supplier name is required"))]
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SupplierResponse {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Service for the catalog reference data items point at: categories and
/// suppliers. Deletion is rejected while any item still references the row.
#[derive(Clone)]
pub struct CatalogService {
    db_pool: Arc<DbPool>,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_category(
        &self,
        request: CreateCategoryRequest,
    ) -> Result<CategoryResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;

        let existing = CategoryEntity::find()
            .filter(product_category::Column::Name.eq(request.name.clone()))
            .count(db)
            .await?;
        if existing > 0 {
            return Err(ServiceError::Conflict(format!(
                "Category '{}' already exists",
                request.name
            )));
        }

        let model = product_category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.clone()),
            description: Set(request.description.clone()),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await?;

        info!(category_id = %model.id, "Category created");
        Ok(category_response(model))
    }

    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<CategoryResponse>, ServiceError> {
        let db = &*self.db_pool;
        let categories = CategoryEntity::find()
            .order_by_asc(product_category::Column::Name)
            .all(db)
            .await?;
        Ok(categories.into_iter().map(category_response).collect())
    }

    #[instrument(skip(self), fields(category_id = %category_id))]
    pub async fn delete_category(&self, category_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let referencing = ItemEntity::find()
            .filter(inventory_item::Column::CategoryId.eq(category_id))
            .count(db)
            .await?;
        if referencing > 0 {
            return Err(ServiceError::InvalidOperation(format!(
                "Category is used by {} item(s) and cannot be deleted",
                referencing
            )));
        }

        let result = CategoryEntity::delete_by_id(category_id).exec(db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Category {} not found",
                category_id
            )));
        }
        info!(category_id = %category_id, "Category deleted");
        Ok(())
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_supplier(
        &self,
        request: CreateSupplierRequest,
    ) -> Result<SupplierResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;

        let model = supplier::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.clone()),
            phone: Set(request.phone.clone()),
            address: Set(request.address.clone()),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await?;

        info!(supplier_id = %model.id, "Supplier created");
        Ok(supplier_response(model))
    }

    #[instrument(skip(self))]
    pub async fn list_suppliers(&self) -> Result<Vec<SupplierResponse>, ServiceError> {
        let db = &*self.db_pool;
        let suppliers = SupplierEntity::find()
            .order_by_asc(supplier::Column::Name)
            .all(db)
            .await?;
        Ok(suppliers.into_iter().map(supplier_response).collect())
    }

    #[instrument(skip(self), fields(supplier_id = %supplier_id))]
    pub async fn delete_supplier(&self, supplier_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let referencing = ItemEntity::find()
            .filter(inventory_item::Column::SupplierId.eq(supplier_id))
            .count(db)
            .await?;
        if referencing > 0 {
            return Err(ServiceError::InvalidOperation(format!(
                "Supplier is used by {} item(s) and cannot be deleted",
                referencing
            )));
        }

        let result = SupplierEntity::delete_by_id(supplier_id).exec(db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Supplier {} not found",
                supplier_id
            )));
        }
        info!(supplier_id = %supplier_id, "Supplier deleted");
        Ok(())
    }
}

fn category_response(model: CategoryModel) -> CategoryResponse {
    CategoryResponse {
        id: model.id,
        name: model.name,
        description: model.description,
        created_at: model.created_at,
    }
}

fn supplier_response(model: SupplierModel) -> SupplierResponse {
    SupplierResponse {
        id: model.id,
        name: model.name,
        phone: model.phone,
        address: model.address,
        created_at: model.created_at,
    }
}
