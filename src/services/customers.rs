use crate::{
    db::DbPool,
    entities::customer::{self, Entity as CustomerEntity, Model as CustomerModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub name: String,
    #[validate(length(min = 6, max = 20, message = "Phone number must be 6-20 characters"))]
    pub phone: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub name: Option<String>,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustomerResponse {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustomerListResponse {
    pub customers: Vec<CustomerResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Service for managing customers.
#[derive(Clone)]
pub struct CustomerService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl CustomerService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(phone = %request.phone))]
    pub async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<CustomerResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let now = Utc::now();
        let customer_id = Uuid::new_v4();

        let existing = CustomerEntity::find()
            .filter(customer::Column::Phone.eq(request.phone.clone()))
            .count(db)
            .await?;
        if existing > 0 {
            return Err(ServiceError::Conflict(format!(
                "A customer with phone {} already exists",
                request.phone
            )));
        }

        let customer = customer::ActiveModel {
            id: Set(customer_id),
            name: Set(request.name.clone()),
            phone: Set(request.phone.clone()),
            email: Set(request.email.clone()),
            address: Set(request.address.clone()),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };
        let model = customer.insert(db).await?;

        info!(customer_id = %customer_id, "Customer created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::CustomerCreated(customer_id)).await {
                warn!(error = %e, customer_id = %customer_id, "Failed to send customer event");
            }
        }

        Ok(model_to_response(model))
    }

    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn get_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Option<CustomerResponse>, ServiceError> {
        let db = &*self.db_pool;
        Ok(CustomerEntity::find_by_id(customer_id)
            .one(db)
            .await?
            .map(model_to_response))
    }

    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        page: u64,
        per_page: u64,
        search: Option<String>,
    ) -> Result<CustomerListResponse, ServiceError> {
        let db = &*self.db_pool;

        let mut query = CustomerEntity::find().order_by_desc(customer::Column::CreatedAt);
        if let Some(term) = search.filter(|s| !s.trim().is_empty()) {
            query = query.filter(
                customer::Column::Name
                    .contains(term.trim())
                    .or(customer::Column::Phone.contains(term.trim())),
            );
        }
        let paginator = query.paginate(db, per_page);
        let total = paginator.num_items().await?;
        let customers = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(CustomerListResponse {
            customers: customers.into_iter().map(model_to_response).collect(),
            total,
            page,
            per_page,
        })
    }

    #[instrument(skip(self, request), fields(customer_id = %customer_id))]
    pub async fn update_customer(
        &self,
        customer_id: Uuid,
        request: UpdateCustomerRequest,
    ) -> Result<CustomerResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let now = Utc::now();

        let customer = CustomerEntity::find_by_id(customer_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", customer_id)))?;

        let mut active: customer::ActiveModel = customer.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(email) = request.email {
            active.email = Set(Some(email));
        }
        if let Some(address) = request.address {
            active.address = Set(Some(address));
        }
        active.updated_at = Set(Some(now));
        let updated = active.update(db).await?;

        info!(customer_id = %customer_id, "Customer updated");
        Ok(model_to_response(updated))
    }

    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn delete_customer(&self, customer_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let result = CustomerEntity::delete_by_id(customer_id).exec(db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Customer {} not found",
                customer_id
            )));
        }
        info!(customer_id = %customer_id, "Customer deleted");
        Ok(())
    }
}

fn model_to_response(model: CustomerModel) -> CustomerResponse {
    CustomerResponse {
        id: model.id,
        name: model.name,
        phone: model.phone,
        email: model.email,
        address: model.address,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}
