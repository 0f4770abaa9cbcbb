use crate::{
    db::DbPool,
    entities::employee::{self, Entity as EmployeeEntity, Model as EmployeeModel},
    entities::user::{self, Entity as UserEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
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
pub struct CreateEmployeeRequest {
    #[validate(length(min = 3, max = 64, message = "Username must be 3-64 characters"))]
    pub username: String,
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[validate(length(min = 1, message = "Role is required"))]
    pub role: String,
    pub phone: Option<String>,
    pub position: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EmployeeResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub name: String,
    pub role: String,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EmployeeListResponse {
    pub employees: Vec<EmployeeResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Service for managing employees. Creation writes the login identity and
/// the employee record in one transaction so neither can exist without the
/// other.
#[derive(Clone)]
pub struct EmployeeService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl EmployeeService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn create_employee(
        &self,
        request: CreateEmployeeRequest,
    ) -> Result<EmployeeResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let now = Utc::now();
        let user_id = Uuid::new_v4();
        let employee_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for employee creation");
            ServiceError::DatabaseError(e)
        })?;

        let taken = UserEntity::find()
            .filter(user::Column::Username.eq(request.username.clone()))
            .count(&txn)
            .await?;
        if taken > 0 {
            return Err(ServiceError::Conflict(format!(
                "Username {} is already taken",
                request.username
            )));
        }

        let user_model = user::ActiveModel {
            id: Set(user_id),
            username: Set(request.username.clone()),
            full_name: Set(request.full_name.clone()),
            role: Set(request.role.clone()),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let employee_model = employee::ActiveModel {
            id: Set(employee_id),
            user_id: Set(user_id),
            name: Set(request.full_name.clone()),
            phone: Set(request.phone.clone()),
            position: Set(request.position.clone()),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&txn)
        .await?;

        // Both rows or neither.
        txn.commit().await.map_err(|e| {
            error!(error = %e, employee_id = %employee_id, "Failed to commit employee creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(employee_id = %employee_id, user_id = %user_id, "Employee created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::EmployeeCreated {
                    employee_id,
                    user_id,
                })
                .await
            {
                warn!(error = %e, employee_id = %employee_id, "Failed to send employee event");
            }
        }

        Ok(EmployeeResponse {
            id: employee_model.id,
            user_id,
            username: user_model.username,
            name: employee_model.name,
            role: user_model.role,
            phone: employee_model.phone,
            position: employee_model.position,
            created_at: employee_model.created_at,
        })
    }

    #[instrument(skip(self), fields(employee_id = %employee_id))]
    pub async fn get_employee(
        &self,
        employee_id: Uuid,
    ) -> Result<Option<EmployeeResponse>, ServiceError> {
        let db = &*self.db_pool;

        let employee = match EmployeeEntity::find_by_id(employee_id).one(db).await? {
            Some(employee) => employee,
            None => return Ok(None),
        };
        let user = UserEntity::find_by_id(employee.user_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "Employee {} has no backing user",
                    employee_id
                ))
            })?;

        Ok(Some(join_response(employee, user.username, user.role)))
    }

    #[instrument(skip(self))]
    pub async fn list_employees(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<EmployeeListResponse, ServiceError> {
        let db = &*self.db_pool;

        let paginator = EmployeeEntity::find()
            .order_by_desc(employee::Column::CreatedAt)
            .paginate(db, per_page);
        let total = paginator.num_items().await?;
        let employees = paginator.fetch_page(page.saturating_sub(1)).await?;

        let mut responses = Vec::with_capacity(employees.len());
        for employee in employees {
            let user = UserEntity::find_by_id(employee.user_id).one(db).await?;
            let (username, role) = user
                .map(|u| (u.username, u.role))
                .unwrap_or_else(|| (String::new(), String::new()));
            responses.push(join_response(employee, username, role));
        }

        Ok(EmployeeListResponse {
            employees: responses,
            total,
            page,
            per_page,
        })
    }

    /// Deletes an employee and its backing user in one transaction.
    #[instrument(skip(self), fields(employee_id = %employee_id))]
    pub async fn delete_employee(&self, employee_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let employee = EmployeeEntity::find_by_id(employee_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Employee {} not found", employee_id)))?;

        let user_id = employee.user_id;
        EmployeeEntity::delete_by_id(employee_id).exec(&txn).await?;
        UserEntity::delete_by_id(user_id).exec(&txn).await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(employee_id = %employee_id, user_id = %user_id, "Employee deleted");
        Ok(())
    }
}

fn join_response(employee: EmployeeModel, username: String, role: String) -> EmployeeResponse {
    EmployeeResponse {
        id: employee.id,
        user_id: employee.user_id,
        username,
        name: employee.name,
        role,
        phone: employee.phone,
        position: employee.position,
        created_at: employee.created_at,
    }
}
