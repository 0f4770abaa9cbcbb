//! Retail API Library
//!
//! This crate provides the core functionality for the retail backend:
//! inventory batch tracking, the order lifecycle, warranty activation, and
//! promotions.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

// Common query parameters for list endpoints
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub search: Option<String>,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
        }
    }

    pub fn validation_errors(errors: Vec<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some("Validation failed".to_string()),
            errors: Some(errors),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

// API routes
pub fn api_v1_routes() -> Router<AppState> {
    // Inventory routes
    let inventory = Router::new()
        .route(
            "/inventory",
            get(handlers::inventory::list_inventory)
                .post(handlers::inventory::create_inventory),
        )
        .route(
            "/inventory/:id",
            get(handlers::inventory::get_inventory)
                .delete(handlers::inventory::delete_inventory),
        )
        .route(
            "/inventory/:id/batches",
            get(handlers::inventory::list_batches).post(handlers::inventory::import_batch),
        );

    // Orders routes
    let orders = Router::new()
        .route(
            "/orders",
            get(handlers::orders::list_orders).post(handlers::orders::create_order),
        )
        .route("/orders/:id", get(handlers::orders::get_order))
        .route(
            "/orders/:id/payments",
            axum::routing::post(handlers::orders::record_payment),
        )
        .route(
            "/orders/:id/status",
            axum::routing::put(handlers::orders::update_order_status),
        )
        .route(
            "/orders/:id/cancel",
            axum::routing::post(handlers::orders::cancel_order),
        );

    // Warranties routes
    let warranties = Router::new()
        .route(
            "/warranties",
            get(handlers::warranties::list_warranties).post(handlers::warranties::create_warranty),
        )
        .route("/warranties/:id", get(handlers::warranties::get_warranty))
        .route(
            "/warranties/:id/activate",
            axum::routing::post(handlers::warranties::activate_warranty),
        );

    // Promotions routes
    let promotions = Router::new()
        .route(
            "/promotions",
            get(handlers::promotions::list_promotions).post(handlers::promotions::create_promotion),
        )
        .route(
            "/promotions/:id",
            get(handlers::promotions::get_promotion).delete(handlers::promotions::delete_promotion),
        )
        .route(
            "/promotions/:id/preview-discount",
            axum::routing::post(handlers::promotions::preview_discount),
        );

    // Customers routes
    let customers = Router::new()
        .route(
            "/customers",
            get(handlers::customers::list_customers).post(handlers::customers::create_customer),
        )
        .route(
            "/customers/:id",
            get(handlers::customers::get_customer)
                .put(handlers::customers::update_customer)
                .delete(handlers::customers::delete_customer),
        );

    // Employees routes
    let employees = Router::new()
        .route(
            "/employees",
            get(handlers::employees::list_employees).post(handlers::employees::create_employee),
        )
        .route(
            "/employees/:id",
            get(handlers::employees::get_employee).delete(handlers::employees::delete_employee),
        );

    // Variant attribute routes
    let variants = Router::new()
        .route(
            "/variants",
            get(handlers::variants::list_attributes).post(handlers::variants::create_attribute),
        )
        .route(
            "/variants/:id",
            get(handlers::variants::get_attribute)
                .put(handlers::variants::update_attribute)
                .delete(handlers::variants::delete_attribute),
        );

    // Catalog reference data routes
    let catalog = Router::new()
        .route(
            "/categories",
            get(handlers::catalog::list_categories).post(handlers::catalog::create_category),
        )
        .route(
            "/categories/:id",
            axum::routing::delete(handlers::catalog::delete_category),
        )
        .route(
            "/suppliers",
            get(handlers::catalog::list_suppliers).post(handlers::catalog::create_supplier),
        )
        .route(
            "/suppliers/:id",
            axum::routing::delete(handlers::catalog::delete_supplier),
        );

    // Notifications routes
    let notifications = Router::new()
        .route(
            "/notifications",
            get(handlers::notifications::list_notifications)
                .post(handlers::notifications::create_notification),
        )
        .route(
            "/notifications/:id",
            axum::routing::delete(handlers::notifications::delete_notification),
        )
        .route(
            "/notifications/:id/read",
            axum::routing::post(handlers::notifications::mark_notification_read),
        );

    Router::new()
        // Status and health endpoints
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .merge(inventory)
        .merge(orders)
        .merge(warranties)
        .merge(promotions)
        .merge(customers)
        .merge(employees)
        .merge(variants)
        .merge(catalog)
        .merge(notifications)
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let version = env!("CARGO_PKG_VERSION");
    let status_data = json!({
        "status": "ok",
        "version": version,
        "service": "retail-api",
        "timestamp": Utc::now().to_rfc3339(),
        "environment": std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}

#[cfg(test)]
mod response_tests {
    use super::*;

    #[test]
    fn success_response_wraps_data() {
        let response = ApiResponse::success("ok");
        assert!(response.success);
        assert_eq!(response.data, Some("ok"));
        assert!(response.message.is_none());
    }

    #[test]
    fn error_response_carries_the_message() {
        let response = ApiResponse::<()>::error("oops".into());
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.message.as_deref(), Some("oops"));
    }

    #[test]
    fn validation_errors_are_listed() {
        let response = ApiResponse::<()>::validation_errors(vec!["missing".into()]);
        assert!(!response.success);
        assert_eq!(response.errors.as_ref().map(Vec::len), Some(1));
    }
}
