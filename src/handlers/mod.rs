pub mod catalog;
pub mod common;
pub mod customers;
pub mod employees;
pub mod inventory;
pub mod notifications;
pub mod orders;
pub mod promotions;
pub mod variants;
pub mod warranties;

use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub inventory: Arc<crate::services::inventory::InventoryService>,
    pub orders: Arc<crate::services::orders::OrderService>,
    pub warranties: Arc<crate::services::warranties::WarrantyService>,
    pub promotions: Arc<crate::services::promotions::PromotionService>,
    pub customers: Arc<crate::services::customers::CustomerService>,
    pub employees: Arc<crate::services::employees::EmployeeService>,
    pub variants: Arc<crate::services::variants::VariantService>,
    pub catalog: Arc<crate::services::catalog::CatalogService>,
    pub notifications: Arc<crate::services::notifications::NotificationService>,
}

impl AppServices {
    /// Builds the service container shared by all handlers.
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        let inventory = Arc::new(crate::services::inventory::InventoryService::new(
            db_pool.clone(),
            Some(event_sender.clone()),
        ));
        let orders = Arc::new(crate::services::orders::OrderService::new(
            db_pool.clone(),
            Some(event_sender.clone()),
        ));
        let warranties = Arc::new(crate::services::warranties::WarrantyService::new(
            db_pool.clone(),
            Some(event_sender.clone()),
        ));
        let promotions = Arc::new(crate::services::promotions::PromotionService::new(
            db_pool.clone(),
            Some(event_sender.clone()),
        ));
        let customers = Arc::new(crate::services::customers::CustomerService::new(
            db_pool.clone(),
            Some(event_sender.clone()),
        ));
        let employees = Arc::new(crate::services::employees::EmployeeService::new(
            db_pool.clone(),
            Some(event_sender),
        ));
        let variants = Arc::new(crate::services::variants::VariantService::new(
            db_pool.clone(),
        ));
        let catalog = Arc::new(crate::services::catalog::CatalogService::new(
            db_pool.clone(),
        ));
        let notifications = Arc::new(crate::services::notifications::NotificationService::new(
            db_pool,
        ));

        Self {
            inventory,
            orders,
            warranties,
            promotions,
            customers,
            employees,
            variants,
            catalog,
            notifications,
        }
    }
}
