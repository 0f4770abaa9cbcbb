#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use retail_api::{
    db::{establish_connection_with_config, run_migrations, DbConfig, DbPool},
    events::EventSender,
    handlers::AppServices,
    services::catalog::{CreateCategoryRequest, CreateSupplierRequest},
    services::customers::CreateCustomerRequest,
    services::inventory::{BatchLine, CreateItemRequest, ImportBatchRequest, ItemResponse},
};
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Test harness: an in-memory SQLite database with the schema applied and
/// the full service container on top. A single-connection pool keeps every
/// statement on the one connection that owns the in-memory database.
pub struct TestApp {
    pub db: Arc<DbPool>,
    pub services: AppServices,
    _event_rx: mpsc::Receiver<retail_api::events::Event>,
}

impl TestApp {
    pub async fn new() -> Self {
        let config = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(5),
        };
        let db = Arc::new(
            establish_connection_with_config(&config)
                .await
                .expect("connect to in-memory sqlite"),
        );
        run_migrations(db.as_ref()).await.expect("run migrations");

        let (tx, rx) = mpsc::channel(256);
        let services = AppServices::new(db.clone(), Arc::new(EventSender::new(tx)));

        Self {
            db,
            services,
            _event_rx: rx,
        }
    }

    /// Seeds a category and supplier pair for item creation.
    pub async fn seed_catalog(&self) -> (Uuid, Uuid) {
        let category = self
            .services
            .catalog
            .create_category(CreateCategoryRequest {
                name: format!("Category {}", Uuid::new_v4().simple()),
                description: None,
            })
            .await
            .expect("create category");
        let supplier = self
            .services
            .catalog
            .create_supplier(CreateSupplierRequest {
                name: "Acme Trading".to_string(),
                phone: None,
                address: None,
            })
            .await
            .expect("create supplier");
        (category.id, supplier.id)
    }

    /// Seeds a plain (non-variant) item.
    pub async fn seed_item(&self, name: &str) -> ItemResponse {
        let (category_id, supplier_id) = self.seed_catalog().await;
        self.services
            .inventory
            .create_item(
                CreateItemRequest {
                    name: name.to_string(),
                    category_id,
                    supplier_id,
                    variants: Vec::new(),
                },
                "tester",
            )
            .await
            .expect("create item")
    }

    /// Seeds a plain item and imports one batch into it.
    pub async fn seed_stocked_item(
        &self,
        name: &str,
        quantity: i32,
        unit_cost: Decimal,
    ) -> ItemResponse {
        let item = self.seed_item(name).await;
        self.services
            .inventory
            .import_batch(
                item.id,
                ImportBatchRequest {
                    batch_number: format!("B-{}", Uuid::new_v4().simple()),
                    batch_date: None,
                    note: None,
                    lines: vec![BatchLine {
                        attributes: None,
                        quantity,
                        unit_cost,
                    }],
                },
                "tester",
            )
            .await
            .expect("import batch")
    }

    pub async fn seed_customer(&self) -> Uuid {
        let suffix = Uuid::new_v4().simple().to_string();
        self.services
            .customers
            .create_customer(CreateCustomerRequest {
                name: "Jordan Tran".to_string(),
                phone: format!("09{}", &suffix[..8]),
                email: None,
                address: None,
            })
            .await
            .expect("create customer")
            .id
    }
}
