use utoipa::OpenApi;

use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Retail API",
        version = "0.1.0",
        description = r#"
Backend API for retail management: stocked items with batch imports and
weighted-average costing, the order lifecycle with payments and
cancellation, warranty activation, promotions, and the supporting catalog
resources.

## Error handling

Every error is returned as:

```json
{
  "error": "Bad Request",
  "message": "Batch quantity must be a positive number",
  "timestamp": "2025-01-01T00:00:00Z"
}
```

## Pagination

List endpoints accept `page` (default 1) and `limit` (default 20, max 100).

## Acting principal

Mutating endpoints require the `X-Actor-Name` header identifying the acting
user; the value is recorded on created rows and in cancellation reasons.
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    paths(
        handlers::inventory::list_inventory,
        handlers::inventory::get_inventory,
        handlers::inventory::create_inventory,
        handlers::inventory::import_batch,
        handlers::inventory::list_batches,
        handlers::inventory::delete_inventory,
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::create_order,
        handlers::orders::record_payment,
        handlers::orders::update_order_status,
        handlers::orders::cancel_order,
        handlers::warranties::list_warranties,
        handlers::warranties::get_warranty,
        handlers::warranties::create_warranty,
        handlers::warranties::activate_warranty,
        handlers::promotions::list_promotions,
        handlers::promotions::get_promotion,
        handlers::promotions::create_promotion,
        handlers::promotions::preview_discount,
        handlers::promotions::delete_promotion,
        handlers::customers::list_customers,
        handlers::customers::get_customer,
        handlers::customers::create_customer,
        handlers::customers::update_customer,
        handlers::customers::delete_customer,
        handlers::employees::list_employees,
        handlers::employees::get_employee,
        handlers::employees::create_employee,
        handlers::employees::delete_employee,
        handlers::variants::list_attributes,
        handlers::variants::get_attribute,
        handlers::variants::create_attribute,
        handlers::variants::update_attribute,
        handlers::variants::delete_attribute,
        handlers::catalog::list_categories,
        handlers::catalog::create_category,
        handlers::catalog::delete_category,
        handlers::catalog::list_suppliers,
        handlers::catalog::create_supplier,
        handlers::catalog::delete_supplier,
        handlers::notifications::list_notifications,
        handlers::notifications::create_notification,
        handlers::notifications::mark_notification_read,
        handlers::notifications::delete_notification,
    ),
    tags(
        (name = "inventory", description = "Stocked items and batch imports"),
        (name = "orders", description = "Order lifecycle, payments, cancellation"),
        (name = "warranties", description = "Warranty registration and activation"),
        (name = "promotions", description = "Promotions and discount preview"),
        (name = "customers", description = "Customer management"),
        (name = "employees", description = "Employee management"),
        (name = "variants", description = "Variant attribute definitions"),
        (name = "catalog", description = "Categories and suppliers"),
        (name = "notifications", description = "Stored dashboard notifications"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_builds() {
        let doc = ApiDoc::openapi();
        let json = doc.to_json().expect("OpenAPI document should serialize");
        assert!(json.contains("/api/v1/orders"));
        assert!(json.contains("/api/v1/inventory"));
        assert!(json.contains("/api/v1/warranties"));
    }
}
