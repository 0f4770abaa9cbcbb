//! Variant attribute definitions: duplicate combination rejection on items
//! and the referenced-delete guard.

mod common;

use common::TestApp;
use retail_api::entities::attribute_set::AttributeSet;
use retail_api::errors::ServiceError;
use retail_api::services::inventory::CreateItemRequest;
use retail_api::services::variants::{CreateAttributeRequest, UpdateAttributeRequest};

#[tokio::test]
async fn duplicate_combinations_on_one_item_are_rejected() {
    let app = TestApp::new().await;

    app.services
        .variants
        .create_attribute(CreateAttributeRequest {
            name: "color".to_string(),
            values: vec!["red".to_string()],
        })
        .await
        .unwrap();
    app.services
        .variants
        .create_attribute(CreateAttributeRequest {
            name: "size".to_string(),
            values: vec!["L".to_string()],
        })
        .await
        .unwrap();

    let (category_id, supplier_id) = app.seed_catalog().await;

    // Same combination written in different insertion orders.
    let mut first = AttributeSet::new();
    first.insert("color", "red");
    first.insert("size", "L");
    let mut second = AttributeSet::new();
    second.insert("size", "L");
    second.insert("color", "red");

    let err = app
        .services
        .inventory
        .create_item(
            CreateItemRequest {
                name: "Jacket".to_string(),
                category_id,
                supplier_id,
                variants: vec![first, second],
            },
            "tester",
        )
        .await
        .expect_err("duplicate combination must be rejected");
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn referenced_attributes_cannot_be_deleted() {
    let app = TestApp::new().await;

    let attribute = app
        .services
        .variants
        .create_attribute(CreateAttributeRequest {
            name: "color".to_string(),
            values: vec!["red".to_string(), "blue".to_string()],
        })
        .await
        .unwrap();

    let (category_id, supplier_id) = app.seed_catalog().await;
    let mut red = AttributeSet::new();
    red.insert("color", "red");
    app.services
        .inventory
        .create_item(
            CreateItemRequest {
                name: "Scarf".to_string(),
                category_id,
                supplier_id,
                variants: vec![red],
            },
            "tester",
        )
        .await
        .unwrap();

    let err = app
        .services
        .variants
        .delete_attribute(attribute.id)
        .await
        .expect_err("referenced attribute must not be deletable");
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn unreferenced_attributes_can_be_deleted() {
    let app = TestApp::new().await;

    let attribute = app
        .services
        .variants
        .create_attribute(CreateAttributeRequest {
            name: "material".to_string(),
            values: vec!["cotton".to_string()],
        })
        .await
        .unwrap();

    app.services
        .variants
        .delete_attribute(attribute.id)
        .await
        .expect("unreferenced attribute deletes cleanly");
    assert!(app
        .services
        .variants
        .get_attribute(attribute.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn duplicate_attribute_names_conflict() {
    let app = TestApp::new().await;

    app.services
        .variants
        .create_attribute(CreateAttributeRequest {
            name: "color".to_string(),
            values: vec!["red".to_string()],
        })
        .await
        .unwrap();

    let err = app
        .services
        .variants
        .create_attribute(CreateAttributeRequest {
            name: "color".to_string(),
            values: vec!["green".to_string()],
        })
        .await
        .expect_err("duplicate name must conflict");
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn updating_values_replaces_the_allowed_set() {
    let app = TestApp::new().await;

    let attribute = app
        .services
        .variants
        .create_attribute(CreateAttributeRequest {
            name: "size".to_string(),
            values: vec!["S".to_string(), "M".to_string()],
        })
        .await
        .unwrap();

    let updated = app
        .services
        .variants
        .update_attribute(
            attribute.id,
            UpdateAttributeRequest {
                values: vec!["S".to_string(), "M".to_string(), "L".to_string()],
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.values, vec!["S", "M", "L"]);
}
