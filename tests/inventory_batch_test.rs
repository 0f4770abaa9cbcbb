//! Batch import behavior: weighted-average aggregation, duplicate batch
//! rejection, and variant combination matching.

mod common;

use common::TestApp;
use retail_api::entities::attribute_set::AttributeSet;
use retail_api::errors::ServiceError;
use retail_api::services::inventory::{BatchLine, CreateItemRequest, ImportBatchRequest};
use retail_api::services::variants::CreateAttributeRequest;
use rust_decimal_macros::dec;

fn batch(number: &str, quantity: i32, unit_cost: rust_decimal::Decimal) -> ImportBatchRequest {
    ImportBatchRequest {
        batch_number: number.to_string(),
        batch_date: None,
        note: None,
        lines: vec![BatchLine {
            attributes: None,
            quantity,
            unit_cost,
        }],
    }
}

#[tokio::test]
async fn two_batches_yield_summed_quantity_and_weighted_average() {
    let app = TestApp::new().await;
    let item = app.seed_item("USB Cable").await;

    app.services
        .inventory
        .import_batch(item.id, batch("B-001", 10, dec!(100)), "tester")
        .await
        .expect("first batch");
    let updated = app
        .services
        .inventory
        .import_batch(item.id, batch("B-002", 10, dec!(200)), "tester")
        .await
        .expect("second batch");

    assert_eq!(updated.quantity, 20);
    assert_eq!(updated.cost_total, dec!(3000));
    assert_eq!(updated.average_unit_cost, dec!(150));
    assert!(updated.available);
}

#[tokio::test]
async fn duplicate_batch_numbers_are_rejected() {
    let app = TestApp::new().await;
    let item = app.seed_item("Charger").await;

    app.services
        .inventory
        .import_batch(item.id, batch("B-DUP", 5, dec!(50)), "tester")
        .await
        .expect("first import");

    // Same batch number, otherwise valid payload.
    let err = app
        .services
        .inventory
        .import_batch(item.id, batch("B-DUP", 7, dec!(60)), "tester")
        .await
        .expect_err("duplicate must be rejected");
    assert!(matches!(err, ServiceError::InvalidOperation(_)));

    // The failed import must not have changed the aggregates.
    let item = app
        .services
        .inventory
        .get_item(item.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item.quantity, 5);
    assert_eq!(item.cost_total, dec!(250));
}

#[tokio::test]
async fn non_positive_quantities_and_costs_are_rejected_before_any_write() {
    let app = TestApp::new().await;
    let item = app.seed_item("Speaker").await;

    for bad in [
        batch("B-BAD-1", 0, dec!(10)),
        batch("B-BAD-2", -3, dec!(10)),
        batch("B-BAD-3", 5, dec!(0)),
        batch("B-BAD-4", 5, dec!(-1)),
    ] {
        let err = app
            .services
            .inventory
            .import_batch(item.id, bad, "tester")
            .await
            .expect_err("invalid payload must be rejected");
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    let batches = app.services.inventory.list_batches(item.id).await.unwrap();
    assert!(batches.is_empty());
}

#[tokio::test]
async fn variant_lines_merge_on_matching_attributes_and_append_otherwise() {
    let app = TestApp::new().await;

    app.services
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
    let item = app
        .services
        .inventory
        .create_item(
            CreateItemRequest {
                name: "T-Shirt".to_string(),
                category_id,
                supplier_id,
                variants: vec![red.clone()],
            },
            "tester",
        )
        .await
        .unwrap();
    assert!(item.has_variants);

    // First batch: stock the existing red variant and introduce blue.
    let mut blue = AttributeSet::new();
    blue.insert("color", "blue");
    let updated = app
        .services
        .inventory
        .import_batch(
            item.id,
            ImportBatchRequest {
                batch_number: "B-100".to_string(),
                batch_date: None,
                note: None,
                lines: vec![
                    BatchLine {
                        attributes: Some(red.clone()),
                        quantity: 4,
                        unit_cost: dec!(80),
                    },
                    BatchLine {
                        attributes: Some(blue.clone()),
                        quantity: 6,
                        unit_cost: dec!(90),
                    },
                ],
            },
            "tester",
        )
        .await
        .unwrap();

    assert_eq!(updated.variants.len(), 2);
    assert_eq!(updated.quantity, 10);

    // Second batch against red only: merges instead of appending.
    let updated = app
        .services
        .inventory
        .import_batch(
            item.id,
            ImportBatchRequest {
                batch_number: "B-101".to_string(),
                batch_date: None,
                note: None,
                lines: vec![BatchLine {
                    attributes: Some(red.clone()),
                    quantity: 4,
                    unit_cost: dec!(120),
                }],
            },
            "tester",
        )
        .await
        .unwrap();

    assert_eq!(updated.variants.len(), 2);
    let red_variant = updated
        .variants
        .iter()
        .find(|v| v.attributes == red)
        .expect("red variant present");
    assert_eq!(red_variant.quantity, 8);
    assert_eq!(red_variant.average_unit_cost, dec!(100));
    assert_eq!(updated.quantity, 14);
}

#[tokio::test]
async fn undefined_attributes_and_values_are_rejected() {
    let app = TestApp::new().await;

    app.services
        .variants
        .create_attribute(CreateAttributeRequest {
            name: "size".to_string(),
            values: vec!["S".to_string(), "M".to_string()],
        })
        .await
        .unwrap();

    let (category_id, supplier_id) = app.seed_catalog().await;

    let mut unknown_attribute = AttributeSet::new();
    unknown_attribute.insert("material", "cotton");
    let err = app
        .services
        .inventory
        .create_item(
            CreateItemRequest {
                name: "Hoodie".to_string(),
                category_id,
                supplier_id,
                variants: vec![unknown_attribute],
            },
            "tester",
        )
        .await
        .expect_err("unknown attribute must be rejected");
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let mut unknown_value = AttributeSet::new();
    unknown_value.insert("size", "XXL");
    let err = app
        .services
        .inventory
        .create_item(
            CreateItemRequest {
                name: "Hoodie".to_string(),
                category_id,
                supplier_id,
                variants: vec![unknown_value],
            },
            "tester",
        )
        .await
        .expect_err("unknown value must be rejected");
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn item_codes_are_sequential() {
    let app = TestApp::new().await;
    let first = app.seed_item("First").await;
    let second = app.seed_item("Second").await;

    assert_eq!(first.code, "MD01");
    assert_eq!(second.code, "MD02");
}

#[tokio::test]
async fn batch_history_is_preserved() {
    let app = TestApp::new().await;
    let item = app.seed_item("Router").await;

    app.services
        .inventory
        .import_batch(item.id, batch("B-A", 3, dec!(10)), "alice")
        .await
        .unwrap();
    app.services
        .inventory
        .import_batch(item.id, batch("B-B", 4, dec!(20)), "bob")
        .await
        .unwrap();

    let batches = app.services.inventory.list_batches(item.id).await.unwrap();
    assert_eq!(batches.len(), 2);
    assert!(batches.iter().any(|b| b.batch_number == "B-A" && b.received_by == "alice"));
    assert!(batches.iter().any(|b| b.batch_number == "B-B" && b.received_by == "bob"));
}
