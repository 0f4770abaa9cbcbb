//! Promotion application inside order creation: the discount cap, the
//! minimum-order-value gate, and the date window.

mod common;

use chrono::{Duration, Utc};
use common::TestApp;
use retail_api::errors::ServiceError;
use retail_api::services::orders::{CreateOrderLine, CreateOrderRequest};
use retail_api::services::promotions::CreatePromotionRequest;
use rust_decimal_macros::dec;
use uuid::Uuid;

async fn seed_promotion(app: &TestApp) -> Uuid {
    let now = Utc::now();
    app.services
        .promotions
        .create_promotion(CreatePromotionRequest {
            name: "Year End Sale".to_string(),
            discount_percent: dec!(10),
            min_order_value: dec!(200000),
            max_discount: dec!(40000),
            start_date: now - Duration::days(1),
            end_date: now + Duration::days(7),
        })
        .await
        .expect("create promotion")
        .id
}

#[tokio::test]
async fn order_discount_is_capped() {
    let app = TestApp::new().await;
    let promotion_id = seed_promotion(&app).await;
    let item = app.seed_stocked_item("TV", 10, dec!(400000)).await;
    let customer_id = app.seed_customer().await;

    // Subtotal 500_000: 10% would be 50_000, capped at 40_000.
    let order = app
        .services
        .orders
        .create_order(
            CreateOrderRequest {
                customer_id,
                employee_id: None,
                items: vec![CreateOrderLine {
                    item_id: item.id,
                    variant_id: None,
                    quantity: 1,
                    unit_price: Some(dec!(500000)),
                }],
                payment_method: None,
                promotion_id: Some(promotion_id),
                shipping_address: None,
                notes: None,
            },
            "seller",
        )
        .await
        .unwrap();

    assert_eq!(order.discount_amount, dec!(40000));
    assert_eq!(order.total_amount, dec!(460000));
    assert_eq!(order.promotion_id, Some(promotion_id));
}

#[tokio::test]
async fn orders_below_the_minimum_are_refused() {
    let app = TestApp::new().await;
    let promotion_id = seed_promotion(&app).await;
    let item = app.seed_stocked_item("Radio", 10, dec!(100000)).await;
    let customer_id = app.seed_customer().await;

    let err = app
        .services
        .orders
        .create_order(
            CreateOrderRequest {
                customer_id,
                employee_id: None,
                items: vec![CreateOrderLine {
                    item_id: item.id,
                    variant_id: None,
                    quantity: 1,
                    unit_price: Some(dec!(150000)),
                }],
                payment_method: None,
                promotion_id: Some(promotion_id),
                shipping_address: None,
                notes: None,
            },
            "seller",
        )
        .await
        .expect_err("below-minimum order must be refused");
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn expired_promotions_are_refused() {
    let app = TestApp::new().await;
    let now = Utc::now();
    let promotion_id = app
        .services
        .promotions
        .create_promotion(CreatePromotionRequest {
            name: "Last Year".to_string(),
            discount_percent: dec!(20),
            min_order_value: dec!(0),
            max_discount: dec!(100000),
            start_date: now - Duration::days(30),
            end_date: now - Duration::days(1),
        })
        .await
        .unwrap()
        .id;

    let item = app.seed_stocked_item("Camera", 5, dec!(300000)).await;
    let customer_id = app.seed_customer().await;

    let err = app
        .services
        .orders
        .create_order(
            CreateOrderRequest {
                customer_id,
                employee_id: None,
                items: vec![CreateOrderLine {
                    item_id: item.id,
                    variant_id: None,
                    quantity: 1,
                    unit_price: Some(dec!(400000)),
                }],
                payment_method: None,
                promotion_id: Some(promotion_id),
                shipping_address: None,
                notes: None,
            },
            "seller",
        )
        .await
        .expect_err("expired promotion must be refused");
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn preview_reports_discount_and_payable() {
    let app = TestApp::new().await;
    let promotion_id = seed_promotion(&app).await;

    let discount = app
        .services
        .promotions
        .preview_discount(promotion_id, dec!(300000))
        .await
        .unwrap();
    assert_eq!(discount, dec!(30000));
}
