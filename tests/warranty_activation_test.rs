//! Warranty activation rules: pending-only activation against a delivered
//! order of the right customer, calendar-month expiry stamping, and the
//! double-activation guard.

mod common;

use common::TestApp;
use chrono::Months;
use retail_api::entities::order::OrderStatus;
use retail_api::entities::warranty::WarrantyStatus;
use retail_api::errors::ServiceError;
use retail_api::services::orders::{CreateOrderLine, CreateOrderRequest, RecordPaymentRequest};
use retail_api::services::warranties::{ActivateWarrantyRequest, CreateWarrantyRequest};
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Seeds an item, a customer, and a delivered order of that item.
async fn delivered_order(app: &TestApp) -> (Uuid, Uuid, Uuid) {
    let item = app.seed_stocked_item("Washing Machine", 5, dec!(4000)).await;
    let customer_id = app.seed_customer().await;

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
                    unit_price: Some(dec!(5500)),
                }],
                payment_method: Some("cash".to_string()),
                promotion_id: None,
                shipping_address: None,
                notes: None,
            },
            "seller",
        )
        .await
        .unwrap();
    app.services
        .orders
        .record_payment(
            order.id,
            RecordPaymentRequest {
                method: "cash".to_string(),
                amount: dec!(5500),
            },
            "cashier",
        )
        .await
        .unwrap();
    app.services
        .orders
        .update_status(order.id, OrderStatus::Shipping)
        .await
        .unwrap();
    app.services
        .orders
        .update_status(order.id, OrderStatus::Delivered)
        .await
        .unwrap();

    (item.id, customer_id, order.id)
}

#[tokio::test]
async fn activation_binds_customer_order_and_stamps_calendar_month_expiry() {
    let app = TestApp::new().await;
    let (item_id, customer_id, order_id) = delivered_order(&app).await;

    let warranty = app
        .services
        .warranties
        .create_warranty(CreateWarrantyRequest {
            item_id,
            period_months: 12,
        })
        .await
        .unwrap();
    assert_eq!(warranty.status, WarrantyStatus::PendingActivation);
    assert!(warranty.start_date.is_none());
    assert!(warranty.customer_id.is_none());

    let activated = app
        .services
        .warranties
        .activate_warranty(
            warranty.id,
            ActivateWarrantyRequest {
                order_id,
                customer_id,
            },
        )
        .await
        .unwrap();

    assert_eq!(activated.status, WarrantyStatus::Active);
    assert_eq!(activated.customer_id, Some(customer_id));
    assert_eq!(activated.order_id, Some(order_id));

    let start = activated.start_date.expect("start stamped");
    let end = activated.end_date.expect("end stamped");
    assert_eq!(end, start.checked_add_months(Months::new(12)).unwrap());
}

#[tokio::test]
async fn second_activation_always_fails() {
    let app = TestApp::new().await;
    let (item_id, customer_id, order_id) = delivered_order(&app).await;

    let warranty = app
        .services
        .warranties
        .create_warranty(CreateWarrantyRequest {
            item_id,
            period_months: 6,
        })
        .await
        .unwrap();

    app.services
        .warranties
        .activate_warranty(
            warranty.id,
            ActivateWarrantyRequest {
                order_id,
                customer_id,
            },
        )
        .await
        .unwrap();

    let err = app
        .services
        .warranties
        .activate_warranty(
            warranty.id,
            ActivateWarrantyRequest {
                order_id,
                customer_id,
            },
        )
        .await
        .expect_err("double activation must fail");
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn activation_requires_a_delivered_order() {
    let app = TestApp::new().await;
    let item = app.seed_stocked_item("Fridge", 3, dec!(6000)).await;
    let customer_id = app.seed_customer().await;

    // Order exists but is still pending.
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
                    unit_price: Some(dec!(8000)),
                }],
                payment_method: None,
                promotion_id: None,
                shipping_address: None,
                notes: None,
            },
            "seller",
        )
        .await
        .unwrap();

    let warranty = app
        .services
        .warranties
        .create_warranty(CreateWarrantyRequest {
            item_id: item.id,
            period_months: 12,
        })
        .await
        .unwrap();

    let err = app
        .services
        .warranties
        .activate_warranty(
            warranty.id,
            ActivateWarrantyRequest {
                order_id: order.id,
                customer_id,
            },
        )
        .await
        .expect_err("pending order must not activate a warranty");
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn activation_requires_the_order_to_cover_the_item() {
    let app = TestApp::new().await;
    let (_item_id, customer_id, order_id) = delivered_order(&app).await;

    // Warranty for a different item than the one on the order.
    let other_item = app.seed_stocked_item("Microwave", 2, dec!(1000)).await;
    let warranty = app
        .services
        .warranties
        .create_warranty(CreateWarrantyRequest {
            item_id: other_item.id,
            period_months: 12,
        })
        .await
        .unwrap();

    let err = app
        .services
        .warranties
        .activate_warranty(
            warranty.id,
            ActivateWarrantyRequest {
                order_id,
                customer_id,
            },
        )
        .await
        .expect_err("order must include the warranted item");
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn activation_rejects_unknown_references() {
    let app = TestApp::new().await;
    let (item_id, customer_id, _order_id) = delivered_order(&app).await;

    let warranty = app
        .services
        .warranties
        .create_warranty(CreateWarrantyRequest {
            item_id,
            period_months: 12,
        })
        .await
        .unwrap();

    let err = app
        .services
        .warranties
        .activate_warranty(
            warranty.id,
            ActivateWarrantyRequest {
                order_id: Uuid::new_v4(),
                customer_id,
            },
        )
        .await
        .expect_err("unknown order must fail");
    assert!(matches!(err, ServiceError::ValidationError(_)));
}
