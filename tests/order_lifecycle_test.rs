//! End-to-end order lifecycle: creation with stock decrement, payment
//! recording with derived settlement state, forward transitions, and
//! cancellation with inventory restoration.

mod common;

use common::TestApp;
use retail_api::entities::order::{OrderStatus, PaymentStatus};
use retail_api::errors::ServiceError;
use retail_api::services::orders::{
    CreateOrderLine, CreateOrderRequest, OrderResponse, RecordPaymentRequest,
};
use rust_decimal_macros::dec;
use uuid::Uuid;

async fn place_order(app: &TestApp, quantity: i32) -> OrderResponse {
    let item = app.seed_stocked_item("Laptop", 10, dec!(500)).await;
    let customer_id = app.seed_customer().await;

    app.services
        .orders
        .create_order(
            CreateOrderRequest {
                customer_id,
                employee_id: None,
                items: vec![CreateOrderLine {
                    item_id: item.id,
                    variant_id: None,
                    quantity,
                    unit_price: Some(dec!(800)),
                }],
                payment_method: Some("cash".to_string()),
                promotion_id: None,
                shipping_address: None,
                notes: None,
            },
            "seller",
        )
        .await
        .expect("create order")
}

#[tokio::test]
async fn creation_snapshots_lines_and_decrements_stock() {
    let app = TestApp::new().await;
    let order = place_order(&app, 3).await;

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Unpaid);
    assert_eq!(order.total_amount, dec!(2400));
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].name, "Laptop");
    assert_eq!(order.items[0].unit_price, dec!(800));

    let item = app
        .services
        .inventory
        .get_item(order.items[0].item_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item.quantity, 7);
    // Issuing at the average cost keeps the average unchanged.
    assert_eq!(item.average_unit_cost, dec!(500));
}

#[tokio::test]
async fn ordering_more_than_stock_is_rejected() {
    let app = TestApp::new().await;
    let item = app.seed_stocked_item("Tablet", 2, dec!(300)).await;
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
                    quantity: 3,
                    unit_price: Some(dec!(400)),
                }],
                payment_method: None,
                promotion_id: None,
                shipping_address: None,
                notes: None,
            },
            "seller",
        )
        .await
        .expect_err("insufficient stock must fail");
    assert!(matches!(err, ServiceError::InsufficientStock(_)));

    // Nothing was decremented by the failed order.
    let item = app
        .services
        .inventory
        .get_item(item.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item.quantity, 2);
}

#[tokio::test]
async fn unknown_references_are_rejected() {
    let app = TestApp::new().await;
    let item = app.seed_stocked_item("Phone", 5, dec!(200)).await;

    let err = app
        .services
        .orders
        .create_order(
            CreateOrderRequest {
                customer_id: Uuid::new_v4(),
                employee_id: None,
                items: vec![CreateOrderLine {
                    item_id: item.id,
                    variant_id: None,
                    quantity: 1,
                    unit_price: None,
                }],
                payment_method: None,
                promotion_id: None,
                shipping_address: None,
                notes: None,
            },
            "seller",
        )
        .await
        .expect_err("unknown customer must fail");
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn partial_payment_moves_order_to_waiting_then_full_payment_to_processing() {
    let app = TestApp::new().await;
    let order = place_order(&app, 3).await; // total 2400

    let after_partial = app
        .services
        .orders
        .record_payment(
            order.id,
            RecordPaymentRequest {
                method: "cash".to_string(),
                amount: dec!(1000),
            },
            "cashier",
        )
        .await
        .unwrap();
    assert_eq!(after_partial.payment_status, PaymentStatus::Partpaid);
    assert_eq!(after_partial.status, OrderStatus::Waiting);
    assert_eq!(after_partial.payments.len(), 1);

    let after_full = app
        .services
        .orders
        .record_payment(
            order.id,
            RecordPaymentRequest {
                method: "transfer".to_string(),
                amount: dec!(1400),
            },
            "cashier",
        )
        .await
        .unwrap();
    assert_eq!(after_full.payment_status, PaymentStatus::Paid);
    assert_eq!(after_full.status, OrderStatus::Processing);
    assert_eq!(after_full.payments.len(), 2);

    // A settled order accepts no further payments.
    let err = app
        .services
        .orders
        .record_payment(
            order.id,
            RecordPaymentRequest {
                method: "cash".to_string(),
                amount: dec!(1),
            },
            "cashier",
        )
        .await
        .expect_err("settled order must refuse payments");
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn forward_transitions_walk_to_delivered_and_backwards_is_refused() {
    let app = TestApp::new().await;
    let order = place_order(&app, 1).await;

    app.services
        .orders
        .record_payment(
            order.id,
            RecordPaymentRequest {
                method: "cash".to_string(),
                amount: dec!(800),
            },
            "cashier",
        )
        .await
        .unwrap();

    let shipped = app
        .services
        .orders
        .update_status(order.id, OrderStatus::Shipping)
        .await
        .unwrap();
    assert_eq!(shipped.status, OrderStatus::Shipping);

    let err = app
        .services
        .orders
        .update_status(order.id, OrderStatus::Pending)
        .await
        .expect_err("going backwards must fail");
    assert!(matches!(err, ServiceError::InvalidStatus(_)));

    let delivered = app
        .services
        .orders
        .update_status(order.id, OrderStatus::Delivered)
        .await
        .unwrap();
    assert_eq!(delivered.status, OrderStatus::Delivered);

    // Delivered is terminal for the forward path too.
    let err = app
        .services
        .orders
        .update_status(order.id, OrderStatus::Shipping)
        .await
        .expect_err("leaving delivered must fail");
    assert!(matches!(err, ServiceError::InvalidStatus(_)));
}

#[tokio::test]
async fn cancel_via_status_update_is_refused() {
    let app = TestApp::new().await;
    let order = place_order(&app, 1).await;

    let err = app
        .services
        .orders
        .update_status(order.id, OrderStatus::Canceled)
        .await
        .expect_err("cancel must use the cancel operation");
    assert!(matches!(err, ServiceError::InvalidStatus(_)));
}

#[tokio::test]
async fn cancellation_restores_stock_and_is_terminal() {
    let app = TestApp::new().await;
    let order = place_order(&app, 4).await;
    let item_id = order.items[0].item_id;

    let before = app
        .services
        .inventory
        .get_item(item_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(before.quantity, 6);

    let canceled = app
        .services
        .orders
        .cancel_order(order.id, Some("customer changed their mind".to_string()), "seller")
        .await
        .unwrap();
    assert_eq!(canceled.status, OrderStatus::Canceled);
    assert_eq!(
        canceled.cancel_reason.as_deref(),
        Some("customer changed their mind")
    );
    // The historical total is retained on the canceled order.
    assert_eq!(canceled.total_amount, order.total_amount);

    let after = app
        .services
        .inventory
        .get_item(item_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.quantity, 10);
    assert_eq!(after.average_unit_cost, dec!(500));

    // Terminal: a second cancellation fails.
    let err = app
        .services
        .orders
        .cancel_order(order.id, None, "seller")
        .await
        .expect_err("second cancel must fail");
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn cancelling_a_paid_order_marks_it_refunded() {
    let app = TestApp::new().await;
    let order = place_order(&app, 1).await;

    app.services
        .orders
        .record_payment(
            order.id,
            RecordPaymentRequest {
                method: "cash".to_string(),
                amount: dec!(800),
            },
            "cashier",
        )
        .await
        .unwrap();

    let canceled = app
        .services
        .orders
        .cancel_order(order.id, None, "manager")
        .await
        .unwrap();
    assert_eq!(canceled.payment_status, PaymentStatus::Refunded);
}

#[tokio::test]
async fn delivered_orders_cannot_be_canceled() {
    let app = TestApp::new().await;
    let order = place_order(&app, 1).await;

    app.services
        .orders
        .record_payment(
            order.id,
            RecordPaymentRequest {
                method: "cash".to_string(),
                amount: dec!(800),
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

    let err = app
        .services
        .orders
        .cancel_order(order.id, None, "manager")
        .await
        .expect_err("delivered orders are final");
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
}
