use crate::{
    db::DbPool,
    entities::attribute_set::AttributeSet,
    entities::customer::Entity as CustomerEntity,
    entities::employee::Entity as EmployeeEntity,
    entities::inventory_item::Entity as ItemEntity,
    entities::inventory_variant::{self, Entity as VariantEntity},
    entities::order::{
        self, Entity as OrderEntity, Model as OrderModel, OrderStatus, PaymentStatus,
    },
    entities::order_item::{self, Entity as OrderItemEntity, Model as OrderItemModel},
    entities::order_payment::{self, Entity as OrderPaymentEntity, Model as OrderPaymentModel},
    entities::promotion::Entity as PromotionEntity,
    errors::ServiceError,
    events::{Event, EventSender},
    services::inventory::{decrement_stock, restore_stock},
    services::promotions::compute_discount,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
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

/// Request/Response types for the order service
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    pub customer_id: Uuid,
    pub employee_id: Option<Uuid>,
    #[validate(length(min = 1, message = "An order needs at least one line"))]
    pub items: Vec<CreateOrderLine>,
    pub payment_method: Option<String>,
    pub promotion_id: Option<Uuid>,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateOrderLine {
    pub item_id: Uuid,
    /// Required for variant items, forbidden for plain items.
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    /// Sale price per unit; falls back to the item's average unit cost.
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RecordPaymentRequest {
    #[validate(length(min = 1, message = "Payment method is required"))]
    pub method: String,
    pub amount: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderLineResponse {
    pub id: Uuid,
    pub item_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub name: String,
    pub attributes: Option<AttributeSet>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub method: String,
    pub amount: Decimal,
    pub paid_at: DateTime<Utc>,
    pub recorded_by: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub employee_id: Option<Uuid>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    pub promotion_id: Option<Uuid>,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
    pub cancel_reason: Option<String>,
    pub items: Vec<OrderLineResponse>,
    pub payments: Vec<PaymentResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Derives the settlement state from the cumulative paid amount. Pure: the
/// stored `payment_status` is always recomputable from the payment rows.
pub fn derive_payment_status(paid: Decimal, total: Decimal) -> PaymentStatus {
    if paid <= Decimal::ZERO {
        PaymentStatus::Unpaid
    } else if paid < total {
        PaymentStatus::Partpaid
    } else {
        PaymentStatus::Paid
    }
}

/// Forward status transitions. Cancellation is handled separately because it
/// restores stock; delivered and canceled are terminal.
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
        (from, to),
        (Pending, Waiting)
            | (Pending, Processing)
            | (Waiting, Processing)
            | (Processing, Shipping)
            | (Shipping, Delivered)
    )
}

/// Service for managing the order lifecycle. Every mutation runs inside one
/// database transaction: creation decrements stock with the order insert,
/// payment recording advances the status with the payment insert, and
/// cancellation restores stock with the terminal status write.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates an order, snapshotting item names and prices so later catalog
    /// changes never alter it, and decrementing stock for each line.
    #[instrument(skip(self, request), fields(customer_id = %request.customer_id, actor = %actor))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
        actor: &str,
    ) -> Result<OrderResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        for line in &request.items {
            if line.quantity <= 0 {
                return Err(ServiceError::ValidationError(
                    "Line quantity must be a positive number".to_string(),
                ));
            }
        }

        let db = &*self.db_pool;
        let now = Utc::now();
        let order_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        if CustomerEntity::find_by_id(request.customer_id)
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(ServiceError::ValidationError(format!(
                "Order references an unknown customer ({})",
                request.customer_id
            )));
        }
        if let Some(employee_id) = request.employee_id {
            if EmployeeEntity::find_by_id(employee_id)
                .one(&txn)
                .await?
                .is_none()
            {
                return Err(ServiceError::ValidationError(format!(
                    "Order references an unknown employee ({})",
                    employee_id
                )));
            }
        }

        let mut line_models = Vec::with_capacity(request.items.len());
        let mut subtotal = Decimal::ZERO;

        for line in &request.items {
            let item = ItemEntity::find_by_id(line.item_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "Order references an unknown item ({})",
                        line.item_id
                    ))
                })?;

            let variant = match (item.has_variants, line.variant_id) {
                (true, Some(variant_id)) => {
                    let variant = VariantEntity::find_by_id(variant_id)
                        .filter(inventory_variant::Column::ItemId.eq(item.id))
                        .one(&txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::ValidationError(format!(
                                "Order references an unknown variant ({}) of item {}",
                                variant_id, item.code
                            ))
                        })?;
                    Some(variant)
                }
                (true, None) => {
                    return Err(ServiceError::ValidationError(format!(
                        "Item {} has variants; a variant must be selected",
                        item.code
                    )))
                }
                (false, Some(_)) => {
                    return Err(ServiceError::ValidationError(format!(
                        "Item {} does not have variants",
                        item.code
                    )))
                }
                (false, None) => None,
            };

            let unit_cost = decrement_stock(&txn, &item, variant.as_ref(), line.quantity).await?;
            let unit_price = line.unit_price.unwrap_or(unit_cost);
            if unit_price <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Line unit price must be a positive number".to_string(),
                ));
            }
            let total_price = unit_price * Decimal::from(line.quantity);
            subtotal += total_price;

            line_models.push(order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                item_id: Set(item.id),
                variant_id: Set(variant.as_ref().map(|v| v.id)),
                name: Set(item.name.clone()),
                attributes: Set(variant.as_ref().map(|v| v.attributes.clone())),
                quantity: Set(line.quantity),
                unit_price: Set(unit_price),
                unit_cost: Set(unit_cost),
                total_price: Set(total_price),
            });
        }

        let discount_amount = match request.promotion_id {
            Some(promotion_id) => {
                let promotion = PromotionEntity::find_by_id(promotion_id)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::ValidationError(format!(
                            "Order references an unknown promotion ({})",
                            promotion_id
                        ))
                    })?;
                compute_discount(&promotion, subtotal, now)?
            }
            None => Decimal::ZERO,
        };

        let order_active = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(generate_order_number(order_id)),
            customer_id: Set(request.customer_id),
            employee_id: Set(request.employee_id),
            status: Set(OrderStatus::Pending),
            payment_status: Set(PaymentStatus::Unpaid),
            payment_method: Set(request.payment_method.clone()),
            total_amount: Set(subtotal - discount_amount),
            discount_amount: Set(discount_amount),
            promotion_id: Set(request.promotion_id),
            shipping_address: Set(request.shipping_address.clone()),
            notes: Set(request.notes.clone()),
            cancel_reason: Set(None),
            created_by: Set(actor.to_string()),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            version: Set(1),
        };
        let order_model = order_active.insert(&txn).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to create order");
            ServiceError::DatabaseError(e)
        })?;

        let mut item_models = Vec::with_capacity(line_models.len());
        for line in line_models {
            item_models.push(line.insert(&txn).await?);
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit order creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, order_number = %order_model.order_number, "Order created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::OrderCreated(order_id)).await {
                warn!(error = %e, order_id = %order_id, "Failed to send order created event");
            }
        }

        Ok(order_to_response(order_model, item_models, Vec::new()))
    }

    /// Records a payment and rederives the settlement state in the same
    /// transaction; a fresh payment advances `pending` to `waiting` or
    /// `processing`.
    #[instrument(skip(self, request), fields(order_id = %order_id, actor = %actor))]
    pub async fn record_payment(
        &self,
        order_id: Uuid,
        request: RecordPaymentRequest,
        actor: &str,
    ) -> Result<OrderResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        if request.amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Payment amount must be a positive number".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let order = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if order.status == OrderStatus::Canceled {
            return Err(ServiceError::InvalidOperation(
                "Canceled orders cannot accept payments".to_string(),
            ));
        }
        if matches!(
            order.payment_status,
            PaymentStatus::Paid | PaymentStatus::Refunded
        ) {
            return Err(ServiceError::InvalidOperation(
                "Order is already settled".to_string(),
            ));
        }

        let payment = order_payment::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            method: Set(request.method.clone()),
            amount: Set(request.amount),
            paid_at: Set(now),
            recorded_by: Set(actor.to_string()),
        };
        payment.insert(&txn).await?;

        let payments = OrderPaymentEntity::find()
            .filter(order_payment::Column::OrderId.eq(order_id))
            .all(&txn)
            .await?;
        let paid_total: Decimal = payments.iter().map(|p| p.amount).sum();
        let payment_status = derive_payment_status(paid_total, order.total_amount);

        let old_status = order.status;
        let new_status = match (order.status, payment_status) {
            (OrderStatus::Pending, PaymentStatus::Paid) => OrderStatus::Processing,
            (OrderStatus::Pending, PaymentStatus::Partpaid) => OrderStatus::Waiting,
            (OrderStatus::Waiting, PaymentStatus::Paid) => OrderStatus::Processing,
            (status, _) => status,
        };

        let mut order_active: order::ActiveModel = order.into();
        order_active.payment_status = Set(payment_status);
        order_active.status = Set(new_status);
        order_active.updated_at = Set(Some(now));
        order_active.version = Set(order_active.version.unwrap() + 1);
        let updated = order_active.update(&txn).await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(
            order_id = %order_id,
            amount = %request.amount,
            payment_status = ?payment_status,
            "Payment recorded"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::PaymentRecorded {
                    order_id,
                    amount: request.amount,
                    payment_status,
                })
                .await
            {
                warn!(error = %e, order_id = %order_id, "Failed to send payment event");
            }
            if new_status != old_status {
                let _ = event_sender
                    .send(Event::OrderStatusChanged {
                        order_id,
                        old_status,
                        new_status,
                    })
                    .await;
            }
        }

        self.load_order_response(updated.id).await
    }

    /// Advances an order along the forward path. Cancellation must go
    /// through [`OrderService::cancel_order`] because it restores stock.
    #[instrument(skip(self), fields(order_id = %order_id, new_status = ?new_status))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<OrderResponse, ServiceError> {
        if new_status == OrderStatus::Canceled {
            return Err(ServiceError::InvalidStatus(
                "Use the cancel operation to cancel an order".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let order = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let old_status = order.status;
        if old_status == new_status {
            txn.commit().await.map_err(ServiceError::DatabaseError)?;
            return self.load_order_response(order_id).await;
        }
        if !can_transition(old_status, new_status) {
            return Err(ServiceError::InvalidStatus(format!(
                "Cannot transition from {:?} to {:?}",
                old_status, new_status
            )));
        }

        let mut order_active: order::ActiveModel = order.into();
        order_active.status = Set(new_status);
        order_active.updated_at = Set(Some(now));
        order_active.version = Set(order_active.version.unwrap() + 1);
        let updated = order_active.update(&txn).await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(order_id = %order_id, ?old_status, ?new_status, "Order status updated");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::OrderStatusChanged {
                    order_id,
                    old_status,
                    new_status,
                })
                .await
            {
                warn!(error = %e, order_id = %order_id, "Failed to send status changed event");
            }
        }

        self.load_order_response(updated.id).await
    }

    /// Cancels an order: terminal, restores every line's stock, and marks a
    /// settled order as refunded. Delivered orders cannot be canceled.
    #[instrument(skip(self), fields(order_id = %order_id, actor = %actor))]
    pub async fn cancel_order(
        &self,
        order_id: Uuid,
        reason: Option<String>,
        actor: &str,
    ) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let order = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        match order.status {
            OrderStatus::Delivered => {
                return Err(ServiceError::InvalidOperation(
                    "Delivered orders cannot be canceled".to_string(),
                ))
            }
            OrderStatus::Canceled => {
                return Err(ServiceError::InvalidOperation(
                    "Order is already canceled".to_string(),
                ))
            }
            _ => {}
        }

        let lines = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&txn)
            .await?;
        for line in &lines {
            restore_stock(
                &txn,
                line.item_id,
                line.variant_id,
                line.quantity,
                line.unit_cost,
            )
            .await?;
        }

        let old_status = order.status;
        let payment_status = if order.payment_status == PaymentStatus::Unpaid {
            PaymentStatus::Unpaid
        } else {
            PaymentStatus::Refunded
        };

        let mut order_active: order::ActiveModel = order.into();
        order_active.status = Set(OrderStatus::Canceled);
        order_active.payment_status = Set(payment_status);
        order_active.cancel_reason = Set(reason.or(Some(format!("Canceled by {}", actor))));
        order_active.updated_at = Set(Some(now));
        order_active.version = Set(order_active.version.unwrap() + 1);
        let updated = order_active.update(&txn).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit cancellation");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, ?old_status, restored_lines = lines.len(), "Order canceled");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::OrderCancelled(order_id)).await {
                warn!(error = %e, order_id = %order_id, "Failed to send order cancelled event");
            }
            for line in &lines {
                let _ = event_sender
                    .send(Event::InventoryRestored {
                        item_id: line.item_id,
                        quantity: line.quantity,
                    })
                    .await;
            }
        }

        self.load_order_response(updated.id).await
    }

    /// Retrieves an order with lines and payments.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<Option<OrderResponse>, ServiceError> {
        let db = &*self.db_pool;
        match OrderEntity::find_by_id(order_id).one(db).await? {
            Some(_) => Ok(Some(self.load_order_response(order_id).await?)),
            None => Ok(None),
        }
    }

    /// Lists orders with pagination and an optional status filter.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        page: u64,
        per_page: u64,
        status: Option<OrderStatus>,
    ) -> Result<OrderListResponse, ServiceError> {
        let db = &*self.db_pool;

        let mut query = OrderEntity::find().order_by_desc(order::Column::CreatedAt);
        if let Some(status) = status {
            query = query.filter(order::Column::Status.eq(status));
        }
        let paginator = query.paginate(db, per_page);

        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;

        let mut responses = Vec::with_capacity(orders.len());
        for order in orders {
            responses.push(self.load_order_response(order.id).await?);
        }

        Ok(OrderListResponse {
            orders: responses,
            total,
            page,
            per_page,
        })
    }

    async fn load_order_response(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;

        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;
        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(db)
            .await?;
        let payments = OrderPaymentEntity::find()
            .filter(order_payment::Column::OrderId.eq(order_id))
            .order_by_asc(order_payment::Column::PaidAt)
            .all(db)
            .await?;

        Ok(order_to_response(order, items, payments))
    }
}

fn generate_order_number(order_id: Uuid) -> String {
    let simple = order_id.simple().to_string();
    format!("SO-{}", simple[..12].to_ascii_uppercase())
}

fn order_to_response(
    order: OrderModel,
    items: Vec<OrderItemModel>,
    payments: Vec<OrderPaymentModel>,
) -> OrderResponse {
    OrderResponse {
        id: order.id,
        order_number: order.order_number,
        customer_id: order.customer_id,
        employee_id: order.employee_id,
        status: order.status,
        payment_status: order.payment_status,
        payment_method: order.payment_method,
        total_amount: order.total_amount,
        discount_amount: order.discount_amount,
        promotion_id: order.promotion_id,
        shipping_address: order.shipping_address,
        notes: order.notes,
        cancel_reason: order.cancel_reason,
        items: items
            .into_iter()
            .map(|i| OrderLineResponse {
                id: i.id,
                item_id: i.item_id,
                variant_id: i.variant_id,
                name: i.name,
                attributes: i.attributes,
                quantity: i.quantity,
                unit_price: i.unit_price,
                total_price: i.total_price,
            })
            .collect(),
        payments: payments
            .into_iter()
            .map(|p| PaymentResponse {
                id: p.id,
                method: p.method,
                amount: p.amount,
                paid_at: p.paid_at,
                recorded_by: p.recorded_by,
            })
            .collect(),
        created_at: order.created_at,
        updated_at: order.updated_at,
    }
}
