use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::entities::order::{OrderStatus, PaymentStatus};

/// Domain events emitted after successful state changes. Consumed by the
/// in-process logging processor; handlers never block on delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Order events
    OrderCreated(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: OrderStatus,
        new_status: OrderStatus,
    },
    OrderCancelled(Uuid),
    PaymentRecorded {
        order_id: Uuid,
        amount: Decimal,
        payment_status: PaymentStatus,
    },

    // Inventory events
    InventoryItemCreated(Uuid),
    InventoryBatchImported {
        item_id: Uuid,
        batch_number: String,
        quantity: i32,
    },
    InventoryRestored {
        item_id: Uuid,
        quantity: i32,
    },

    // Warranty events
    WarrantyCreated(Uuid),
    WarrantyActivated {
        warranty_id: Uuid,
        order_id: Uuid,
    },

    // Promotion events
    PromotionCreated(Uuid),

    // Customer / employee events
    CustomerCreated(Uuid),
    EmployeeCreated {
        employee_id: Uuid,
        user_id: Uuid,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Creates a bounded event channel and its sender handle.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Drains the event channel, logging each event. Runs until every sender is
/// dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        info!(event = ?event, "domain event");
    }
    info!("event channel closed, processor exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_to_receiver() {
        let (sender, mut rx) = channel(8);
        let order_id = Uuid::new_v4();
        sender.send(Event::OrderCreated(order_id)).await.unwrap();

        match rx.recv().await {
            Some(Event::OrderCreated(id)) => assert_eq!(id, order_id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_fails_once_receiver_is_dropped() {
        let (sender, rx) = channel(1);
        drop(rx);
        assert!(sender
            .send(Event::InventoryItemCreated(Uuid::new_v4()))
            .await
            .is_err());
    }
}
