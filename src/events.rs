use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::ProductKind;

/// Events emitted by the storefront services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Catalog events
    ProductCreated {
        kind: ProductKind,
        product_id: i64,
    },
    CategoryCreated(i32),

    // Cart events
    CartCreated(Uuid),
    CartItemAdded {
        cart_id: Uuid,
        kind: ProductKind,
        product_id: i64,
    },
    CartItemRemoved {
        cart_id: Uuid,
        line_id: Uuid,
    },
    CartUpdated(Uuid),
    CartCheckedOut(Uuid),

    // Customer events
    CustomerCreated(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the receiver is gone.
    /// Event delivery is best-effort; it never fails a storefront operation.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Dropped event: {}", e);
        }
    }
}

/// Background loop draining the event channel. Runs until every sender is
/// dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::CartCheckedOut(cart_id) => {
                info!(%cart_id, "Cart checked out");
            }
            Event::CustomerCreated(customer_id) => {
                info!(%customer_id, "Customer created");
            }
            other => {
                info!("Received event: {:?}", other);
            }
        }
    }

    info!("Event channel closed; stopping event processing loop");
}
