use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Ledger side-effect notifications. These are fired after the owning
/// transaction commits; the audit consumer is fire-and-forget and a lost
/// event never affects stock correctness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    StockAdjusted {
        product_id: Uuid,
        warehouse_id: Uuid,
        movement_id: Uuid,
        stock_before: i32,
        stock_after: i32,
        user_id: Option<Uuid>,
    },
    ReceiptApplied {
        purchase_id: String,
        warehouse_id: Uuid,
        lines: usize,
    },
    ReasonDeactivated {
        reason_id: Uuid,
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

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is closed.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Dropping event: {}", e);
        }
    }
}

/// Drains the event channel, logging each event. This is the boundary where
/// an audit-log writer would hook in.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::StockAdjusted {
                product_id,
                warehouse_id,
                movement_id,
                stock_before,
                stock_after,
                ..
            } => {
                info!(
                    %product_id,
                    %warehouse_id,
                    %movement_id,
                    stock_before,
                    stock_after,
                    "stock adjusted"
                );
            }
            Event::ReceiptApplied {
                purchase_id,
                warehouse_id,
                lines,
            } => {
                info!(%purchase_id, %warehouse_id, lines, "purchase receipt applied");
            }
            Event::ReasonDeactivated { reason_id } => {
                info!(%reason_id, "movement reason deactivated");
            }
        }
    }
    info!("Event channel closed, processor exiting");
}
