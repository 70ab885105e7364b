use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, EntityTrait,
    IsolationLevel, QueryFilter, TransactionTrait,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::{movement_reason, product, warehouse, MovementType},
    errors::ServiceError,
    events::{Event, EventSender},
    services::stock,
};

/// Catalog code of the canonical goods-in reason, seeded by the migrations.
pub const PURCHASE_RECEIPT_REASON_CODE: &str = "COMPRA";

#[derive(Debug, Clone)]
pub struct ReceiptItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct PurchaseReceipt {
    pub purchase_id: String,
    pub warehouse_id: Uuid,
    pub items: Vec<ReceiptItem>,
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct ReceiptLineOutcome {
    pub movement_id: Uuid,
    pub product_id: Uuid,
    pub stock_before: i32,
    pub stock_after: i32,
}

/// Applies multi-line purchase receipts: every tracked line becomes an
/// ENTRADA movement against one warehouse, and the whole batch commits or
/// rolls back as a unit.
#[derive(Clone)]
pub struct ReceiptService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

impl ReceiptService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Receives goods for a purchase. Untracked products are skipped line by
    /// line; every other failure aborts the batch. The product aggregate is
    /// recomputed once per distinct product, after all lines are written.
    ///
    /// Concurrent receipts touching the same product can both read the same
    /// `stock_before`; SERIALIZABLE isolation turns that race into a
    /// reported conflict instead of a lost update. The caller retries.
    #[instrument(skip(self, receipt), fields(purchase_id = %receipt.purchase_id, warehouse_id = %receipt.warehouse_id, lines = receipt.items.len()))]
    pub async fn apply_receipt(
        &self,
        receipt: PurchaseReceipt,
    ) -> Result<Vec<ReceiptLineOutcome>, ServiceError> {
        if receipt.purchase_id.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "purchase_id is required".to_string(),
            ));
        }
        if receipt.warehouse_id.is_nil() {
            return Err(ServiceError::ValidationError(
                "warehouse_id is required".to_string(),
            ));
        }
        if receipt.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "a receipt requires at least one item".to_string(),
            ));
        }
        if let Some(item) = receipt.items.iter().find(|i| i.quantity <= 0) {
            return Err(ServiceError::ValidationError(format!(
                "received quantity for product {} must be positive",
                item.product_id
            )));
        }

        let txn = self.begin_serializable().await?;

        warehouse::Entity::find_by_id(receipt.warehouse_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Warehouse {} not found", receipt.warehouse_id))
            })?;

        // One canonical reason for every line of the receipt.
        let reason = find_purchase_reason(&txn).await?;

        let mut outcomes = Vec::with_capacity(receipt.items.len());
        let mut touched: BTreeSet<Uuid> = BTreeSet::new();

        for item in &receipt.items {
            let product = product::Entity::find_by_id(item.product_id)
                .one(&txn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", item.product_id))
                })?;

            if !product.track_inventory {
                debug!(product = %product.code, "skipping untracked product on receipt");
                continue;
            }

            let applied = stock::apply_stock_change(
                &txn,
                stock::StockChange {
                    product: &product,
                    warehouse_id: receipt.warehouse_id,
                    movement_type: MovementType::Entrada,
                    delta: item.quantity,
                    reason_id: Some(reason.id),
                    reason_text: None,
                    document_ref: Some(receipt.purchase_id.clone()),
                    user_id: None,
                },
            )
            .await?;

            touched.insert(product.id);
            outcomes.push(ReceiptLineOutcome {
                movement_id: applied.movement_id,
                product_id: product.id,
                stock_before: applied.stock_before,
                stock_after: applied.stock_after,
            });
        }

        for product_id in &touched {
            stock::recompute_product_stock(&txn, *product_id).await?;
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(
            purchase_id = %receipt.purchase_id,
            lines = outcomes.len(),
            products = touched.len(),
            "purchase receipt committed"
        );

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::ReceiptApplied {
                    purchase_id: receipt.purchase_id.clone(),
                    warehouse_id: receipt.warehouse_id,
                    lines: outcomes.len(),
                })
                .await;
        }

        Ok(outcomes)
    }

    /// SQLite serializes writers on its own, and sea-orm only supports
    /// isolation configuration on the server backends.
    async fn begin_serializable(&self) -> Result<DatabaseTransaction, ServiceError> {
        match self.db.get_database_backend() {
            DbBackend::Postgres | DbBackend::MySql => self
                .db
                .begin_with_config(Some(IsolationLevel::Serializable), None)
                .await
                .map_err(ServiceError::db_error),
            _ => self.db.begin().await.map_err(ServiceError::db_error),
        }
    }
}

async fn find_purchase_reason<C: ConnectionTrait>(
    conn: &C,
) -> Result<movement_reason::Model, ServiceError> {
    movement_reason::Entity::find()
        .filter(movement_reason::Column::MovementType.eq(MovementType::Entrada.as_str()))
        .filter(movement_reason::Column::Code.eq(PURCHASE_RECEIPT_REASON_CODE))
        .filter(movement_reason::Column::Active.eq(true))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "Movement reason {} is missing from the catalog",
                PURCHASE_RECEIPT_REASON_CODE
            ))
        })
}
