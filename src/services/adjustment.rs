use sea_orm::{DatabaseConnection, EntityTrait, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::{movement_reason, product, MovementType},
    errors::ServiceError,
    events::{Event, EventSender},
    services::stock,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentDirection {
    Increment,
    Decrement,
}

/// The reason attached to a manual adjustment: either a catalog entry or
/// legacy free text. Exactly one of the two storage columns is populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReasonRef {
    Coded(Uuid),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct StockAdjustment {
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub magnitude: i32,
    pub direction: AdjustmentDirection,
    pub reason: ReasonRef,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct AdjustmentOutcome {
    pub movement_id: Uuid,
    pub stock_before: i32,
    pub stock_after: i32,
}

/// Executes manual stock corrections: one validated AJUSTE movement per
/// call, applied as a single transaction covering the balance upsert, the
/// ledger append and the product aggregate recompute.
#[derive(Clone)]
pub struct AdjustmentService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

impl AdjustmentService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Applies one manual adjustment. No writes survive a failure at any
    /// step: the transaction only commits after the aggregate is consistent.
    #[instrument(skip(self), fields(product_id = %adjustment.product_id, warehouse_id = %adjustment.warehouse_id))]
    pub async fn adjust(
        &self,
        adjustment: StockAdjustment,
    ) -> Result<AdjustmentOutcome, ServiceError> {
        if adjustment.product_id.is_nil() {
            return Err(ServiceError::ValidationError(
                "product_id is required".to_string(),
            ));
        }
        if adjustment.warehouse_id.is_nil() {
            return Err(ServiceError::ValidationError(
                "warehouse_id is required".to_string(),
            ));
        }
        if adjustment.magnitude <= 0 {
            return Err(ServiceError::ValidationError(
                "adjustment magnitude must be positive".to_string(),
            ));
        }

        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let product = product::Entity::find_by_id(adjustment.product_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", adjustment.product_id))
            })?;

        if !product.track_inventory {
            return Err(ServiceError::NotTracked(format!(
                "product {} does not track inventory",
                product.code
            )));
        }

        let (reason_id, reason_text) =
            resolve_reason(&txn, &adjustment.reason, MovementType::Ajuste).await?;

        let delta = match adjustment.direction {
            AdjustmentDirection::Increment => adjustment.magnitude,
            AdjustmentDirection::Decrement => -adjustment.magnitude,
        };

        let applied = stock::apply_stock_change(
            &txn,
            stock::StockChange {
                product: &product,
                warehouse_id: adjustment.warehouse_id,
                movement_type: MovementType::Ajuste,
                delta,
                reason_id,
                reason_text,
                document_ref: None,
                user_id: adjustment.user_id,
            },
        )
        .await?;

        let new_total = stock::recompute_product_stock(&txn, product.id).await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(
            product = %product.code,
            delta,
            stock_after = applied.stock_after,
            product_stock = new_total,
            "stock adjustment committed"
        );

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::StockAdjusted {
                    product_id: product.id,
                    warehouse_id: adjustment.warehouse_id,
                    movement_id: applied.movement_id,
                    stock_before: applied.stock_before,
                    stock_after: applied.stock_after,
                    user_id: adjustment.user_id,
                })
                .await;
        }

        Ok(AdjustmentOutcome {
            movement_id: applied.movement_id,
            stock_before: applied.stock_before,
            stock_after: applied.stock_after,
        })
    }

    /// Convenience entry point taking a single signed quantity; zero is
    /// rejected since it would record a movement with no effect.
    pub async fn adjust_signed(
        &self,
        product_id: Uuid,
        warehouse_id: Uuid,
        quantity: i32,
        reason: ReasonRef,
        user_id: Option<Uuid>,
    ) -> Result<AdjustmentOutcome, ServiceError> {
        if quantity == 0 {
            return Err(ServiceError::ValidationError(
                "adjustment quantity must not be zero".to_string(),
            ));
        }

        let direction = if quantity > 0 {
            AdjustmentDirection::Increment
        } else {
            AdjustmentDirection::Decrement
        };

        self.adjust(StockAdjustment {
            product_id,
            warehouse_id,
            magnitude: quantity.abs(),
            direction,
            reason,
            user_id,
        })
        .await
    }
}

/// Validates a reason reference against the catalog. Coded reasons must
/// exist, be active and belong to the given movement type; free text must be
/// non-blank.
pub(crate) async fn resolve_reason<C: sea_orm::ConnectionTrait>(
    conn: &C,
    reason: &ReasonRef,
    movement_type: MovementType,
) -> Result<(Option<Uuid>, Option<String>), ServiceError> {
    match reason {
        ReasonRef::Coded(id) => {
            let row = movement_reason::Entity::find_by_id(*id)
                .one(conn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Movement reason {} not found", id))
                })?;

            if !row.active {
                return Err(ServiceError::ValidationError(format!(
                    "movement reason {} is inactive",
                    row.code
                )));
            }

            let row_type = MovementType::from_str(&row.movement_type).map_err(|_| {
                ServiceError::InternalError(format!(
                    "movement reason {} has unknown type {}",
                    row.code, row.movement_type
                ))
            })?;
            if row_type != movement_type {
                return Err(ServiceError::ValidationError(format!(
                    "movement reason {} applies to {} movements",
                    row.code, row.movement_type
                )));
            }

            Ok((Some(*id), None))
        }
        ReasonRef::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(ServiceError::ValidationError(
                    "a movement reason is required".to_string(),
                ));
            }
            Ok((None, Some(trimmed.to_string())))
        }
    }
}
