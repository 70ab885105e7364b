use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait,
    QueryFilter,
};
use uuid::Uuid;

use crate::{
    entities::{
        inventory_movement, product,
        stock_by_warehouse::{self, Entity as StockByWarehouse},
        MovementType,
    },
    errors::ServiceError,
};

/// One stock-affecting change, applied against a caller-owned transaction.
/// Both engines funnel through [`apply_stock_change`] so the balance upsert
/// and the ledger append always happen together.
#[derive(Debug)]
pub struct StockChange<'a> {
    pub product: &'a product::Model,
    pub warehouse_id: Uuid,
    pub movement_type: MovementType,
    /// Signed delta; negative values decrease the balance.
    pub delta: i32,
    pub reason_id: Option<Uuid>,
    pub reason_text: Option<String>,
    pub document_ref: Option<String>,
    pub user_id: Option<Uuid>,
}

/// Snapshot returned for every committed movement.
#[derive(Debug, Clone, Copy)]
pub struct AppliedMovement {
    pub movement_id: Uuid,
    pub stock_before: i32,
    pub stock_after: i32,
}

/// Looks up the balance row for a `(product, warehouse)` pair.
pub async fn find_balance<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    warehouse_id: Uuid,
) -> Result<Option<stock_by_warehouse::Model>, ServiceError> {
    StockByWarehouse::find()
        .filter(stock_by_warehouse::Column::ProductId.eq(product_id))
        .filter(stock_by_warehouse::Column::WarehouseId.eq(warehouse_id))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)
}

/// Reads the current balance, bounds-checks the resulting quantity, upserts
/// the balance row and appends the kardex movement, all on `conn`.
///
/// The balance row is created lazily on the first movement into a warehouse,
/// inheriting `min_stock` from the product; zero-quantity rows persist.
pub async fn apply_stock_change<C: ConnectionTrait>(
    conn: &C,
    change: StockChange<'_>,
) -> Result<AppliedMovement, ServiceError> {
    let existing = find_balance(conn, change.product.id, change.warehouse_id).await?;

    let stock_before = existing.as_ref().map(|b| b.quantity).unwrap_or(0);
    let stock_after = stock_before + change.delta;

    if stock_after < 0 {
        return Err(ServiceError::NegativeStock(format!(
            "resulting stock for product {} in warehouse {} would be {}",
            change.product.code, change.warehouse_id, stock_after
        )));
    }

    let now = Utc::now();
    match existing {
        Some(balance) => {
            let mut active: stock_by_warehouse::ActiveModel = balance.into();
            active.quantity = Set(stock_after);
            active.updated_at = Set(now);
            active.update(conn).await.map_err(ServiceError::db_error)?;
        }
        None => {
            let balance = stock_by_warehouse::ActiveModel {
                id: Set(Uuid::new_v4()),
                product_id: Set(change.product.id),
                warehouse_id: Set(change.warehouse_id),
                quantity: Set(stock_after),
                min_stock: Set(change.product.min_stock),
                created_at: Set(now),
                updated_at: Set(now),
            };
            balance.insert(conn).await.map_err(ServiceError::db_error)?;
        }
    }

    let movement_id = Uuid::new_v4();
    let movement = inventory_movement::ActiveModel {
        id: Set(movement_id),
        product_id: Set(change.product.id),
        warehouse_id: Set(change.warehouse_id),
        movement_type: Set(change.movement_type.as_str().to_string()),
        quantity: Set(change.delta),
        stock_before: Set(stock_before),
        stock_after: Set(stock_after),
        reason: Set(change.reason_text),
        reason_id: Set(change.reason_id),
        document_ref: Set(change.document_ref),
        user_id: Set(change.user_id),
        created_at: Set(now),
    };
    movement.insert(conn).await.map_err(ServiceError::db_error)?;

    Ok(AppliedMovement {
        movement_id,
        stock_before,
        stock_after,
    })
}

/// Recomputes the denormalized product aggregate as the sum of its
/// per-warehouse balances and writes it back. Runs inside the same
/// transaction as the ledger append that invalidated it.
pub async fn recompute_product_stock<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
) -> Result<i32, ServiceError> {
    let balances = StockByWarehouse::find()
        .filter(stock_by_warehouse::Column::ProductId.eq(product_id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;

    let total: i32 = balances.iter().map(|b| b.quantity).sum();

    product::Entity::update_many()
        .col_expr(product::Column::Stock, Expr::value(total))
        .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(product::Column::Id.eq(product_id))
        .exec(conn)
        .await
        .map_err(ServiceError::db_error)?;

    Ok(total)
}

/// Effective low-stock threshold for a balance row: the warehouse-local
/// override wins, then the product default, then 0 (alerts disabled).
pub fn resolve_threshold(
    balance: &stock_by_warehouse::Model,
    product: Option<&product::Model>,
) -> i32 {
    balance
        .min_stock
        .or_else(|| product.and_then(|p| p.min_stock))
        .unwrap_or(0)
}

/// Per-warehouse stock breakdown for one product, plus the cached aggregate.
pub async fn product_stock_breakdown<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
) -> Result<(product::Model, Vec<stock_by_warehouse::Model>), ServiceError> {
    let product = product::Entity::find_by_id(product_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

    let balances = StockByWarehouse::find()
        .filter(stock_by_warehouse::Column::ProductId.eq(product_id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;

    Ok((product, balances))
}
