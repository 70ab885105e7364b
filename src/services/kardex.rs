use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::{
        app_user, inventory_movement, movement_reason, product, warehouse, MovementType,
    },
    errors::ServiceError,
};

/// Hard cap on kardex page size; larger requests are clamped, not rejected.
pub const MAX_PAGE_SIZE: u64 = 200;
pub const DEFAULT_PAGE_SIZE: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum KardexSortKey {
    /// Creation time (default, newest first)
    #[default]
    Fecha,
    /// Movement type
    Tipo,
    /// Signed quantity
    Cantidad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Default)]
pub struct KardexFilter {
    pub product_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    pub movement_type: Option<MovementType>,
    /// Inclusive lower bound on creation time
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on creation time
    pub to: Option<DateTime<Utc>>,
}

/// A kardex row denormalized for display.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct KardexRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_code: Option<String>,
    pub product_name: Option<String>,
    pub warehouse_id: Uuid,
    pub warehouse_name: Option<String>,
    pub movement_type: String,
    pub quantity: i32,
    pub stock_before: i32,
    pub stock_after: i32,
    /// Resolved label: catalog name when the movement carries a reason_id,
    /// otherwise the legacy free text.
    pub reason: Option<String>,
    pub document_ref: Option<String>,
    pub user_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct KardexPage {
    pub rows: Vec<KardexRow>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub pages: u64,
}

/// Read-only, lock-free queries over the movement ledger.
#[derive(Clone)]
pub struct KardexQueryService {
    db: Arc<DatabaseConnection>,
}

impl KardexQueryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn query(
        &self,
        filter: KardexFilter,
        page: u64,
        page_size: u64,
        sort_by: KardexSortKey,
        order: SortOrder,
    ) -> Result<KardexPage, ServiceError> {
        let db = &*self.db;

        let limit = page_size.clamp(1, MAX_PAGE_SIZE);
        let page = page.max(1);

        let mut query = inventory_movement::Entity::find();

        if let Some(product_id) = filter.product_id {
            query = query.filter(inventory_movement::Column::ProductId.eq(product_id));
        }
        if let Some(warehouse_id) = filter.warehouse_id {
            query = query.filter(inventory_movement::Column::WarehouseId.eq(warehouse_id));
        }
        if let Some(movement_type) = filter.movement_type {
            query = query.filter(inventory_movement::Column::MovementType.eq(movement_type.as_str()));
        }
        if let Some(from) = filter.from {
            query = query.filter(inventory_movement::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(inventory_movement::Column::CreatedAt.lte(to));
        }

        let sort_column = match sort_by {
            KardexSortKey::Fecha => inventory_movement::Column::CreatedAt,
            KardexSortKey::Tipo => inventory_movement::Column::MovementType,
            KardexSortKey::Cantidad => inventory_movement::Column::Quantity,
        };
        query = match order {
            SortOrder::Asc => query.order_by_asc(sort_column),
            SortOrder::Desc => query.order_by_desc(sort_column),
        };

        let paginator = query.paginate(db, limit);
        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::db_error)?;
        let movements = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::db_error)?;

        let rows = self.denormalize(movements).await?;

        let pages = std::cmp::max(1, total.div_ceil(limit));

        Ok(KardexPage {
            rows,
            total,
            page,
            limit,
            pages,
        })
    }

    /// Batch-loads the display names for the page instead of joining:
    /// four lookups bounded by the page size.
    async fn denormalize(
        &self,
        movements: Vec<inventory_movement::Model>,
    ) -> Result<Vec<KardexRow>, ServiceError> {
        let db = &*self.db;

        let product_ids: Vec<Uuid> = dedupe(movements.iter().map(|m| m.product_id));
        let warehouse_ids: Vec<Uuid> = dedupe(movements.iter().map(|m| m.warehouse_id));
        let reason_ids: Vec<Uuid> = dedupe(movements.iter().filter_map(|m| m.reason_id));
        let user_ids: Vec<Uuid> = dedupe(movements.iter().filter_map(|m| m.user_id));

        let products: HashMap<Uuid, product::Model> = if product_ids.is_empty() {
            HashMap::new()
        } else {
            product::Entity::find()
                .filter(product::Column::Id.is_in(product_ids))
                .all(db)
                .await
                .map_err(ServiceError::db_error)?
                .into_iter()
                .map(|p| (p.id, p))
                .collect()
        };

        let warehouses: HashMap<Uuid, warehouse::Model> = if warehouse_ids.is_empty() {
            HashMap::new()
        } else {
            warehouse::Entity::find()
                .filter(warehouse::Column::Id.is_in(warehouse_ids))
                .all(db)
                .await
                .map_err(ServiceError::db_error)?
                .into_iter()
                .map(|w| (w.id, w))
                .collect()
        };

        let reasons: HashMap<Uuid, movement_reason::Model> = if reason_ids.is_empty() {
            HashMap::new()
        } else {
            movement_reason::Entity::find()
                .filter(movement_reason::Column::Id.is_in(reason_ids))
                .all(db)
                .await
                .map_err(ServiceError::db_error)?
                .into_iter()
                .map(|r| (r.id, r))
                .collect()
        };

        let users: HashMap<Uuid, app_user::Model> = if user_ids.is_empty() {
            HashMap::new()
        } else {
            app_user::Entity::find()
                .filter(app_user::Column::Id.is_in(user_ids))
                .all(db)
                .await
                .map_err(ServiceError::db_error)?
                .into_iter()
                .map(|u| (u.id, u))
                .collect()
        };

        let rows = movements
            .into_iter()
            .map(|m| {
                let reason = m
                    .reason_id
                    .and_then(|id| reasons.get(&id).map(|r| r.name.clone()))
                    .or_else(|| m.reason.clone());

                KardexRow {
                    id: m.id,
                    product_id: m.product_id,
                    product_code: products.get(&m.product_id).map(|p| p.code.clone()),
                    product_name: products.get(&m.product_id).map(|p| p.name.clone()),
                    warehouse_id: m.warehouse_id,
                    warehouse_name: warehouses.get(&m.warehouse_id).map(|w| w.name.clone()),
                    movement_type: m.movement_type,
                    quantity: m.quantity,
                    stock_before: m.stock_before,
                    stock_after: m.stock_after,
                    reason,
                    document_ref: m.document_ref,
                    user_name: m.user_id.and_then(|id| users.get(&id).map(|u| u.full_name.clone())),
                    created_at: m.created_at,
                }
            })
            .collect();

        Ok(rows)
    }
}

fn dedupe<I: Iterator<Item = Uuid>>(ids: I) -> Vec<Uuid> {
    let mut seen = std::collections::BTreeSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}
