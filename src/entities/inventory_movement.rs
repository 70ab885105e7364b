use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable kardex row. `quantity` is a signed delta for every movement
/// type, and `stock_after = stock_before + quantity` is guaranteed at the
/// moment of creation. Rows are never updated or deleted; corrections are
/// expressed as new AJUSTE movements.
///
/// `reason_id` points into the reason catalog; `reason` carries legacy free
/// text. The coded path leaves `reason` empty so the two are never both set.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub movement_type: String,
    pub quantity: i32,
    pub stock_before: i32,
    pub stock_after: i32,
    pub reason: Option<String>,
    pub reason_id: Option<Uuid>,
    pub document_ref: Option<String>,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::warehouse::Entity",
        from = "Column::WarehouseId",
        to = "super::warehouse::Column::Id"
    )]
    Warehouse,
    #[sea_orm(
        belongs_to = "super::movement_reason::Entity",
        from = "Column::ReasonId",
        to = "super::movement_reason::Column::Id"
    )]
    MovementReason,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::warehouse::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Warehouse.def()
    }
}

impl Related<super::movement_reason::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovementReason.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
