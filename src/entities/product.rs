use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Product catalog record. `stock` is the denormalized sum of the
/// per-warehouse balances and is recomputed by the ledger engines;
/// it is never an independent source of truth.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    pub stock: i32,
    pub min_stock: Option<i32>,
    pub track_inventory: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stock_by_warehouse::Entity")]
    StockByWarehouse,
    #[sea_orm(has_many = "super::inventory_movement::Entity")]
    InventoryMovement,
}

impl Related<super::stock_by_warehouse::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockByWarehouse.def()
    }
}

impl Related<super::inventory_movement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryMovement.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
