use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_catalog_tables::Migration),
            Box::new(m20240101_000002_create_movement_reasons_table::Migration),
            Box::new(m20240101_000003_create_stock_tables::Migration),
            Box::new(m20240101_000004_seed_movement_reasons::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_catalog_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Products::Code)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(
                            ColumnDef::new(Products::Stock)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Products::MinStock).integer().null())
                        .col(
                            ColumnDef::new(Products::TrackInventory)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Products::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Warehouses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Warehouses::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Warehouses::Code)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Warehouses::Name).string().not_null())
                        .col(
                            ColumnDef::new(Warehouses::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Warehouses::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Users::Username)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Users::FullName).string().not_null())
                        .col(
                            ColumnDef::new(Users::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Warehouses::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum Products {
        Table,
        Id,
        Code,
        Name,
        Stock,
        MinStock,
        TrackInventory,
        Active,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    pub enum Warehouses {
        Table,
        Id,
        Code,
        Name,
        Active,
        CreatedAt,
    }

    #[derive(Iden)]
    pub enum Users {
        Table,
        Id,
        Username,
        FullName,
        Active,
        CreatedAt,
    }
}

mod m20240101_000002_create_movement_reasons_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_movement_reasons_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(MovementReasons::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MovementReasons::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MovementReasons::MovementType)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MovementReasons::Code).string().not_null())
                        .col(ColumnDef::new(MovementReasons::Name).string().not_null())
                        .col(
                            ColumnDef::new(MovementReasons::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(MovementReasons::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("ux_movement_reasons_type_code")
                        .table(MovementReasons::Table)
                        .col(MovementReasons::MovementType)
                        .col(MovementReasons::Code)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MovementReasons::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum MovementReasons {
        Table,
        Id,
        MovementType,
        Code,
        Name,
        Active,
        CreatedAt,
    }
}

mod m20240101_000003_create_stock_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_stock_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockByWarehouse::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockByWarehouse::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockByWarehouse::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockByWarehouse::WarehouseId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockByWarehouse::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(StockByWarehouse::MinStock).integer().null())
                        .col(
                            ColumnDef::new(StockByWarehouse::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockByWarehouse::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // One balance row per (product, warehouse); the engines upsert on it.
            manager
                .create_index(
                    Index::create()
                        .name("ux_stock_by_warehouse_product_warehouse")
                        .table(StockByWarehouse::Table)
                        .col(StockByWarehouse::ProductId)
                        .col(StockByWarehouse::WarehouseId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("ix_stock_by_warehouse_updated_at")
                        .table(StockByWarehouse::Table)
                        .col(StockByWarehouse::UpdatedAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InventoryMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryMovements::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::WarehouseId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::MovementType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::StockBefore)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::StockAfter)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryMovements::Reason).string().null())
                        .col(ColumnDef::new(InventoryMovements::ReasonId).uuid().null())
                        .col(
                            ColumnDef::new(InventoryMovements::DocumentRef)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(InventoryMovements::UserId).uuid().null())
                        .col(
                            ColumnDef::new(InventoryMovements::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("ix_inventory_movements_product_created")
                        .table(InventoryMovements::Table)
                        .col(InventoryMovements::ProductId)
                        .col(InventoryMovements::CreatedAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("ix_inventory_movements_warehouse_created")
                        .table(InventoryMovements::Table)
                        .col(InventoryMovements::WarehouseId)
                        .col(InventoryMovements::CreatedAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("ix_inventory_movements_reason_id")
                        .table(InventoryMovements::Table)
                        .col(InventoryMovements::ReasonId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryMovements::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockByWarehouse::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum StockByWarehouse {
        Table,
        Id,
        ProductId,
        WarehouseId,
        Quantity,
        MinStock,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    pub enum InventoryMovements {
        Table,
        Id,
        ProductId,
        WarehouseId,
        MovementType,
        Quantity,
        StockBefore,
        StockAfter,
        Reason,
        ReasonId,
        DocumentRef,
        UserId,
        CreatedAt,
    }
}

mod m20240101_000004_seed_movement_reasons {
    use super::m20240101_000002_create_movement_reasons_table::MovementReasons;
    use chrono::Utc;
    use sea_orm_migration::prelude::*;
    use uuid::Uuid;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_seed_movement_reasons"
        }
    }

    // The receipt engine resolves ENTRADA/COMPRA by code, so the canonical
    // catalog must exist on a fresh database.
    const SEED: &[(&str, &str, &str)] = &[
        ("ENTRADA", "COMPRA", "Compra a proveedor"),
        ("ENTRADA", "DEVOLUCION_CLIENTE", "Devolución de cliente"),
        ("SALIDA", "VENTA", "Venta"),
        ("SALIDA", "MERMA", "Merma o deterioro"),
        ("AJUSTE", "CONTEO", "Ajuste por conteo físico"),
        ("AJUSTE", "CORRECCION", "Corrección manual"),
    ];

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for (movement_type, code, name) in SEED {
                let insert = Query::insert()
                    .into_table(MovementReasons::Table)
                    .columns([
                        MovementReasons::Id,
                        MovementReasons::MovementType,
                        MovementReasons::Code,
                        MovementReasons::Name,
                        MovementReasons::Active,
                        MovementReasons::CreatedAt,
                    ])
                    .values_panic([
                        Uuid::new_v4().into(),
                        (*movement_type).into(),
                        (*code).into(),
                        (*name).into(),
                        true.into(),
                        Utc::now().into(),
                    ])
                    .to_owned();
                manager.exec_stmt(insert).await?;
            }
            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            let codes: Vec<&str> = SEED.iter().map(|(_, code, _)| *code).collect();
            let delete = Query::delete()
                .from_table(MovementReasons::Table)
                .cond_where(Expr::col(MovementReasons::Code).is_in(codes))
                .to_owned();
            manager.exec_stmt(delete).await?;
            Ok(())
        }
    }
}
