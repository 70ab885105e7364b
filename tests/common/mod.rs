#![allow(dead_code)]

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use kardex_api::{
    db::{establish_connection_with_config, run_migrations, DbConfig},
    entities::{app_user, product, stock_by_warehouse, warehouse},
    events::EventSender,
    services::{
        adjustment::AdjustmentService, alerts::StockAlertScanner, kardex::KardexQueryService,
        reasons::MovementReasonService, receipt::ReceiptService,
    },
};

pub struct TestContext {
    pub db: Arc<DatabaseConnection>,
    pub adjustments: AdjustmentService,
    pub receipts: ReceiptService,
    pub kardex: KardexQueryService,
    pub reasons: MovementReasonService,
}

/// Fresh in-memory database with the embedded migrations applied. A single
/// pooled connection keeps every query on the same SQLite instance.
pub async fn setup() -> TestContext {
    setup_with_events(None).await
}

pub async fn setup_with_events(event_sender: Option<EventSender>) -> TestContext {
    let config = DbConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    };

    let db = establish_connection_with_config(&config)
        .await
        .expect("Failed to create DB pool");
    run_migrations(&db).await.expect("Failed to run migrations");

    let db = Arc::new(db);

    TestContext {
        adjustments: AdjustmentService::new(db.clone(), event_sender.clone()),
        receipts: ReceiptService::new(db.clone(), event_sender),
        kardex: KardexQueryService::new(db.clone()),
        reasons: MovementReasonService::new(db.clone()),
        db,
    }
}

pub fn alert_scanner(db: Arc<DatabaseConnection>, window: u64, cap: usize) -> StockAlertScanner {
    StockAlertScanner::new(db, window, cap)
}

pub async fn create_product(
    db: &DatabaseConnection,
    code: &str,
    min_stock: Option<i32>,
    track_inventory: bool,
) -> product::Model {
    let row = product::ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set(code.to_string()),
        name: Set(format!("Producto {}", code)),
        stock: Set(0),
        min_stock: Set(min_stock),
        track_inventory: Set(track_inventory),
        active: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    };

    row.insert(db).await.expect("Failed to create product")
}

pub async fn create_warehouse(db: &DatabaseConnection, code: &str) -> warehouse::Model {
    let row = warehouse::ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set(code.to_string()),
        name: Set(format!("Almacén {}", code)),
        active: Set(true),
        created_at: Set(Utc::now()),
    };

    row.insert(db).await.expect("Failed to create warehouse")
}

pub async fn create_user(
    db: &DatabaseConnection,
    username: &str,
    full_name: &str,
) -> app_user::Model {
    let row = app_user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        full_name: Set(full_name.to_string()),
        active: Set(true),
        created_at: Set(Utc::now()),
    };

    row.insert(db).await.expect("Failed to create user")
}

/// Sets the warehouse-local minimum stock override on an existing balance.
pub async fn set_balance_min_stock(
    db: &DatabaseConnection,
    balance: stock_by_warehouse::Model,
    min_stock: Option<i32>,
) -> stock_by_warehouse::Model {
    let mut active: stock_by_warehouse::ActiveModel = balance.into();
    active.min_stock = Set(min_stock);
    active.updated_at = Set(Utc::now());
    active
        .update(db)
        .await
        .expect("Failed to update balance min_stock")
}

/// Keeps creation timestamps strictly ordered for sort-sensitive asserts.
pub async fn tick() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}
