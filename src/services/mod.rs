pub mod adjustment;
pub mod alerts;
pub mod kardex;
pub mod reasons;
pub mod receipt;
pub mod stock;

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::events::EventSender;

/// Service container handed to the HTTP layer. Each service holds its own
/// `Arc` handle to the shared connection pool.
#[derive(Clone)]
pub struct AppServices {
    pub adjustments: Arc<adjustment::AdjustmentService>,
    pub receipts: Arc<receipt::ReceiptService>,
    pub kardex: Arc<kardex::KardexQueryService>,
    pub alerts: Arc<alerts::StockAlertScanner>,
    pub reasons: Arc<reasons::MovementReasonService>,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender, config: &AppConfig) -> Self {
        Self {
            adjustments: Arc::new(adjustment::AdjustmentService::new(
                db.clone(),
                Some(event_sender.clone()),
            )),
            receipts: Arc::new(receipt::ReceiptService::new(
                db.clone(),
                Some(event_sender.clone()),
            )),
            kardex: Arc::new(kardex::KardexQueryService::new(db.clone())),
            alerts: Arc::new(alerts::StockAlertScanner::new(
                db.clone(),
                config.alert_scan_window,
                config.alert_max_results,
            )),
            reasons: Arc::new(reasons::MovementReasonService::new(db)),
        }
    }
}
