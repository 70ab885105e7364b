use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::{product, stock_by_warehouse},
    errors::ServiceError,
    services::stock,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Critico,
    Bajo,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StockAlert {
    pub product_id: Uuid,
    pub product_code: Option<String>,
    pub warehouse_id: Uuid,
    pub quantity: i32,
    pub threshold: i32,
    pub severity: AlertSeverity,
}

/// Classifies one balance against its effective threshold. A threshold of
/// zero or less means alerts are disabled for the pair.
pub fn classify(quantity: i32, threshold: i32) -> Option<AlertSeverity> {
    if threshold <= 0 {
        return None;
    }
    if quantity <= threshold / 2 {
        Some(AlertSeverity::Critico)
    } else if quantity < threshold {
        Some(AlertSeverity::Bajo)
    } else {
        None
    }
}

/// Derives low-stock signals from current balances. This is a monitoring
/// feed, not an audit: it inspects only the most recently updated balances
/// and caps its output, so a long-idle pair below threshold can fall outside
/// the window.
#[derive(Clone)]
pub struct StockAlertScanner {
    db: Arc<DatabaseConnection>,
    scan_window: u64,
    max_results: usize,
}

impl StockAlertScanner {
    pub fn new(db: Arc<DatabaseConnection>, scan_window: u64, max_results: usize) -> Self {
        Self {
            db,
            scan_window,
            max_results,
        }
    }

    #[instrument(skip(self))]
    pub async fn scan(&self) -> Result<Vec<StockAlert>, ServiceError> {
        let db = &*self.db;

        let balances = stock_by_warehouse::Entity::find()
            .order_by_desc(stock_by_warehouse::Column::UpdatedAt)
            .limit(self.scan_window)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let product_ids: Vec<Uuid> = {
            let mut seen = std::collections::BTreeSet::new();
            balances
                .iter()
                .map(|b| b.product_id)
                .filter(|id| seen.insert(*id))
                .collect()
        };

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

        let mut alerts = Vec::new();
        for balance in &balances {
            let product = products.get(&balance.product_id);
            let threshold = stock::resolve_threshold(balance, product);

            if let Some(severity) = classify(balance.quantity, threshold) {
                alerts.push(StockAlert {
                    product_id: balance.product_id,
                    product_code: product.map(|p| p.code.clone()),
                    warehouse_id: balance.warehouse_id,
                    quantity: balance.quantity,
                    threshold,
                    severity,
                });
                if alerts.len() >= self.max_results {
                    debug!(cap = self.max_results, "alert scan hit its result cap");
                    break;
                }
            }
        }

        Ok(alerts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_at_or_below_half_threshold() {
        assert_eq!(classify(2, 10), Some(AlertSeverity::Critico));
        assert_eq!(classify(5, 10), Some(AlertSeverity::Critico));
        assert_eq!(classify(0, 1), Some(AlertSeverity::Critico));
    }

    #[test]
    fn low_between_half_and_threshold() {
        assert_eq!(classify(6, 10), Some(AlertSeverity::Bajo));
        assert_eq!(classify(8, 10), Some(AlertSeverity::Bajo));
        assert_eq!(classify(9, 10), Some(AlertSeverity::Bajo));
    }

    #[test]
    fn normal_at_or_above_threshold() {
        assert_eq!(classify(10, 10), None);
        assert_eq!(classify(11, 10), None);
    }

    #[test]
    fn disabled_when_threshold_not_positive() {
        assert_eq!(classify(0, 0), None);
        assert_eq!(classify(-1, 0), None);
        assert_eq!(classify(3, -5), None);
    }

    #[test]
    fn half_threshold_uses_integer_floor() {
        // floor(7 * 0.5) = 3
        assert_eq!(classify(3, 7), Some(AlertSeverity::Critico));
        assert_eq!(classify(4, 7), Some(AlertSeverity::Bajo));
    }
}
