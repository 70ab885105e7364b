use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    errors::ServiceError,
    handlers::common::validate_input,
    services::{
        adjustment::{AdjustmentDirection, AdjustmentOutcome, ReasonRef, StockAdjustment},
        receipt::{PurchaseReceipt, ReceiptItem, ReceiptLineOutcome},
        stock,
    },
    ApiResponse, AppState,
};

pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/adjustments", post(adjust_stock))
        .route("/receipts", post(apply_receipt))
        .route("/stock/:product_id", get(get_product_stock))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AdjustStockRequest {
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    /// Signed convenience form; positive increases stock. Mutually exclusive
    /// with `magnitude` + `direction`.
    pub quantity: Option<i32>,
    #[validate(range(min = 1))]
    pub magnitude: Option<i32>,
    pub direction: Option<AdjustmentDirection>,
    pub reason_id: Option<Uuid>,
    #[validate(length(min = 1))]
    pub reason: Option<String>,
    pub user_id: Option<Uuid>,
}

impl AdjustStockRequest {
    fn reason_ref(&self) -> Result<ReasonRef, ServiceError> {
        match (self.reason_id, &self.reason) {
            (Some(id), _) => Ok(ReasonRef::Coded(id)),
            (None, Some(text)) => Ok(ReasonRef::Text(text.clone())),
            (None, None) => Err(ServiceError::ValidationError(
                "either reason_id or reason is required".to_string(),
            )),
        }
    }
}

/// Record a manual stock correction (AJUSTE movement).
#[utoipa::path(
    post,
    path = "/api/v1/inventory/adjustments",
    request_body = AdjustStockRequest,
    responses(
        (status = 201, description = "Adjustment committed"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown product or warehouse", body = crate::errors::ErrorResponse),
        (status = 422, description = "Untracked product or negative resulting stock", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn adjust_stock(
    State(state): State<AppState>,
    Json(payload): Json<AdjustStockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let reason = payload.reason_ref()?;

    let outcome: AdjustmentOutcome = match payload.quantity {
        Some(quantity) => {
            state
                .services
                .adjustments
                .adjust_signed(
                    payload.product_id,
                    payload.warehouse_id,
                    quantity,
                    reason,
                    payload.user_id,
                )
                .await?
        }
        None => {
            let (magnitude, direction) = match (payload.magnitude, payload.direction) {
                (Some(m), Some(d)) => (m, d),
                _ => {
                    return Err(ServiceError::ValidationError(
                        "either quantity or magnitude with direction is required".to_string(),
                    ))
                }
            };
            state
                .services
                .adjustments
                .adjust(StockAdjustment {
                    product_id: payload.product_id,
                    warehouse_id: payload.warehouse_id,
                    magnitude,
                    direction,
                    reason,
                    user_id: payload.user_id,
                })
                .await?
        }
    };

    Ok((StatusCode::CREATED, Json(ApiResponse::success(outcome))))
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReceiptItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ApplyReceiptRequest {
    #[validate(length(min = 1))]
    pub purchase_id: String,
    pub warehouse_id: Uuid,
    #[validate(length(min = 1))]
    pub items: Vec<ReceiptItemRequest>,
}

/// Apply a multi-line purchase receipt (goods-in) to one warehouse.
#[utoipa::path(
    post,
    path = "/api/v1/inventory/receipts",
    request_body = ApplyReceiptRequest,
    responses(
        (status = 201, description = "Receipt applied; one entry per tracked line"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown warehouse or product", body = crate::errors::ErrorResponse),
        (status = 409, description = "Concurrent receipt conflict, retry", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn apply_receipt(
    State(state): State<AppState>,
    Json(payload): Json<ApplyReceiptRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let receipt = PurchaseReceipt {
        purchase_id: payload.purchase_id,
        warehouse_id: payload.warehouse_id,
        items: payload
            .items
            .into_iter()
            .map(|i| ReceiptItem {
                product_id: i.product_id,
                quantity: i.quantity,
            })
            .collect(),
    };

    let lines: Vec<ReceiptLineOutcome> = state.services.receipts.apply_receipt(receipt).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(lines))))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WarehouseBalanceResponse {
    pub warehouse_id: Uuid,
    pub quantity: i32,
    pub min_stock: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StockBreakdownResponse {
    pub product_id: Uuid,
    pub product_code: String,
    pub track_inventory: bool,
    /// Cached aggregate, equal to the sum of the balances below
    pub stock: i32,
    pub balances: Vec<WarehouseBalanceResponse>,
}

/// Per-warehouse stock breakdown for one product.
#[utoipa::path(
    get,
    path = "/api/v1/inventory/stock/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Stock breakdown returned", body = StockBreakdownResponse),
        (status = 404, description = "Unknown product", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn get_product_stock(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let (product, balances) = stock::product_stock_breakdown(&*state.db, product_id).await?;

    let response = StockBreakdownResponse {
        product_id: product.id,
        product_code: product.code,
        track_inventory: product.track_inventory,
        stock: product.stock,
        balances: balances
            .into_iter()
            .map(|b| WarehouseBalanceResponse {
                warehouse_id: b.warehouse_id,
                quantity: b.quantity,
                min_stock: b.min_stock,
            })
            .collect(),
    };

    Ok((StatusCode::OK, Json(ApiResponse::success(response))))
}
