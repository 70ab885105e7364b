use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    entities::MovementType,
    errors::ServiceError,
    services::kardex::{KardexFilter, KardexSortKey, SortOrder, DEFAULT_PAGE_SIZE},
    ApiResponse, AppState,
};

/// Merged under `/inventory` by the API router.
pub fn kardex_routes() -> Router<AppState> {
    Router::new().route("/kardex", get(query_kardex))
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct KardexParams {
    pub product_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    pub movement_type: Option<MovementType>,
    /// Inclusive RFC 3339 lower bound on creation time
    pub from: Option<DateTime<Utc>>,
    /// Inclusive RFC 3339 upper bound on creation time
    pub to: Option<DateTime<Utc>>,
    #[serde(default = "default_page")]
    pub page: u64,
    /// Clamped to the documented maximum of 200
    #[serde(default = "default_limit", alias = "page_size")]
    pub limit: u64,
    #[serde(default)]
    pub sort_by: KardexSortKey,
    #[serde(default)]
    pub order: SortOrder,
}

/// Query the movement ledger.
#[utoipa::path(
    get,
    path = "/api/v1/inventory/kardex",
    params(KardexParams),
    responses(
        (status = 200, description = "Kardex page returned"),
        (status = 400, description = "Invalid filter", body = crate::errors::ErrorResponse)
    ),
    tag = "kardex"
)]
pub async fn query_kardex(
    State(state): State<AppState>,
    Query(params): Query<KardexParams>,
) -> Result<impl IntoResponse, ServiceError> {
    if let (Some(from), Some(to)) = (params.from, params.to) {
        if from > to {
            return Err(ServiceError::ValidationError(
                "date range start is after its end".to_string(),
            ));
        }
    }

    let filter = KardexFilter {
        product_id: params.product_id,
        warehouse_id: params.warehouse_id,
        movement_type: params.movement_type,
        from: params.from,
        to: params.to,
    };

    let page = state
        .services
        .kardex
        .query(filter, params.page, params.limit, params.sort_by, params.order)
        .await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(page))))
}
