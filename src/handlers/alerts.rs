use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};

use crate::{errors::ServiceError, ApiResponse, AppState};

/// Merged under `/inventory` by the API router.
pub fn alert_routes() -> Router<AppState> {
    Router::new().route("/alerts", get(get_stock_alerts))
}

/// Current low-stock and critical-stock signals. A bounded monitoring feed
/// over the most recently updated balances, not an exhaustive audit.
#[utoipa::path(
    get,
    path = "/api/v1/inventory/alerts",
    responses(
        (status = 200, description = "Active stock alerts returned")
    ),
    tag = "inventory"
)]
pub async fn get_stock_alerts(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let alerts = state.services.alerts.scan().await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(alerts))))
}
