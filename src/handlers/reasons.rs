use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::MovementType, errors::ServiceError, handlers::common::validate_input, ApiResponse,
    AppState,
};

pub fn reason_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reasons).post(create_reason))
        .route("/:id/deactivate", post(deactivate_reason))
        .route("/:id", delete(delete_reason))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListReasonsParams {
    pub movement_type: Option<MovementType>,
    #[serde(default)]
    pub include_inactive: bool,
}

#[utoipa::path(
    get,
    path = "/api/v1/movement-reasons",
    params(ListReasonsParams),
    responses((status = 200, description = "Reason catalog returned")),
    tag = "movement-reasons"
)]
pub async fn list_reasons(
    State(state): State<AppState>,
    Query(params): Query<ListReasonsParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let reasons = state
        .services
        .reasons
        .list(params.movement_type, params.include_inactive)
        .await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(reasons))))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReasonRequest {
    pub movement_type: MovementType,
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/movement-reasons",
    request_body = CreateReasonRequest,
    responses(
        (status = 201, description = "Reason created"),
        (status = 409, description = "Duplicate (type, code)", body = crate::errors::ErrorResponse)
    ),
    tag = "movement-reasons"
)]
pub async fn create_reason(
    State(state): State<AppState>,
    Json(payload): Json<CreateReasonRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let reason = state
        .services
        .reasons
        .create(payload.movement_type, payload.code, payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(reason))))
}

#[utoipa::path(
    post,
    path = "/api/v1/movement-reasons/{id}/deactivate",
    params(("id" = Uuid, Path, description = "Reason ID")),
    responses(
        (status = 200, description = "Reason deactivated"),
        (status = 404, description = "Unknown reason", body = crate::errors::ErrorResponse)
    ),
    tag = "movement-reasons"
)]
pub async fn deactivate_reason(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let reason = state.services.reasons.deactivate(id).await?;

    state
        .event_sender
        .send_or_log(crate::events::Event::ReasonDeactivated { reason_id: reason.id })
        .await;

    Ok((StatusCode::OK, Json(ApiResponse::success(reason))))
}

/// Physical delete, only allowed for reasons with zero linked movements.
#[utoipa::path(
    delete,
    path = "/api/v1/movement-reasons/{id}",
    params(("id" = Uuid, Path, description = "Reason ID")),
    responses(
        (status = 204, description = "Reason deleted"),
        (status = 404, description = "Unknown reason", body = crate::errors::ErrorResponse),
        (status = 409, description = "Reason is referenced by movements", body = crate::errors::ErrorResponse)
    ),
    tag = "movement-reasons"
)]
pub async fn delete_reason(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.reasons.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
