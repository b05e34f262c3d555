use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use karnameh_core::AppError;
use karnameh_models::{
    AssessmentWeightFilterParams, AssessmentWeightId, AssessmentWeightOverride,
    CreateAssessmentWeightDto,
};
use tracing::instrument;

use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::AssessmentWeightService;

#[utoipa::path(
    get,
    path = "/api/assessment-weights",
    params(AssessmentWeightFilterParams),
    responses(
        (status = 200, description = "Assessment weight overrides", body = Vec<AssessmentWeightOverride>),
        (status = 400, description = "Missing school_id or malformed filter")
    ),
    tag = "Assessment Weights"
)]
#[instrument(skip(state, filters))]
pub async fn list_assessment_weights(
    State(state): State<AppState>,
    filters: Result<Query<AssessmentWeightFilterParams>, QueryRejection>,
) -> Result<Json<Vec<AssessmentWeightOverride>>, AppError> {
    let Query(filters) = filters
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;

    let overrides = AssessmentWeightService::list(state.store.as_ref(), filters).await?;
    Ok(Json(overrides))
}

#[utoipa::path(
    post,
    path = "/api/assessment-weights",
    request_body = CreateAssessmentWeightDto,
    responses(
        (status = 201, description = "Override stored, replacing one with the same scope and label", body = AssessmentWeightOverride),
        (status = 400, description = "Invalid body or unknown teacher")
    ),
    tag = "Assessment Weights"
)]
#[instrument(skip(state, dto))]
pub async fn create_assessment_weight(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateAssessmentWeightDto>,
) -> Result<(StatusCode, Json<AssessmentWeightOverride>), AppError> {
    let stored = AssessmentWeightService::upsert(state.store.as_ref(), state.cache(), dto).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

#[utoipa::path(
    delete,
    path = "/api/assessment-weights/{id}",
    params(
        ("id" = String, Path, description = "Override ID")
    ),
    responses(
        (status = 204, description = "Override deleted"),
        (status = 404, description = "Override not found")
    ),
    tag = "Assessment Weights"
)]
#[instrument(skip(state))]
pub async fn delete_assessment_weight(
    State(state): State<AppState>,
    Path(id): Path<AssessmentWeightId>,
) -> Result<StatusCode, AppError> {
    AssessmentWeightService::delete(state.store.as_ref(), state.cache(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
