use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use karnameh_core::AppError;
use karnameh_models::{
    LessonRecord, LessonRecordFilterParams, PaginatedLessonRecordsResponse, SaveLessonRecordDto,
};
use tracing::instrument;

use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::LessonRecordService;

#[utoipa::path(
    put,
    path = "/api/lesson-records",
    request_body = SaveLessonRecordDto,
    responses(
        (status = 200, description = "Lesson record stored; an existing record for the same lesson is replaced", body = LessonRecord),
        (status = 400, description = "Invalid body or unknown school, class, student, teacher or course")
    ),
    tag = "Lesson Records"
)]
#[instrument(skip(state, dto))]
pub async fn save_lesson_record(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<SaveLessonRecordDto>,
) -> Result<Json<LessonRecord>, AppError> {
    let record = LessonRecordService::save(
        state.store.as_ref(),
        state.cache(),
        &state.grading_config,
        dto,
    )
    .await?;

    Ok(Json(record))
}

#[utoipa::path(
    get,
    path = "/api/lesson-records",
    params(LessonRecordFilterParams),
    responses(
        (status = 200, description = "Raw lesson records, most recently updated first", body = PaginatedLessonRecordsResponse),
        (status = 400, description = "Missing school_id or malformed filter")
    ),
    tag = "Lesson Records"
)]
#[instrument(skip(state, filters))]
pub async fn list_lesson_records(
    State(state): State<AppState>,
    filters: Result<Query<LessonRecordFilterParams>, QueryRejection>,
) -> Result<Json<PaginatedLessonRecordsResponse>, AppError> {
    let Query(filters) = filters
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;

    let records = LessonRecordService::list(state.store.as_ref(), filters).await?;
    Ok(Json(records))
}
