use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use karnameh_core::AppError;
use karnameh_grading::{AcademicMonth, ClassRanking, CohortSheet, ReportCard};
use karnameh_models::{ClassId, CourseId, StudentId};
use serde::de::DeserializeOwned;
use tracing::instrument;
use validator::Validate;

use crate::modules::calendar::CalendarService;
use crate::state::AppState;
use crate::validator::format_errors;

use super::model::{RankingQueryParams, ReportQueryParams};
use super::service::{ReportContext, ReportService};

fn validated_query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, AppError>
where
    T: DeserializeOwned + Validate,
{
    let Query(params) = query
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;
    params
        .validate()
        .map_err(|errors| AppError::bad_request(anyhow::anyhow!("{}", format_errors(&errors))))?;
    Ok(params)
}

#[utoipa::path(
    get,
    path = "/api/reports/students/{student_id}/report-card",
    params(
        ("student_id" = String, Path, description = "Student ID"),
        ReportQueryParams
    ),
    responses(
        (status = 200, description = "Report card with monthly scores per course and the weighted average", body = ReportCard),
        (status = 304, description = "Unchanged since the ETag in If-None-Match"),
        (status = 400, description = "Invalid school year or teacher id"),
        (status = 404, description = "Student not found")
    ),
    tag = "Reports"
)]
#[instrument(skip(state, query))]
pub async fn get_report_card(
    State(state): State<AppState>,
    Path(student_id): Path<StudentId>,
    query: Result<Query<ReportQueryParams>, QueryRejection>,
) -> Result<Json<ReportCard>, AppError> {
    let params = validated_query(query)?;
    let school_year = CalendarService::resolve_school_year(params.school_year, &state.grading_config)?;

    let report = ReportService::report_card(
        &ReportContext::from_state(&state),
        student_id,
        school_year,
        params.teacher_id,
    )
    .await?;

    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/api/reports/classes/{class_id}/courses/{course_id}/monthly",
    params(
        ("class_id" = String, Path, description = "Class ID"),
        ("course_id" = String, Path, description = "Course ID"),
        ReportQueryParams
    ),
    responses(
        (status = 200, description = "Monthly grade sheet of the class with ranks and progress", body = CohortSheet),
        (status = 304, description = "Unchanged since the ETag in If-None-Match"),
        (status = 400, description = "Invalid school year or teacher id"),
        (status = 404, description = "Class not found or course not taught in it")
    ),
    tag = "Reports"
)]
#[instrument(skip(state, query))]
pub async fn get_cohort_sheet(
    State(state): State<AppState>,
    Path((class_id, course_id)): Path<(ClassId, CourseId)>,
    query: Result<Query<ReportQueryParams>, QueryRejection>,
) -> Result<Json<CohortSheet>, AppError> {
    let params = validated_query(query)?;
    let school_year = CalendarService::resolve_school_year(params.school_year, &state.grading_config)?;

    let sheet = ReportService::cohort_sheet(
        &ReportContext::from_state(&state),
        class_id,
        course_id,
        school_year,
        params.teacher_id,
    )
    .await?;

    Ok(Json(sheet))
}

#[utoipa::path(
    get,
    path = "/api/reports/classes/{class_id}/rankings",
    params(
        ("class_id" = String, Path, description = "Class ID"),
        RankingQueryParams
    ),
    responses(
        (status = 200, description = "Overall and per-course class rankings", body = ClassRanking),
        (status = 304, description = "Unchanged since the ETag in If-None-Match"),
        (status = 400, description = "Invalid school year or month"),
        (status = 404, description = "Class not found")
    ),
    tag = "Reports"
)]
#[instrument(skip(state, query))]
pub async fn get_class_rankings(
    State(state): State<AppState>,
    Path(class_id): Path<ClassId>,
    query: Result<Query<RankingQueryParams>, QueryRejection>,
) -> Result<Json<ClassRanking>, AppError> {
    let params = validated_query(query)?;
    let school_year = CalendarService::resolve_school_year(params.school_year, &state.grading_config)?;

    let month = params.month.and_then(AcademicMonth::new);

    let ranking = ReportService::class_rankings(
        &ReportContext::from_state(&state),
        class_id,
        school_year,
        month,
    )
    .await?;

    Ok(Json(ranking))
}
