use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use karnameh_core::AppError;
use tracing::instrument;

use crate::state::AppState;

use super::model::{JalaliConversion, JalaliQueryParams};
use super::service::CalendarService;

#[utoipa::path(
    get,
    path = "/api/calendar/jalali",
    params(JalaliQueryParams),
    responses(
        (status = 200, description = "Jalali date and school year slot", body = JalaliConversion),
        (status = 400, description = "Unreadable date")
    ),
    tag = "Calendar"
)]
#[instrument(skip(state, params))]
pub async fn convert_to_jalali(
    State(state): State<AppState>,
    params: Result<Query<JalaliQueryParams>, QueryRejection>,
) -> Result<Json<JalaliConversion>, AppError> {
    let Query(params) = params
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;

    let conversion = CalendarService::convert(params.date.as_deref(), &state.grading_config)?;
    Ok(Json(conversion))
}
