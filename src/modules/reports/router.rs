use axum::{Router, middleware, routing::get};
use karnameh_cache::{CacheControl, cache_control, etag_middleware};

use crate::state::AppState;

use super::controller::{get_class_rankings, get_cohort_sheet, get_report_card};

pub fn init_reports_router() -> Router<AppState> {
    Router::new()
        .route("/students/{student_id}/report-card", get(get_report_card))
        .route(
            "/classes/{class_id}/courses/{course_id}/monthly",
            get(get_cohort_sheet),
        )
        .route("/classes/{class_id}/rankings", get(get_class_rankings))
        .layer(middleware::from_fn(etag_middleware))
        .layer(cache_control(CacheControl::Revalidate))
}
