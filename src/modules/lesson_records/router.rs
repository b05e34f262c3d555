use axum::{Router, routing::put};

use crate::state::AppState;

use super::controller::{list_lesson_records, save_lesson_record};

pub fn init_lesson_records_router() -> Router<AppState> {
    Router::new().route("/", put(save_lesson_record).get(list_lesson_records))
}
