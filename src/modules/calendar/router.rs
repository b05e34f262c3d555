use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::convert_to_jalali;

pub fn init_calendar_router() -> Router<AppState> {
    Router::new().route("/jalali", get(convert_to_jalali))
}
