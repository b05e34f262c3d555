use axum::{
    Router,
    routing::{delete, get},
};

use crate::state::AppState;

use super::controller::{
    create_assessment_weight, delete_assessment_weight, list_assessment_weights,
};

pub fn init_assessment_weights_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_assessment_weights).post(create_assessment_weight))
        .route("/{id}", delete(delete_assessment_weight))
}
