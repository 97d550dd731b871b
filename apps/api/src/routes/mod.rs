pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/upload_excel/", post(handlers::handle_upload))
        .route("/analyze/", post(handlers::handle_analyze))
        .with_state(state)
}
