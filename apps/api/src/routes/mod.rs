pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::explore::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Explore API
        .route("/api/v1/explore", get(handlers::handle_explore))
        .route("/api/v1/explore/layout", post(handlers::handle_layout))
        .with_state(state)
}
