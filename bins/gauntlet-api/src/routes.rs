// Route table for the Gauntlet API

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::handlers;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/execute", post(handlers::execute))
        .route("/run-cpp", post(handlers::execute))
        .route("/validate", post(handlers::validate))
        .route("/validate-code", post(handlers::validate))
        .route("/questions", get(handlers::list_questions))
        .route("/api/questions", get(handlers::list_questions))
        .route("/questions/:id", get(handlers::get_question))
        .route("/api/questions/:id", get(handlers::get_question))
        .route("/log-cheater", post(handlers::log_cheater))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::export_metrics))
}
