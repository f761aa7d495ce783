use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/entries",
            get(handlers::list_entries).post(handlers::create_entry),
        )
        .route("/api/entries/:id", delete(handlers::delete_entry))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/tags", get(handlers::list_tags).post(handlers::create_tag))
        .route("/api/tags/:id", delete(handlers::delete_tag))
        .route("/api/goals", get(handlers::list_goals).post(handlers::create_goal))
        .route("/api/goals/:id", delete(handlers::delete_goal))
        .route("/api/goals/:id/complete", post(handlers::complete_goal))
        .with_state(state)
}
