use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use planning_cell::router::planning_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Practice planning API is running!" }))
        .nest("/planning", planning_routes(state.clone()))
}
