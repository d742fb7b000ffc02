use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use shared_config::AppConfig;

use crate::handlers;

pub fn planning_routes(state: Arc<AppConfig>) -> Router {
    // Every route requires a bearer token, forwarded to the store as-is
    Router::new()
        .route("/suggest-smart-datetime", post(handlers::suggest_smart_datetime))
        .route("/suggest-slots", post(handlers::suggest_day_slots))
        .route("/workload-analysis/{practitioner_id}/{date}", get(handlers::analyze_workload))
        .route("/optimization-report/{practitioner_id}", get(handlers::optimization_report))
        .with_state(state)
}
