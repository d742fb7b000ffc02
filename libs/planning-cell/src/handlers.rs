use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::{Local, NaiveDate};
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use tracing::info;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::error::AppError;

use crate::models::{DayPlanRequest, PlanningError, RecommendationRequest};
use crate::services::{
    DayPlanner, GeminiOracle, PlanningOracle, RecommendationEngine, ScheduleStore,
    SupabaseScheduleStore, WorkloadReporter,
};

impl From<PlanningError> for AppError {
    fn from(err: PlanningError) -> Self {
        match err {
            PlanningError::InputInvalid(msg) => AppError::BadRequest(msg),
            PlanningError::Database(msg) => AppError::Database(msg),
        }
    }
}

/// Store acting with the caller's token.
fn schedule_store(state: &AppConfig, token: &str) -> Arc<dyn ScheduleStore> {
    let supabase = Arc::new(SupabaseClient::new(state));
    Arc::new(SupabaseScheduleStore::new(supabase, Some(token.to_string())))
}

fn planning_oracle(state: &AppConfig) -> Arc<dyn PlanningOracle> {
    Arc::new(GeminiOracle::new(state))
}

// ==============================================================================
// RECOMMENDATION HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn suggest_smart_datetime(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<RecommendationRequest>,
) -> Result<Json<Value>, AppError> {
    let engine = RecommendationEngine::new(
        schedule_store(&state, auth.token()),
        planning_oracle(&state),
        state.oracle_timeout(),
    );

    let recommendation = engine.recommend(&request).await?;

    Ok(Json(json!(recommendation)))
}

#[axum::debug_handler]
pub async fn suggest_day_slots(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<DayPlanRequest>,
) -> Result<Json<Value>, AppError> {
    let planner = DayPlanner::new(
        schedule_store(&state, auth.token()),
        planning_oracle(&state),
        state.oracle_timeout(),
    );

    let plan = planner.suggest_for_day(&request).await?;

    Ok(Json(json!(plan)))
}

// ==============================================================================
// WORKLOAD HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn analyze_workload(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path((practitioner_id, date)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Invalid date format: {}", date)))?;

    let analysis = WorkloadReporter::new(schedule_store(&state, auth.token()))
        .analyze_day(&practitioner_id, date)
        .await?;

    Ok(Json(json!(analysis)))
}

#[axum::debug_handler]
pub async fn optimization_report(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(practitioner_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    info!("Weekly optimization report for practitioner {}", practitioner_id);

    let report = WorkloadReporter::new(schedule_store(&state, auth.token()))
        .weekly_report(&practitioner_id, Local::now().date_naive())
        .await?;

    Ok(Json(json!(report)))
}
