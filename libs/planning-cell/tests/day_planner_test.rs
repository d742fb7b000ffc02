// libs/planning-cell/tests/day_planner_test.rs
mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use chrono::NaiveTime;

use planning_cell::models::{DayPlanRequest, OracleDayPlan, PlanningError, WorkloadLevel};
use planning_cell::services::DayPlanner;

use common::{appointment, date, FailingStore, InMemoryStore, ScriptedOracle};

const TIMEOUT: Duration = Duration::from_millis(200);

fn request_for(day: chrono::NaiveDate, reason: &str) -> DayPlanRequest {
    DayPlanRequest {
        practitioner_id: "doc-1".to_string(),
        date: day,
        reason: reason.to_string(),
    }
}

fn tuesday_store() -> InMemoryStore {
    let tuesday = date(2024, 6, 11);
    InMemoryStore::with_appointments(vec![
        appointment("doc-1", tuesday, "08:00"),
        appointment("doc-1", tuesday, "08:30"),
    ])
}

#[tokio::test]
async fn test_past_date_is_rejected() {
    let planner = DayPlanner::new(Arc::new(tuesday_store()), Arc::new(ScriptedOracle::unavailable()), TIMEOUT);

    let result = planner
        .suggest_for_day_on(&request_for(date(2024, 6, 7), "Suivi"), date(2024, 6, 10))
        .await;

    assert_matches!(result, Err(PlanningError::InputInvalid(_)));
}

#[tokio::test]
async fn test_empty_reason_is_rejected() {
    let planner = DayPlanner::new(Arc::new(tuesday_store()), Arc::new(ScriptedOracle::unavailable()), TIMEOUT);

    let result = planner
        .suggest_for_day_on(&request_for(date(2024, 6, 11), ""), date(2024, 6, 10))
        .await;

    assert_matches!(result, Err(PlanningError::InputInvalid(_)));
}

#[tokio::test]
async fn test_store_failure_is_a_database_error() {
    let planner = DayPlanner::new(Arc::new(FailingStore), Arc::new(ScriptedOracle::unavailable()), TIMEOUT);

    let result = planner
        .suggest_for_day_on(&request_for(date(2024, 6, 11), "Suivi"), date(2024, 6, 10))
        .await;

    assert_matches!(result, Err(PlanningError::Database(_)));
}

#[tokio::test]
async fn test_oracle_outage_returns_first_free_times() {
    let planner = DayPlanner::new(Arc::new(tuesday_store()), Arc::new(ScriptedOracle::unavailable()), TIMEOUT);

    let plan = planner
        .suggest_for_day_on(&request_for(date(2024, 6, 11), "Certificat"), date(2024, 6, 10))
        .await
        .unwrap();

    let times: Vec<String> = plan
        .recommended_slots
        .iter()
        .map(|s| s.time.format("%H:%M").to_string())
        .collect();
    assert_eq!(times, vec!["08:15", "08:45", "09:00", "09:15", "09:30"]);
    assert_eq!(plan.efficiency_score, 70);
    assert_eq!(plan.ideal_breaks, vec!["12:00-13:00".to_string()]);
    assert_eq!(plan.estimated_duration, 20);
}

#[tokio::test]
async fn test_oracle_plan_is_filtered_against_availability() {
    let mut oracle = ScriptedOracle::slow(Duration::ZERO);
    oracle.duration = Ok(30);
    oracle.day_plan = Ok(OracleDayPlan {
        slots: vec![
            ("08:00".to_string(), 97, "Start of day".to_string()),
            ("10:00".to_string(), 91, "Quiet slot".to_string()),
            ("11:15".to_string(), 84, "Before lunch".to_string()),
        ],
        workload_assessment: Some(WorkloadLevel::Light),
        optimization_tips: vec!["Group follow-ups".to_string()],
        ideal_breaks: vec!["12:30-13:30".to_string()],
        efficiency_score: Some(86),
    });
    let planner = DayPlanner::new(Arc::new(tuesday_store()), Arc::new(oracle), TIMEOUT);

    let plan = planner
        .suggest_for_day_on(&request_for(date(2024, 6, 11), "Bilan annuel"), date(2024, 6, 10))
        .await
        .unwrap();

    assert_eq!(plan.recommended_slots.len(), 2);
    assert_eq!(plan.recommended_slots[0].time, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
    assert_eq!(plan.workload_assessment, WorkloadLevel::Light);
    assert_eq!(plan.efficiency_score, 86);
    assert_eq!(plan.estimated_duration, 30);
}
