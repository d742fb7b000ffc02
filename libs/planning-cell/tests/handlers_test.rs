// libs/planning-cell/tests/handlers_test.rs
use std::sync::Arc;

use assert_matches::assert_matches;
use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use headers::{Authorization, authorization::Bearer};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use planning_cell::handlers::*;
use planning_cell::models::{DayPlanRequest, RecommendationRequest};
use shared_models::error::AppError;
use shared_utils::test_utils::{iso_date, MockPlanningResponses, TestConfig, TEST_BEARER_TOKEN};

fn create_auth_header() -> TypedHeader<Authorization<Bearer>> {
    TypedHeader(Authorization::bearer(TEST_BEARER_TOKEN).unwrap())
}

fn next_weekday_after_today() -> NaiveDate {
    let mut day = Local::now().date_naive() + Duration::days(1);
    while matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
        day += Duration::days(1);
    }
    day
}

async fn mount_empty_tables(mock_server: &MockServer) {
    for table in ["/rest/v1/appointments", "/rest/v1/consultations"] {
        Mock::given(method("GET"))
            .and(path(table))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(mock_server)
            .await;
    }
}

#[tokio::test]
async fn test_smart_datetime_rejects_empty_reason() {
    let mock_server = MockServer::start().await;
    let state = TestConfig::with_mock_server(&mock_server.uri()).to_arc();

    let result = suggest_smart_datetime(
        State(state),
        create_auth_header(),
        Json(RecommendationRequest {
            practitioner_id: "doc-1".to_string(),
            reason: "  ".to_string(),
            patient_context: None,
        }),
    )
    .await;

    assert_matches!(result, Err(AppError::BadRequest(_)));
    assert!(mock_server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_smart_datetime_returns_validated_oracle_slots() {
    let mock_server = MockServer::start().await;
    mount_empty_tables(&mock_server).await;

    let slot_date = iso_date(next_weekday_after_today());
    // One payload answers both the reason analysis and the slot scoring prompt
    let payload = json!({
        "urgency_level": "moderate",
        "consultation_type": "followup",
        "optimal_time": "morning",
        "recommended_duration": 20,
        "recommended_delay": "this_week",
        "special_requirements": [],
        "reasoning": "Routine follow-up",
        "suggested_slots": [
            { "date": slot_date, "time": "10:30", "score": 90, "category": "optimal",
              "reasoning": "Quiet morning", "workload_impact": "light", "day_context": "Empty day" },
            { "date": slot_date, "time": "10:40", "score": 85, "category": "recommended" }
        ],
        "global_recommendations": ["Book mornings"],
        "urgency_advice": "This week",
        "optimal_strategy": "Mornings first"
    });
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockPlanningResponses::gemini_json_response(&payload)))
        .mount(&mock_server)
        .await;

    let state = TestConfig::with_mock_server(&mock_server.uri()).to_arc();
    let Json(body) = suggest_smart_datetime(
        State(state),
        create_auth_header(),
        Json(RecommendationRequest {
            practitioner_id: "doc-1".to_string(),
            reason: "Suivi tension".to_string(),
            patient_context: Some(json!({ "age": 61 })),
        }),
    )
    .await
    .unwrap();

    assert_eq!(body["source"], "oracle");
    assert_eq!(body["urgency_level"], "moderate");
    assert_eq!(body["suggestions"].as_array().unwrap().len(), 1);
    assert_eq!(body["suggestions"][0]["date"], slot_date);
    assert_eq!(body["suggestions"][0]["time"], "10:30");
}

#[tokio::test]
async fn test_smart_datetime_falls_back_without_oracle() {
    let mock_server = MockServer::start().await;
    mount_empty_tables(&mock_server).await;
    let state = TestConfig::with_mock_server(&mock_server.uri())
        .without_oracle()
        .to_arc();

    let Json(body) = suggest_smart_datetime(
        State(state),
        create_auth_header(),
        Json(RecommendationRequest {
            practitioner_id: "doc-1".to_string(),
            reason: "Renouvellement ordonnance".to_string(),
            patient_context: None,
        }),
    )
    .await
    .unwrap();

    assert_eq!(body["source"], "fallback");
    assert_eq!(body["suggestions"].as_array().unwrap().len(), 3);
    assert_eq!(body["suggestions"][0]["score"], 70);
    assert_eq!(body["next_available_slot"]["time"], "08:00");
}

#[tokio::test]
async fn test_day_slots_rejects_past_date() {
    let mock_server = MockServer::start().await;
    let state = TestConfig::with_mock_server(&mock_server.uri()).to_arc();

    let result = suggest_day_slots(
        State(state),
        create_auth_header(),
        Json(DayPlanRequest {
            practitioner_id: "doc-1".to_string(),
            date: Local::now().date_naive() - Duration::days(3),
            reason: "Suivi".to_string(),
        }),
    )
    .await;

    assert_matches!(result, Err(AppError::BadRequest(_)));
}

#[tokio::test]
async fn test_day_slots_store_outage_is_database_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;
    let state = TestConfig::with_mock_server(&mock_server.uri()).to_arc();

    let result = suggest_day_slots(
        State(state),
        create_auth_header(),
        Json(DayPlanRequest {
            practitioner_id: "doc-1".to_string(),
            date: next_weekday_after_today(),
            reason: "Suivi".to_string(),
        }),
    )
    .await;

    assert_matches!(result, Err(AppError::Database(_)));
}

#[tokio::test]
async fn test_workload_analysis_validates_date() {
    let mock_server = MockServer::start().await;
    let state = TestConfig::with_mock_server(&mock_server.uri()).to_arc();

    let result = analyze_workload(
        State(state),
        create_auth_header(),
        Path(("doc-1".to_string(), "10/06/2024".to_string())),
    )
    .await;

    assert_matches!(result, Err(AppError::BadRequest(_)));
}

#[tokio::test]
async fn test_workload_analysis_reports_level() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPlanningResponses::appointment_row("doc-1", "2024-06-10", "09:00"),
            MockPlanningResponses::appointment_row("doc-1", "2024-06-10", "11:30")
        ])))
        .mount(&mock_server)
        .await;
    let state = TestConfig::with_mock_server(&mock_server.uri()).to_arc();

    let Json(body) = analyze_workload(
        State(state),
        create_auth_header(),
        Path(("doc-1".to_string(), "2024-06-10".to_string())),
    )
    .await
    .unwrap();

    assert_eq!(body["total_appointments"], 2);
    assert_eq!(body["available_slots"], 42);
    assert_eq!(body["workload_level"], "light");
    assert_eq!(body["occupied_times"], json!(["09:00", "11:30"]));
}

#[tokio::test]
async fn test_optimization_report_covers_five_days() {
    let mock_server = MockServer::start().await;
    mount_empty_tables(&mock_server).await;
    let state = TestConfig::with_mock_server(&mock_server.uri()).to_arc();

    let Json(body) = optimization_report(
        State(state),
        create_auth_header(),
        Path("doc-1".to_string()),
    )
    .await
    .unwrap();

    assert_eq!(body["daily_analysis"].as_array().unwrap().len(), 5);
    assert_eq!(body["total_appointments"], 0);
    assert_eq!(body["efficiency_tips"].as_array().unwrap().len(), 3);
}
