// Capability interface of the external reasoning service, plus the tolerant
// decoding of its answers. Adapters turn a prompt into text; everything here
// turns that text into closed domain types.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::time::timeout;

use crate::models::{
    ConsultationType, DayPlanContext, OracleDayPlan, OracleSlotResponse, PreferredPeriod,
    ReasonProfile, RecommendedDelay, ScoringContext, SlotCandidate, SlotCategory, Urgency,
    WorkloadImpact, WorkloadLevel, MAX_DURATION_MINUTES, MIN_DURATION_MINUTES,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OracleError {
    #[error("Oracle unavailable: {0}")]
    Unavailable(String),

    #[error("Oracle timed out after {0:?}")]
    Timeout(Duration),

    #[error("Oracle response malformed: {0}")]
    Malformed(String),

    #[error("Oracle not configured")]
    NotConfigured,
}

#[async_trait]
pub trait PlanningOracle: Send + Sync {
    async fn classify_reason(&self, reason: &str) -> Result<ReasonProfile, OracleError>;

    async fn score_slots(&self, context: &ScoringContext) -> Result<OracleSlotResponse, OracleError>;

    /// Minutes, already clamped to the allowed range.
    async fn estimate_duration(&self, reason: &str) -> Result<u32, OracleError>;

    async fn plan_day(&self, context: &DayPlanContext) -> Result<OracleDayPlan, OracleError>;
}

/// Bounds an oracle call regardless of the adapter behind it.
pub async fn with_deadline<T>(
    deadline: Duration,
    call: impl Future<Output = Result<T, OracleError>>,
) -> Result<T, OracleError> {
    timeout(deadline, call)
        .await
        .unwrap_or(Err(OracleError::Timeout(deadline)))
}

// ==============================================================================
// RESPONSE DECODING
// ==============================================================================

/// Strips a leading ```json (or bare ```) fence and a trailing ``` fence.
pub fn strip_code_fence(text: &str) -> &str {
    let mut cleaned = text.trim();
    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest;
    } else if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest;
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest;
    }
    cleaned.trim()
}

pub fn parse_json_response(text: &str) -> Result<Value, OracleError> {
    serde_json::from_str(strip_code_fence(text))
        .map_err(|e| OracleError::Malformed(format!("invalid JSON: {}", e)))
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Number from a JSON number or a numeric string.
fn loose_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

pub fn clamp_duration(minutes: f64) -> u32 {
    (minutes.round() as i64).clamp(i64::from(MIN_DURATION_MINUTES), i64::from(MAX_DURATION_MINUTES)) as u32
}

pub fn clamp_score(score: f64) -> u8 {
    (score.round() as i64).clamp(0, 100) as u8
}

/// Missing keys and unknown tokens fall back to the default profile's value.
pub fn reason_profile_from_value(value: &Value) -> Result<ReasonProfile, OracleError> {
    if !value.is_object() {
        return Err(OracleError::Malformed("reason analysis is not a JSON object".to_string()));
    }

    let defaults = ReasonProfile::default();

    Ok(ReasonProfile {
        urgency: str_field(value, "urgency_level")
            .and_then(Urgency::from_token)
            .unwrap_or(defaults.urgency),
        consultation_type: str_field(value, "consultation_type")
            .and_then(ConsultationType::from_token)
            .unwrap_or(defaults.consultation_type),
        preferred_period: str_field(value, "optimal_time")
            .and_then(PreferredPeriod::from_token)
            .unwrap_or(defaults.preferred_period),
        duration_minutes: value
            .get("recommended_duration")
            .and_then(loose_number)
            .map(clamp_duration)
            .unwrap_or(defaults.duration_minutes),
        recommended_delay: str_field(value, "recommended_delay")
            .and_then(RecommendedDelay::from_token)
            .unwrap_or(defaults.recommended_delay),
        special_requirements: string_list(value, "special_requirements").into_iter().collect(),
        reasoning: str_field(value, "reasoning").unwrap_or_default().to_string(),
    })
}

fn slot_candidate_from_value(value: &Value) -> Option<SlotCandidate> {
    let date = str_field(value, "date")?.trim().to_string();
    let time = str_field(value, "time")?.trim().to_string();

    Some(SlotCandidate {
        date,
        time,
        score: value.get("score").and_then(loose_number).map(clamp_score).unwrap_or(0),
        category: str_field(value, "category")
            .and_then(SlotCategory::from_token)
            .unwrap_or(SlotCategory::Acceptable),
        rationale: str_field(value, "reasoning").unwrap_or_default().to_string(),
        workload_impact: str_field(value, "workload_impact")
            .and_then(WorkloadImpact::from_token)
            .unwrap_or(WorkloadImpact::Normal),
        day_context: str_field(value, "day_context").unwrap_or_default().to_string(),
    })
}

/// Requires a `suggested_slots` array; entries without date or time are dropped here.
pub fn slot_response_from_value(value: &Value) -> Result<OracleSlotResponse, OracleError> {
    let slots = value
        .get("suggested_slots")
        .and_then(Value::as_array)
        .ok_or_else(|| OracleError::Malformed("missing 'suggested_slots' array".to_string()))?;

    Ok(OracleSlotResponse {
        candidates: slots.iter().filter_map(slot_candidate_from_value).collect(),
        global_recommendations: string_list(value, "global_recommendations"),
        urgency_advice: str_field(value, "urgency_advice").unwrap_or_default().to_string(),
        optimal_strategy: str_field(value, "optimal_strategy").unwrap_or_default().to_string(),
    })
}

pub fn day_plan_from_value(value: &Value) -> Result<OracleDayPlan, OracleError> {
    let slots = value
        .get("recommended_slots")
        .and_then(Value::as_array)
        .ok_or_else(|| OracleError::Malformed("missing 'recommended_slots' array".to_string()))?;

    Ok(OracleDayPlan {
        slots: slots
            .iter()
            .filter_map(|slot| {
                let time = str_field(slot, "time")?.trim().to_string();
                let score = slot.get("score").and_then(loose_number).map(clamp_score).unwrap_or(0);
                let reason = str_field(slot, "reason").unwrap_or_default().to_string();
                Some((time, score, reason))
            })
            .collect(),
        workload_assessment: str_field(value, "workload_assessment").and_then(WorkloadLevel::from_token),
        optimization_tips: string_list(value, "optimization_tips"),
        ideal_breaks: string_list(value, "ideal_breaks"),
        efficiency_score: value.get("efficiency_score").and_then(loose_number).map(clamp_score),
    })
}

/// The duration prompt asks for a bare integer; a JSON number is accepted too.
pub fn parse_duration_text(text: &str) -> Result<u32, OracleError> {
    let cleaned = strip_code_fence(text);
    cleaned
        .parse::<f64>()
        .ok()
        .or_else(|| serde_json::from_str::<Value>(cleaned).ok().as_ref().and_then(loose_number))
        .filter(|minutes| minutes.is_finite())
        .map(clamp_duration)
        .ok_or_else(|| OracleError::Malformed(format!("not a duration: {}", cleaned)))
}
