use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use tracing::{debug, info, instrument, warn};

use crate::models::{
    weekday_name, DayDigest, HistoricalProfile, NextAvailableSlot, OracleSlotResponse,
    PlanningError, ReasonProfile, RecommendationRequest, ScheduleMap, ScoringContext,
    SlotCategory, SlotSuggestion, SmartRecommendation, SuggestionSource, TimeSlot, WorkloadImpact,
};
use crate::services::classifier::ReasonClassifier;
use crate::services::history::HistoryAnalyzer;
use crate::services::occupancy::OccupancyIndex;
use crate::services::oracle::{with_deadline, PlanningOracle};
use crate::services::store::ScheduleStore;
use crate::services::validator::validate;

pub const HORIZON_DAYS: u32 = 14;
pub const MAX_SUGGESTIONS: usize = 5;
pub const FALLBACK_DAYS: usize = 3;
pub const FALLBACK_BASE_SCORE: u8 = 70;
pub const FALLBACK_SCORE_STEP: u8 = 5;

pub struct RecommendationEngine {
    occupancy: OccupancyIndex,
    history: HistoryAnalyzer,
    classifier: ReasonClassifier,
    oracle: Arc<dyn PlanningOracle>,
    oracle_timeout: Duration,
}

impl RecommendationEngine {
    pub fn new(
        store: Arc<dyn ScheduleStore>,
        oracle: Arc<dyn PlanningOracle>,
        oracle_timeout: Duration,
    ) -> Self {
        Self {
            occupancy: OccupancyIndex::new(store.clone()),
            history: HistoryAnalyzer::new(store),
            classifier: ReasonClassifier::new(oracle.clone(), oracle_timeout),
            oracle,
            oracle_timeout,
        }
    }

    pub async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<SmartRecommendation, PlanningError> {
        self.recommend_on(request, Local::now().date_naive()).await
    }

    /// Same as `recommend` with the horizon starting at `today`.
    #[instrument(skip(self, request), fields(practitioner_id = %request.practitioner_id))]
    pub async fn recommend_on(
        &self,
        request: &RecommendationRequest,
        today: NaiveDate,
    ) -> Result<SmartRecommendation, PlanningError> {
        let reason = request.reason.trim();
        if reason.is_empty() {
            return Err(PlanningError::InputInvalid("Consultation reason is required".to_string()));
        }
        let practitioner_id = request.practitioner_id.trim();
        if practitioner_id.is_empty() {
            return Err(PlanningError::InputInvalid("Practitioner id is required".to_string()));
        }

        let (profile, schedule, history) = tokio::join!(
            self.classifier.classify(reason),
            self.occupancy.build_schedule(practitioner_id, today, HORIZON_DAYS),
            self.history.analyze_on(practitioner_id, today),
        );

        info!(
            "Recommending slots over {} schedule days (urgency {:?})",
            schedule.len(),
            profile.urgency
        );

        let next_available_slot = next_available_slot(&schedule);

        let scored = if schedule.is_empty() {
            info!("No schedule data, skipping oracle scoring");
            None
        } else {
            self.score_with_oracle(reason, &profile, &schedule, history, request).await
        };

        let recommendation = match scored {
            Some((suggestions, response)) => SmartRecommendation {
                suggestions,
                urgency_level: profile.urgency,
                reason_profile: profile,
                next_available_slot,
                source: SuggestionSource::Oracle,
                global_recommendations: response.global_recommendations,
                urgency_advice: response.urgency_advice,
                optimal_strategy: response.optimal_strategy,
            },
            None => SmartRecommendation {
                suggestions: fallback_suggestions(&schedule),
                urgency_level: profile.urgency,
                reason_profile: profile,
                next_available_slot,
                source: SuggestionSource::Fallback,
                global_recommendations: vec![
                    "Suggestions based on the earliest free slots".to_string(),
                    "Check them against the patient's medical context".to_string(),
                ],
                urgency_advice: "Review the urgency of the reason before confirming".to_string(),
                optimal_strategy: "Earliest availability first".to_string(),
            },
        };

        info!(
            "Returning {} suggestions from {:?}",
            recommendation.suggestions.len(),
            recommendation.source
        );

        Ok(recommendation)
    }

    /// Validated oracle suggestions, or `None` when the fallback must run.
    async fn score_with_oracle(
        &self,
        reason: &str,
        profile: &ReasonProfile,
        schedule: &ScheduleMap,
        history: HistoricalProfile,
        request: &RecommendationRequest,
    ) -> Option<(Vec<SlotSuggestion>, OracleSlotResponse)> {
        let context = ScoringContext {
            reason: reason.to_string(),
            profile: profile.clone(),
            days: day_digests(schedule),
            history,
            patient_context: request.patient_context.clone(),
        };

        let mut response = match with_deadline(self.oracle_timeout, self.oracle.score_slots(&context)).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Slot scoring unavailable, using fallback: {}", e);
                return None;
            }
        };

        let suggestions = accept_candidates(&mut response, schedule);
        if suggestions.is_empty() {
            warn!("No oracle candidate survived validation, using fallback");
            return None;
        }
        Some((suggestions, response))
    }
}

/// Per-day load summary in chronological order.
pub fn day_digests(schedule: &ScheduleMap) -> Vec<DayDigest> {
    schedule
        .values()
        .map(|day| DayDigest {
            date: day.date,
            weekday: day.weekday,
            load: day.appointment_count,
            available_count: day.available.len(),
        })
        .collect()
}

/// Keeps the oracle's order; drops rejected and repeated slots.
fn accept_candidates(response: &mut OracleSlotResponse, schedule: &ScheduleMap) -> Vec<SlotSuggestion> {
    let mut seen: HashSet<TimeSlot> = HashSet::new();
    let mut accepted = Vec::new();

    for candidate in response.candidates.drain(..) {
        if accepted.len() == MAX_SUGGESTIONS {
            break;
        }
        match validate(&candidate, schedule) {
            Ok(slot) if seen.insert(slot) => accepted.push(SlotSuggestion {
                slot,
                score: candidate.score,
                category: candidate.category,
                rationale: candidate.rationale,
                workload_impact: candidate.workload_impact,
                day_context: candidate.day_context,
            }),
            Ok(slot) => debug!("Dropping repeated candidate {}", slot),
            Err(rejection) => debug!("Rejected candidate: {:?}", rejection),
        }
    }

    accepted
}

/// Earliest free slot of each of the first days with availability.
pub fn fallback_suggestions(schedule: &ScheduleMap) -> Vec<SlotSuggestion> {
    schedule
        .values()
        .filter_map(|day| day.earliest_available().map(|time| (day, time)))
        .take(FALLBACK_DAYS)
        .enumerate()
        .map(|(rank, (day, time))| SlotSuggestion {
            slot: TimeSlot { date: day.date, time },
            score: FALLBACK_BASE_SCORE - FALLBACK_SCORE_STEP * rank as u8,
            category: SlotCategory::Acceptable,
            rationale: format!("Next available slot on {}", weekday_name(day.weekday)),
            workload_impact: WorkloadImpact::Normal,
            day_context: format!("Day with {} existing appointments", day.appointment_count),
        })
        .collect()
}

pub fn next_available_slot(schedule: &ScheduleMap) -> Option<NextAvailableSlot> {
    schedule.values().find_map(|day| {
        day.earliest_available().map(|time| NextAvailableSlot {
            slot: TimeSlot { date: day.date, time },
            weekday: day.weekday,
        })
    })
}
