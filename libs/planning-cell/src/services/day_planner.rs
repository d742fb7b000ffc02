use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use tracing::{debug, info, instrument, warn};

use crate::models::{
    DayPlan, DayPlanContext, DayPlanRequest, DaySchedule, DaySlotSuggestion, OracleDayPlan,
    PlanningError, WorkloadLevel,
};
use crate::services::classifier::ReasonClassifier;
use crate::services::grid::{parse_slot_time, GRID_SIZE};
use crate::services::history::HistoryAnalyzer;
use crate::services::occupancy::OccupancyIndex;
use crate::services::oracle::{with_deadline, PlanningOracle};
use crate::services::store::ScheduleStore;

pub const MAX_DAY_SLOTS: usize = 5;
pub const FALLBACK_SLOT_SCORE: u8 = 70;
pub const FALLBACK_EFFICIENCY: u8 = 70;
pub const LUNCH_BREAK: &str = "12:00-13:00";

/// Single-day slot planning for one reason.
pub struct DayPlanner {
    occupancy: OccupancyIndex,
    history: HistoryAnalyzer,
    classifier: ReasonClassifier,
    oracle: Arc<dyn PlanningOracle>,
    oracle_timeout: Duration,
}

impl DayPlanner {
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

    pub async fn suggest_for_day(&self, request: &DayPlanRequest) -> Result<DayPlan, PlanningError> {
        self.suggest_for_day_on(request, Local::now().date_naive()).await
    }

    #[instrument(skip(self, request), fields(practitioner_id = %request.practitioner_id, date = %request.date))]
    pub async fn suggest_for_day_on(
        &self,
        request: &DayPlanRequest,
        today: NaiveDate,
    ) -> Result<DayPlan, PlanningError> {
        let reason = request.reason.trim();
        if reason.is_empty() {
            return Err(PlanningError::InputInvalid("Consultation reason is required".to_string()));
        }
        if request.date < today {
            return Err(PlanningError::InputInvalid(format!(
                "Date {} is in the past",
                request.date
            )));
        }

        let day = self.occupancy.day_schedule(&request.practitioner_id, request.date).await?;
        let history = self.history.analyze_on(&request.practitioner_id, today).await;
        let estimated_duration = self.classifier.estimate_duration(reason, &history).await;

        let context = DayPlanContext {
            date: day.date,
            weekday: day.weekday,
            reason: reason.to_string(),
            estimated_duration,
            booked: day.booked.iter().copied().collect(),
            history,
        };

        let plan = match with_deadline(self.oracle_timeout, self.oracle.plan_day(&context)).await {
            Ok(proposal) => plan_from_oracle(proposal, &day, estimated_duration),
            Err(e) => {
                warn!("Day planning unavailable, using fallback: {}", e);
                None
            }
        };

        Ok(plan.unwrap_or_else(|| {
            info!("Using fallback day plan with {} free slots", day.available.len());
            fallback_day_plan(&day, estimated_duration)
        }))
    }
}

/// Keeps the proposed times that are free on `day`; `None` when none are.
fn plan_from_oracle(proposal: OracleDayPlan, day: &DaySchedule, estimated_duration: u32) -> Option<DayPlan> {
    let recommended_slots: Vec<DaySlotSuggestion> = proposal
        .slots
        .into_iter()
        .filter_map(|(raw_time, score, reason)| match parse_slot_time(&raw_time) {
            Some(time) if day.is_available(time) => Some(DaySlotSuggestion { time, score, reason }),
            _ => {
                debug!("Dropping proposed time '{}'", raw_time);
                None
            }
        })
        .take(MAX_DAY_SLOTS)
        .collect();

    if recommended_slots.is_empty() {
        return None;
    }

    Some(DayPlan {
        recommended_slots,
        workload_assessment: proposal
            .workload_assessment
            .unwrap_or_else(|| WorkloadLevel::from_occupancy(day.appointment_count, GRID_SIZE)),
        optimization_tips: proposal.optimization_tips,
        ideal_breaks: proposal.ideal_breaks,
        efficiency_score: proposal.efficiency_score.unwrap_or(FALLBACK_EFFICIENCY),
        estimated_duration,
    })
}

pub fn fallback_day_plan(day: &DaySchedule, estimated_duration: u32) -> DayPlan {
    DayPlan {
        recommended_slots: day
            .available
            .iter()
            .take(MAX_DAY_SLOTS)
            .map(|time| DaySlotSuggestion {
                time: *time,
                score: FALLBACK_SLOT_SCORE,
                reason: "Available slot".to_string(),
            })
            .collect(),
        workload_assessment: WorkloadLevel::Normal,
        optimization_tips: vec![
            "Group consultations of the same kind".to_string(),
            "Keep slots free for emergencies".to_string(),
        ],
        ideal_breaks: vec![LUNCH_BREAK.to_string()],
        efficiency_score: FALLBACK_EFFICIENCY,
        estimated_duration,
    }
}
