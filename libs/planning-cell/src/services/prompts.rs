use crate::models::{weekday_name, DayPlanContext, HistoricalProfile, ScoringContext};
use crate::services::grid::format_slot_time;

/// Number of schedule days summarised in the scoring prompt.
pub const DIGEST_DAYS: usize = 7;

fn format_hours(hours: &[u32]) -> String {
    if hours.is_empty() {
        return "none recorded".to_string();
    }
    hours
        .iter()
        .map(|h| format!("{:02}h", h))
        .collect::<Vec<_>>()
        .join(", ")
}

fn history_lines(history: &HistoricalProfile) -> String {
    format!(
        "- Average load: {:.1} appointments/day\n- Preferred hours: {}\n- Typical gap between appointments: {} min",
        history.average_daily_load,
        format_hours(&history.preferred_hours),
        history.typical_gap_minutes,
    )
}

pub fn reason_prompt(reason: &str) -> String {
    format!(
        r#"You are a medical scheduling assistant. Analyse this consultation reason and determine its planning characteristics.

Reason: "{reason}"

Evaluate:
1. Urgency level (urgent/moderate/routine)
2. Consultation type (first/followup/emergency/preventive/specialized)
3. Best time of day (morning/afternoon/end_of_day/flexible)
4. Recommended duration (10-60 minutes)
5. Recommended delay (today/this_week/within_2_weeks/flexible)
6. Special requirements (equipment, fasting, accompaniment...)

Answer ONLY with JSON:
{{
  "urgency_level": "urgent|moderate|routine",
  "consultation_type": "first|followup|emergency|preventive|specialized",
  "optimal_time": "morning|afternoon|end_of_day|flexible",
  "recommended_duration": 30,
  "recommended_delay": "today|this_week|within_2_weeks|flexible",
  "special_requirements": ["requirement"],
  "reasoning": "short explanation"
}}"#,
        reason = reason.trim(),
    )
}

pub fn scoring_prompt(context: &ScoringContext) -> String {
    let schedule = context
        .days
        .iter()
        .take(DIGEST_DAYS)
        .map(|day| {
            format!(
                "{} {}: {} appointments, {} free slots",
                weekday_name(day.weekday),
                day.date.format("%Y-%m-%d"),
                day.load,
                day.available_count,
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let patient = context
        .patient_context
        .as_ref()
        .map(|p| format!("\nPATIENT CONTEXT:\n{}\n", p))
        .unwrap_or_default();

    let profile = &context.profile;

    format!(
        r#"You are an expert assistant for medical appointment planning.

REASON ANALYSIS:
Reason: "{reason}"
- Urgency: {urgency:?}
- Type: {kind:?}
- Best period: {period:?}
- Duration: {duration} min
- Recommended delay: {delay:?}

CURRENT SCHEDULE (next working days):
{schedule}

PRACTITIONER HISTORY:
{history}
{patient}
CONSTRAINTS:
- Working hours 08:00-18:45 in 15-minute slots
- No weekends
- Only propose slots that are free in the schedule above
- Respect the urgency of the reason and balance the workload

Propose 3 to 5 date and time suggestions, best first.

Answer ONLY with JSON:
{{
  "suggested_slots": [
    {{
      "date": "YYYY-MM-DD",
      "time": "HH:MM",
      "score": 95,
      "category": "optimal|recommended|acceptable|urgent",
      "reasoning": "why this slot",
      "workload_impact": "light|normal|heavy",
      "day_context": "what the day looks like"
    }}
  ],
  "global_recommendations": ["recommendation"],
  "urgency_advice": "advice for this urgency",
  "optimal_strategy": "planning strategy"
}}"#,
        reason = context.reason.trim(),
        urgency = profile.urgency,
        kind = profile.consultation_type,
        period = profile.preferred_period,
        duration = profile.duration_minutes,
        delay = profile.recommended_delay,
        schedule = schedule,
        history = history_lines(&context.history),
        patient = patient,
    )
}

pub fn duration_prompt(reason: &str) -> String {
    format!(
        r#"Estimate the typical duration in minutes of this medical consultation.

Reason: {reason}

Answer ONLY with an integer number of minutes.
Typical durations:
- Routine or follow-up: 15-20 min
- First consultation: 30-45 min
- Complex consultation: 30-60 min
- Emergency: 20-30 min"#,
        reason = reason.trim(),
    )
}

pub fn day_plan_prompt(context: &DayPlanContext) -> String {
    let booked = context
        .booked
        .iter()
        .map(|t| format_slot_time(*t))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"You are an assistant specialised in optimising a practitioner's day.

CONTEXT:
- Date: {date} ({weekday})
- Reason: {reason}
- Estimated duration: {duration} minutes
- Already booked: [{booked}]
- Current load: {load} appointments
{history}

CONSTRAINTS:
- Working hours 08:00 to 18:45 (15-minute slots)
- No overlaps with booked slots
- Keep reasonable breaks

Propose 3-5 optimal slots, a workload assessment and optimisation tips.

Answer ONLY with JSON:
{{
  "recommended_slots": [
    {{ "time": "HH:MM", "score": 95, "reason": "why" }}
  ],
  "workload_assessment": "light|normal|heavy|overloaded",
  "optimization_tips": ["tip"],
  "ideal_breaks": ["12:00-13:00"],
  "efficiency_score": 85
}}"#,
        date = context.date.format("%Y-%m-%d"),
        weekday = weekday_name(context.weekday),
        reason = context.reason.trim(),
        duration = context.estimated_duration,
        booked = booked,
        load = context.booked.len(),
        history = history_lines(&context.history),
    )
}
