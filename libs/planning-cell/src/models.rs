use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ==============================================================================
// WIRE HELPERS
// ==============================================================================

/// `NaiveTime` on the wire as `HH:MM`. Deserialization also accepts `HH:MM:SS`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        crate::services::grid::parse_slot_time(&raw)
            .ok_or_else(|| D::Error::custom(format!("invalid time of day: {}", raw)))
    }

    pub mod option {
        use chrono::NaiveTime;
        use serde::Serializer;

        pub fn serialize<S: Serializer>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error> {
            match time {
                Some(t) => super::serialize(t, serializer),
                None => serializer.serialize_none(),
            }
        }
    }
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

// ==============================================================================
// SCHEDULE MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date, self.time.format("%H:%M"))
    }
}

/// Occupancy of one working day.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub booked: BTreeSet<NaiveTime>,
    /// Grid points not in `booked`, ascending.
    pub available: Vec<NaiveTime>,
    /// Number of active appointments that day, duplicates at the same time included.
    pub appointment_count: usize,
}

impl DaySchedule {
    pub fn earliest_available(&self) -> Option<NaiveTime> {
        self.available.first().copied()
    }

    pub fn is_available(&self, time: NaiveTime) -> bool {
        self.available.binary_search(&time).is_ok()
    }
}

/// Chronologically ordered schedule over a horizon.
pub type ScheduleMap = BTreeMap<NaiveDate, DaySchedule>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NextAvailableSlot {
    #[serde(flatten)]
    pub slot: TimeSlot,
    pub weekday: Weekday,
}

// ==============================================================================
// REASON PROFILE
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Urgent,
    Moderate,
    Routine,
}

impl Urgency {
    pub fn from_token(token: &str) -> Option<Self> {
        match normalize_token(token).as_str() {
            "urgent" | "urgence" | "high" => Some(Urgency::Urgent),
            "moderate" | "modere" | "medium" => Some(Urgency::Moderate),
            "routine" | "low" | "normal" => Some(Urgency::Routine),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationType {
    First,
    Followup,
    Emergency,
    Preventive,
    Specialized,
}

impl ConsultationType {
    pub fn from_token(token: &str) -> Option<Self> {
        match normalize_token(token).as_str() {
            "first" | "premiere" | "first_visit" | "new" => Some(ConsultationType::First),
            "followup" | "follow_up" | "suivi" => Some(ConsultationType::Followup),
            "emergency" | "urgence" => Some(ConsultationType::Emergency),
            "preventive" | "preventif" | "prevention" => Some(ConsultationType::Preventive),
            "specialized" | "specialise" | "specialist" => Some(ConsultationType::Specialized),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferredPeriod {
    Morning,
    Afternoon,
    EndOfDay,
    Flexible,
}

impl PreferredPeriod {
    pub fn from_token(token: &str) -> Option<Self> {
        match normalize_token(token).as_str() {
            "morning" | "matin" => Some(PreferredPeriod::Morning),
            "afternoon" | "apres_midi" => Some(PreferredPeriod::Afternoon),
            "end_of_day" | "fin_journee" | "evening" => Some(PreferredPeriod::EndOfDay),
            "flexible" => Some(PreferredPeriod::Flexible),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedDelay {
    Today,
    ThisWeek,
    #[serde(rename = "within_2_weeks")]
    WithinTwoWeeks,
    Flexible,
}

impl RecommendedDelay {
    pub fn from_token(token: &str) -> Option<Self> {
        match normalize_token(token).as_str() {
            "today" | "aujourd_hui" => Some(RecommendedDelay::Today),
            "this_week" | "cette_semaine" => Some(RecommendedDelay::ThisWeek),
            "within_2_weeks" | "sous_15_jours" | "dans_2_semaines" | "within_two_weeks" => {
                Some(RecommendedDelay::WithinTwoWeeks)
            }
            "flexible" => Some(RecommendedDelay::Flexible),
            _ => None,
        }
    }
}

pub const MIN_DURATION_MINUTES: u32 = 10;
pub const MAX_DURATION_MINUTES: u32 = 60;
pub const DEFAULT_DURATION_MINUTES: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReasonProfile {
    pub urgency: Urgency,
    pub consultation_type: ConsultationType,
    pub preferred_period: PreferredPeriod,
    pub duration_minutes: u32,
    pub recommended_delay: RecommendedDelay,
    pub special_requirements: BTreeSet<String>,
    pub reasoning: String,
}

impl Default for ReasonProfile {
    fn default() -> Self {
        Self {
            urgency: Urgency::Routine,
            consultation_type: ConsultationType::Followup,
            preferred_period: PreferredPeriod::Flexible,
            duration_minutes: DEFAULT_DURATION_MINUTES,
            recommended_delay: RecommendedDelay::WithinTwoWeeks,
            special_requirements: BTreeSet::new(),
            reasoning: String::new(),
        }
    }
}

// ==============================================================================
// HISTORICAL PROFILE
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCategory {
    FollowupRoutine,
    Pain,
    Infection,
    Emergency,
    FirstConsultation,
    General,
}

pub const DEFAULT_TYPICAL_GAP_MINUTES: u32 = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalProfile {
    pub total_appointments: usize,
    pub average_daily_load: f64,
    pub preferred_hours: Vec<u32>,
    pub peak_weekdays: Vec<Weekday>,
    pub typical_gap_minutes: u32,
    /// Every observed category maps to the same placeholder: visits carry no duration.
    pub duration_by_reason_category: BTreeMap<ReasonCategory, u32>,
}

impl Default for HistoricalProfile {
    fn default() -> Self {
        Self {
            total_appointments: 0,
            average_daily_load: 0.0,
            preferred_hours: Vec::new(),
            peak_weekdays: Vec::new(),
            typical_gap_minutes: DEFAULT_TYPICAL_GAP_MINUTES,
            duration_by_reason_category: BTreeMap::new(),
        }
    }
}

// ==============================================================================
// SUGGESTIONS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotCategory {
    Optimal,
    Recommended,
    Acceptable,
    Urgent,
}

impl SlotCategory {
    pub fn from_token(token: &str) -> Option<Self> {
        match normalize_token(token).as_str() {
            "optimal" => Some(SlotCategory::Optimal),
            "recommended" | "recommande" => Some(SlotCategory::Recommended),
            "acceptable" => Some(SlotCategory::Acceptable),
            "urgent" | "urgence" => Some(SlotCategory::Urgent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadImpact {
    Light,
    Normal,
    Heavy,
}

impl WorkloadImpact {
    pub fn from_token(token: &str) -> Option<Self> {
        match normalize_token(token).as_str() {
            "light" | "leger" => Some(WorkloadImpact::Light),
            "normal" => Some(WorkloadImpact::Normal),
            "heavy" | "charge" => Some(WorkloadImpact::Heavy),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotSuggestion {
    #[serde(flatten)]
    pub slot: TimeSlot,
    pub score: u8,
    pub category: SlotCategory,
    pub rationale: String,
    pub workload_impact: WorkloadImpact,
    pub day_context: String,
}

/// A slot proposed by the oracle, before validation. Date and time stay raw.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotCandidate {
    pub date: String,
    pub time: String,
    pub score: u8,
    pub category: SlotCategory,
    pub rationale: String,
    pub workload_impact: WorkloadImpact,
    pub day_context: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OracleSlotResponse {
    pub candidates: Vec<SlotCandidate>,
    pub global_recommendations: Vec<String>,
    pub urgency_advice: String,
    pub optimal_strategy: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionSource {
    Oracle,
    Fallback,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationRequest {
    pub practitioner_id: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub patient_context: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SmartRecommendation {
    pub suggestions: Vec<SlotSuggestion>,
    pub reason_profile: ReasonProfile,
    pub urgency_level: Urgency,
    pub next_available_slot: Option<NextAvailableSlot>,
    pub source: SuggestionSource,
    pub global_recommendations: Vec<String>,
    pub urgency_advice: String,
    pub optimal_strategy: String,
}

/// Per-day line of the scoring prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct DayDigest {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub load: usize,
    pub available_count: usize,
}

#[derive(Debug, Clone)]
pub struct ScoringContext {
    pub reason: String,
    pub profile: ReasonProfile,
    pub days: Vec<DayDigest>,
    pub history: HistoricalProfile,
    pub patient_context: Option<Value>,
}

// ==============================================================================
// SINGLE-DAY PLAN
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadLevel {
    Light,
    Normal,
    Heavy,
    Overloaded,
}

impl WorkloadLevel {
    pub fn from_token(token: &str) -> Option<Self> {
        match normalize_token(token).as_str() {
            "light" | "leger" => Some(WorkloadLevel::Light),
            "normal" => Some(WorkloadLevel::Normal),
            "heavy" | "charge" => Some(WorkloadLevel::Heavy),
            "overloaded" | "surcharge" => Some(WorkloadLevel::Overloaded),
            _ => None,
        }
    }

    /// Level for `booked` appointments out of `capacity` grid points.
    pub fn from_occupancy(booked: usize, capacity: usize) -> Self {
        if capacity == 0 {
            return WorkloadLevel::Overloaded;
        }
        let rate = booked as f64 / capacity as f64;
        if rate < 0.3 {
            WorkloadLevel::Light
        } else if rate < 0.6 {
            WorkloadLevel::Normal
        } else if rate < 0.8 {
            WorkloadLevel::Heavy
        } else {
            WorkloadLevel::Overloaded
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySlotSuggestion {
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    pub score: u8,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayPlan {
    pub recommended_slots: Vec<DaySlotSuggestion>,
    pub workload_assessment: WorkloadLevel,
    pub optimization_tips: Vec<String>,
    pub ideal_breaks: Vec<String>,
    pub efficiency_score: u8,
    pub estimated_duration: u32,
}

/// Oracle proposal for a single day, times still raw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OracleDayPlan {
    pub slots: Vec<(String, u8, String)>,
    pub workload_assessment: Option<WorkloadLevel>,
    pub optimization_tips: Vec<String>,
    pub ideal_breaks: Vec<String>,
    pub efficiency_score: Option<u8>,
}

#[derive(Debug, Clone)]
pub struct DayPlanContext {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub reason: String,
    pub estimated_duration: u32,
    pub booked: Vec<NaiveTime>,
    pub history: HistoricalProfile,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DayPlanRequest {
    pub practitioner_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub reason: String,
}

// ==============================================================================
// WORKLOAD REPORTS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkloadAnalysis {
    pub date: NaiveDate,
    pub total_appointments: usize,
    pub occupied_times: Vec<String>,
    pub available_slots: usize,
    pub workload_level: WorkloadLevel,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleGap {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    pub duration: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyLoad {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub appointments_count: usize,
    #[serde(with = "hhmm::option")]
    pub first_appointment: Option<NaiveTime>,
    #[serde(with = "hhmm::option")]
    pub last_appointment: Option<NaiveTime>,
    pub gaps: Vec<ScheduleGap>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyReport {
    pub week_start: NaiveDate,
    pub total_appointments: usize,
    pub average_daily_load: f64,
    pub daily_analysis: Vec<DailyLoad>,
    pub global_recommendations: Vec<String>,
    pub efficiency_tips: Vec<String>,
}

// ==============================================================================
// STORE RECORDS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[serde(alias = "programme", alias = "pending")]
    Scheduled,
    #[serde(alias = "confirme")]
    Confirmed,
    #[serde(alias = "termine")]
    Completed,
    #[serde(alias = "annule", alias = "canceled")]
    Cancelled,
    NoShow,
    #[serde(other)]
    Unknown,
}

impl AppointmentStatus {
    pub fn is_active(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }
}

fn default_status() -> AppointmentStatus {
    AppointmentStatus::Scheduled
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub doctor_id: String,
    #[serde(default)]
    pub patient_id: Option<String>,
    pub appointment_date: NaiveDate,
    /// Kept raw: historical rows are not guaranteed to be on the grid.
    pub appointment_time: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default = "default_status")]
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub doctor_id: String,
    pub consultation_date: NaiveDate,
    #[serde(default)]
    pub reason: Option<String>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum PlanningError {
    #[error("Invalid input: {0}")]
    InputInvalid(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Lowercases, folds the French accents the oracle and legacy data use,
/// and maps separators to `_`.
pub fn normalize_token(token: &str) -> String {
    fold_accents(&token.trim().to_lowercase())
        .chars()
        .map(|c| if c == '-' || c == ' ' || c == '\'' { '_' } else { c })
        .collect()
}

pub fn fold_accents(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' => 'i',
            'ô' | 'ö' => 'o',
            'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}
