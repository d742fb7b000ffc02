use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::Arc;

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveTime, Timelike};
use tracing::{debug, instrument, warn};

use crate::models::{
    fold_accents, AppointmentRecord, ConsultationRecord, HistoricalProfile, ReasonCategory,
    DEFAULT_DURATION_MINUTES, DEFAULT_TYPICAL_GAP_MINUTES,
};
use crate::services::grid::parse_slot_time;
use crate::services::store::ScheduleStore;

pub const LOOKBACK_DAYS: i64 = 90;
pub const MAX_TYPICAL_GAP_MINUTES: i64 = 120;
const TOP_N: usize = 3;

const CATEGORY_KEYWORDS: [(ReasonCategory, &[&str]); 5] = [
    (ReasonCategory::FollowupRoutine, &["suivi", "controle", "renouvellement"]),
    (ReasonCategory::Pain, &["douleur", "mal", "souffrance"]),
    (ReasonCategory::Infection, &["fievre", "grippe", "rhume"]),
    (ReasonCategory::Emergency, &["urgence", "urgent"]),
    (ReasonCategory::FirstConsultation, &["consultation", "premiere", "nouveau"]),
];

/// First matching category wins; keywords match as substrings.
pub fn categorize_reason(reason: &str) -> ReasonCategory {
    let normalized = fold_accents(&reason.to_lowercase());
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| normalized.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(ReasonCategory::General)
}

/// Top `n` keys by count, descending. Ties keep first-occurrence order.
fn top_by_frequency<K: Eq + Hash + Copy>(items: impl IntoIterator<Item = K>, n: usize) -> Vec<K> {
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut counts: Vec<(K, usize)> = Vec::new();

    for item in items {
        match index.get(&item) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(item, counts.len());
                counts.push((item, 1));
            }
        }
    }

    // sort_by is stable
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(n).map(|(key, _)| key).collect()
}

fn average_daily_load(appointments: &[AppointmentRecord]) -> f64 {
    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for appointment in appointments {
        *per_day.entry(appointment.appointment_date).or_default() += 1;
    }
    if per_day.is_empty() {
        return 0.0;
    }
    appointments.len() as f64 / per_day.len() as f64
}

fn typical_gap_minutes(appointments: &[AppointmentRecord]) -> u32 {
    let mut per_day: BTreeMap<NaiveDate, Vec<NaiveTime>> = BTreeMap::new();
    for appointment in appointments {
        if let Some(time) = parse_slot_time(&appointment.appointment_time) {
            per_day.entry(appointment.appointment_date).or_default().push(time);
        }
    }

    let mut gaps: Vec<i64> = Vec::new();
    for times in per_day.values_mut() {
        times.sort();
        for pair in times.windows(2) {
            let gap = (pair[1] - pair[0]).num_minutes();
            if gap > 0 && gap <= MAX_TYPICAL_GAP_MINUTES {
                gaps.push(gap);
            }
        }
    }

    if gaps.is_empty() {
        return DEFAULT_TYPICAL_GAP_MINUTES;
    }
    (gaps.iter().sum::<i64>() / gaps.len() as i64) as u32
}

/// Aggregates already-fetched history. Deterministic for a given input order.
pub fn summarize(
    appointments: &[AppointmentRecord],
    consultations: &[ConsultationRecord],
) -> HistoricalProfile {
    let active: Vec<AppointmentRecord> = appointments
        .iter()
        .filter(|a| a.status.is_active())
        .cloned()
        .collect();

    let hours = active
        .iter()
        .filter_map(|a| parse_slot_time(&a.appointment_time))
        .map(|t| t.hour());

    let weekdays = active.iter().map(|a| a.appointment_date.weekday());

    let duration_by_reason_category = consultations
        .iter()
        .map(|c| categorize_reason(c.reason.as_deref().unwrap_or("")))
        .map(|category| (category, DEFAULT_DURATION_MINUTES))
        .collect();

    HistoricalProfile {
        total_appointments: active.len(),
        average_daily_load: average_daily_load(&active),
        preferred_hours: top_by_frequency(hours, TOP_N),
        peak_weekdays: top_by_frequency(weekdays, TOP_N),
        typical_gap_minutes: typical_gap_minutes(&active),
        duration_by_reason_category,
    }
}

pub struct HistoryAnalyzer {
    store: Arc<dyn ScheduleStore>,
}

impl HistoryAnalyzer {
    pub fn new(store: Arc<dyn ScheduleStore>) -> Self {
        Self { store }
    }

    pub async fn analyze(&self, practitioner_id: &str) -> HistoricalProfile {
        self.analyze_on(practitioner_id, Local::now().date_naive()).await
    }

    /// Profile over the 90 days up to and including `today`.
    #[instrument(skip(self))]
    pub async fn analyze_on(&self, practitioner_id: &str, today: NaiveDate) -> HistoricalProfile {
        let from = today - Duration::days(LOOKBACK_DAYS);
        let until = today + Duration::days(1);

        let (appointments, consultations) = tokio::join!(
            self.store.active_appointments(practitioner_id, from, until),
            self.store.consultations(practitioner_id, from, until),
        );

        let appointments = appointments.unwrap_or_else(|e| {
            warn!("Appointment history unavailable for practitioner {}: {}", practitioner_id, e);
            Vec::new()
        });
        let consultations = consultations.unwrap_or_else(|e| {
            warn!("Consultation history unavailable for practitioner {}: {}", practitioner_id, e);
            Vec::new()
        });

        let profile = summarize(&appointments, &consultations);
        debug!(
            total = profile.total_appointments,
            average_daily_load = profile.average_daily_load,
            "Historical profile computed"
        );
        profile
    }
}
