use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use tracing::{info, instrument};

use crate::models::{
    AppointmentRecord, DailyLoad, PlanningError, ScheduleGap, WeeklyReport, WorkloadAnalysis,
    WorkloadLevel,
};
use crate::services::grid::{format_slot_time, parse_slot_time, GRID_SIZE};
use crate::services::occupancy::OccupancyIndex;
use crate::services::store::ScheduleStore;

pub const WORKING_DAYS: i64 = 5;
pub const MIN_GAP_MINUTES: i64 = 30;
pub const LIGHT_WEEK_AVERAGE: f64 = 5.0;
pub const HEAVY_WEEK_AVERAGE: f64 = 15.0;
pub const IMBALANCE_SPREAD: usize = 8;

pub fn level_recommendations(level: WorkloadLevel) -> Vec<String> {
    let lines: &[&str] = match level {
        WorkloadLevel::Light => &[
            "Light day: room for additional appointments",
            "Ideal for long or complex consultations",
        ],
        WorkloadLevel::Normal => &[
            "Balanced workload",
            "Keep breaks to preserve consultation quality",
        ],
        WorkloadLevel::Heavy => &[
            "Well-filled day",
            "Avoid new non-urgent appointments",
            "Plan short breaks between consultations",
        ],
        WorkloadLevel::Overloaded => &[
            "Overload detected",
            "Consider postponing some appointments",
            "Plan extra time",
        ],
    };
    lines.iter().map(|line| line.to_string()).collect()
}

pub fn efficiency_tips() -> Vec<String> {
    vec![
        "Group similar consultations".to_string(),
        "Optimise lunch breaks".to_string(),
        "Keep time for emergencies".to_string(),
    ]
}

/// Gaps longer than `MIN_GAP_MINUTES` between consecutive sorted times.
pub fn find_gaps(times: &[NaiveTime]) -> Vec<ScheduleGap> {
    times
        .windows(2)
        .filter_map(|pair| {
            let minutes = (pair[1] - pair[0]).num_minutes();
            (minutes > MIN_GAP_MINUTES).then(|| ScheduleGap {
                start: pair[0],
                end: pair[1],
                duration: minutes as u32,
            })
        })
        .collect()
}

fn daily_load(date: NaiveDate, records: &[&AppointmentRecord]) -> DailyLoad {
    let mut times: Vec<NaiveTime> = records
        .iter()
        .filter_map(|record| parse_slot_time(&record.appointment_time))
        .collect();
    times.sort();

    DailyLoad {
        date,
        weekday: date.weekday(),
        appointments_count: records.len(),
        first_appointment: times.first().copied(),
        last_appointment: times.last().copied(),
        gaps: find_gaps(&times),
    }
}

/// Pure part of `weekly_report` over the Monday-to-Friday week starting at `week_start`.
pub fn weekly_report_from_records(week_start: NaiveDate, records: &[AppointmentRecord]) -> WeeklyReport {
    let mut by_date: BTreeMap<NaiveDate, Vec<&AppointmentRecord>> = BTreeMap::new();
    for record in records.iter().filter(|r| r.status.is_active()) {
        by_date.entry(record.appointment_date).or_default().push(record);
    }

    let daily_analysis: Vec<DailyLoad> = (0..WORKING_DAYS)
        .map(|offset| {
            let date = week_start + Duration::days(offset);
            let day_records = by_date.get(&date).map(Vec::as_slice).unwrap_or(&[]);
            daily_load(date, day_records)
        })
        .collect();

    let total_appointments: usize = daily_analysis.iter().map(|d| d.appointments_count).sum();
    let average_daily_load = (total_appointments as f64 / WORKING_DAYS as f64 * 10.0).round() / 10.0;

    let mut global_recommendations = Vec::new();
    if average_daily_load < LIGHT_WEEK_AVERAGE {
        global_recommendations.push("Light weekly load: room to optimise the schedule".to_string());
    } else if average_daily_load > HEAVY_WEEK_AVERAGE {
        global_recommendations.push("Heavy weekly load: watch for overwork".to_string());
    }

    let loads = daily_analysis.iter().map(|d| d.appointments_count);
    let spread = loads.clone().max().unwrap_or(0) - loads.min().unwrap_or(0);
    if spread > IMBALANCE_SPREAD {
        global_recommendations.push("Unbalanced distribution: spread the load across the week".to_string());
    }

    WeeklyReport {
        week_start,
        total_appointments,
        average_daily_load,
        daily_analysis,
        global_recommendations,
        efficiency_tips: efficiency_tips(),
    }
}

pub fn week_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
}

/// Day and week occupancy summaries for a practitioner.
pub struct WorkloadReporter {
    store: Arc<dyn ScheduleStore>,
    occupancy: OccupancyIndex,
}

impl WorkloadReporter {
    pub fn new(store: Arc<dyn ScheduleStore>) -> Self {
        Self {
            occupancy: OccupancyIndex::new(store.clone()),
            store,
        }
    }

    #[instrument(skip(self))]
    pub async fn analyze_day(
        &self,
        practitioner_id: &str,
        date: NaiveDate,
    ) -> Result<WorkloadAnalysis, PlanningError> {
        let day = self.occupancy.day_schedule(practitioner_id, date).await?;
        let workload_level = WorkloadLevel::from_occupancy(day.appointment_count, GRID_SIZE);

        info!("{} appointments on {}, workload {:?}", day.appointment_count, date, workload_level);

        Ok(WorkloadAnalysis {
            date,
            total_appointments: day.appointment_count,
            occupied_times: day.booked.iter().map(|t| format_slot_time(*t)).collect(),
            available_slots: day.available.len(),
            workload_level,
            recommendations: level_recommendations(workload_level),
        })
    }

    /// Report for the Monday-to-Friday week containing `today`.
    #[instrument(skip(self))]
    pub async fn weekly_report(
        &self,
        practitioner_id: &str,
        today: NaiveDate,
    ) -> Result<WeeklyReport, PlanningError> {
        let monday = week_start(today);
        let records = self.store
            .active_appointments(practitioner_id, monday, monday + Duration::days(WORKING_DAYS))
            .await?;

        info!("Weekly report from {} over {} appointments", monday, records.len());

        Ok(weekly_report_from_records(monday, &records))
    }
}
