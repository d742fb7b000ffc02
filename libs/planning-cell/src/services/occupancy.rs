use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use tracing::{debug, warn};

use crate::models::{AppointmentRecord, DaySchedule, PlanningError, ScheduleMap};
use crate::services::grid::{generate_grid, is_on_grid, parse_slot_time};
use crate::services::store::ScheduleStore;

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Builds the schedule of one day from the times already booked on it.
pub fn day_schedule_from_booked(date: NaiveDate, booked_times: &[NaiveTime]) -> DaySchedule {
    let booked: BTreeSet<NaiveTime> = booked_times.iter().copied().collect();
    let available = generate_grid()
        .into_iter()
        .filter(|slot| !booked.contains(slot))
        .collect();

    DaySchedule {
        date,
        weekday: date.weekday(),
        booked,
        available,
        appointment_count: booked_times.len(),
    }
}

/// Groups appointment records by date, keeping only parseable times.
fn booked_times_by_date(records: &[AppointmentRecord]) -> BTreeMap<NaiveDate, Vec<NaiveTime>> {
    let mut by_date: BTreeMap<NaiveDate, Vec<NaiveTime>> = BTreeMap::new();
    for record in records.iter().filter(|r| r.status.is_active()) {
        match parse_slot_time(&record.appointment_time) {
            Some(time) => {
                if !is_on_grid(time) {
                    debug!("Appointment at {} on {} is off the slot grid", time, record.appointment_date);
                }
                by_date.entry(record.appointment_date).or_default().push(time);
            }
            None => debug!(
                "Ignoring appointment with unparseable time '{}' on {}",
                record.appointment_time, record.appointment_date
            ),
        }
    }
    by_date
}

/// Pure part of `build_schedule`: weekdays of `[start_date, start_date + horizon_days)`.
pub fn schedule_from_records(
    start_date: NaiveDate,
    horizon_days: u32,
    records: &[AppointmentRecord],
) -> ScheduleMap {
    let booked = booked_times_by_date(records);
    let mut schedule = ScheduleMap::new();

    for offset in 0..horizon_days {
        let date = start_date + Duration::days(i64::from(offset));
        if is_weekend(date) {
            continue;
        }
        let times = booked.get(&date).map(Vec::as_slice).unwrap_or(&[]);
        schedule.insert(date, day_schedule_from_booked(date, times));
    }

    schedule
}

pub struct OccupancyIndex {
    store: Arc<dyn ScheduleStore>,
}

impl OccupancyIndex {
    pub fn new(store: Arc<dyn ScheduleStore>) -> Self {
        Self { store }
    }

    /// Weekday schedules over the horizon. An unreachable store yields an
    /// empty mapping, never an error.
    pub async fn build_schedule(
        &self,
        practitioner_id: &str,
        start_date: NaiveDate,
        horizon_days: u32,
    ) -> ScheduleMap {
        let until = start_date + Duration::days(i64::from(horizon_days));

        match self.store.active_appointments(practitioner_id, start_date, until).await {
            Ok(records) => {
                debug!(
                    "Building {}-day schedule for practitioner {} from {} appointments",
                    horizon_days, practitioner_id, records.len()
                );
                schedule_from_records(start_date, horizon_days, &records)
            }
            Err(e) => {
                warn!("Occupancy data unavailable for practitioner {}: {}", practitioner_id, e);
                ScheduleMap::new()
            }
        }
    }

    /// Schedule of a single date, weekends included. Store errors propagate.
    pub async fn day_schedule(
        &self,
        practitioner_id: &str,
        date: NaiveDate,
    ) -> Result<DaySchedule, PlanningError> {
        let records = self.store
            .active_appointments(practitioner_id, date, date + Duration::days(1))
            .await?;

        let booked = booked_times_by_date(&records);
        let times = booked.get(&date).map(Vec::as_slice).unwrap_or(&[]);
        Ok(day_schedule_from_booked(date, times))
    }
}
