use chrono::NaiveDate;

use crate::models::{ScheduleMap, SlotCandidate, TimeSlot};
use crate::services::grid::parse_slot_time;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    UnparseableDate(String),
    UnparseableTime(String),
    OutsideHorizon(NaiveDate),
    NotAvailable(TimeSlot),
}

/// The only gate between oracle output and the caller: a candidate passes
/// when its date is in the schedule and its time is one of that day's free slots.
pub fn validate(candidate: &SlotCandidate, schedule: &ScheduleMap) -> Result<TimeSlot, Rejection> {
    let date = NaiveDate::parse_from_str(candidate.date.trim(), "%Y-%m-%d")
        .map_err(|_| Rejection::UnparseableDate(candidate.date.clone()))?;
    let time = parse_slot_time(&candidate.time)
        .ok_or_else(|| Rejection::UnparseableTime(candidate.time.clone()))?;

    let day = schedule.get(&date).ok_or(Rejection::OutsideHorizon(date))?;
    let slot = TimeSlot { date, time };

    if day.is_available(time) {
        Ok(slot)
    } else {
        Err(Rejection::NotAvailable(slot))
    }
}

pub fn is_acceptable(candidate: &SlotCandidate, schedule: &ScheduleMap) -> bool {
    validate(candidate, schedule).is_ok()
}
