// libs/planning-cell/tests/occupancy_test.rs
mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Datelike, NaiveTime, Weekday};

use planning_cell::models::{AppointmentStatus, PlanningError};
use planning_cell::services::grid::GRID_SIZE;
use planning_cell::services::occupancy::schedule_from_records;
use planning_cell::services::OccupancyIndex;

use common::{appointment, date, FailingStore, InMemoryStore};

fn hhmm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

#[tokio::test]
async fn test_booked_times_are_removed_from_availability() {
    let monday = date(2024, 6, 10);
    let store = InMemoryStore::with_appointments(vec![
        appointment("doc-1", monday, "09:00"),
        appointment("doc-1", monday, "09:15:00"),
        appointment("doc-2", monday, "08:00"),
    ]);
    let index = OccupancyIndex::new(Arc::new(store));

    let schedule = index.build_schedule("doc-1", monday, 14).await;
    let day = &schedule[&monday];

    assert_eq!(day.appointment_count, 2);
    assert_eq!(
        &day.available[..5],
        &[hhmm(8, 0), hhmm(8, 15), hhmm(8, 30), hhmm(8, 45), hhmm(9, 30)]
    );
    assert_eq!(day.available.len(), GRID_SIZE - 2);
    assert!(day.booked.iter().all(|t| !day.available.contains(t)));
}

#[tokio::test]
async fn test_horizon_excludes_weekends() {
    let monday = date(2024, 6, 10);
    let index = OccupancyIndex::new(Arc::new(InMemoryStore::default()));

    let schedule = index.build_schedule("doc-1", monday, 14).await;

    assert_eq!(schedule.len(), 10);
    assert!(schedule
        .keys()
        .all(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun)));
    assert_eq!(schedule.keys().next(), Some(&monday));
    assert_eq!(schedule.keys().last(), Some(&date(2024, 6, 21)));
}

#[tokio::test]
async fn test_store_failure_yields_empty_schedule() {
    let index = OccupancyIndex::new(Arc::new(FailingStore));

    let schedule = index.build_schedule("doc-1", date(2024, 6, 10), 14).await;

    assert!(schedule.is_empty());
}

#[tokio::test]
async fn test_day_schedule_propagates_store_errors() {
    let index = OccupancyIndex::new(Arc::new(FailingStore));

    let result = index.day_schedule("doc-1", date(2024, 6, 10)).await;

    assert_matches!(result, Err(PlanningError::Database(_)));
}

#[tokio::test]
async fn test_day_schedule_includes_weekend_dates() {
    let saturday = date(2024, 6, 15);
    let store = InMemoryStore::with_appointments(vec![appointment("doc-1", saturday, "10:00")]);
    let index = OccupancyIndex::new(Arc::new(store));

    let day = index.day_schedule("doc-1", saturday).await.unwrap();

    assert_eq!(day.weekday, Weekday::Sat);
    assert!(!day.is_available(hhmm(10, 0)));
    assert!(day.is_available(hhmm(10, 15)));
}

#[test]
fn test_cancelled_and_unparseable_records_do_not_block_slots() {
    let monday = date(2024, 6, 10);
    let mut cancelled = appointment("doc-1", monday, "11:00");
    cancelled.status = AppointmentStatus::Cancelled;
    let records = vec![cancelled, appointment("doc-1", monday, "late morning")];

    let schedule = schedule_from_records(monday, 1, &records);

    assert_eq!(schedule[&monday].available.len(), GRID_SIZE);
    assert_eq!(schedule[&monday].appointment_count, 0);
}

#[test]
fn test_off_grid_bookings_count_without_blocking_grid_points() {
    let monday = date(2024, 6, 10);
    let schedule = schedule_from_records(monday, 1, &[appointment("doc-1", monday, "10:10")]);

    assert_eq!(schedule[&monday].appointment_count, 1);
    assert_eq!(schedule[&monday].available.len(), GRID_SIZE);
}
