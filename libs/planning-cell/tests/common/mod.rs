// libs/planning-cell/tests/common/mod.rs
// In-memory store and scripted oracle shared by the service tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use planning_cell::models::{
    AppointmentRecord, AppointmentStatus, ConsultationRecord, DayPlanContext, OracleDayPlan,
    OracleSlotResponse, PlanningError, ReasonProfile, ScoringContext,
};
use planning_cell::services::{OracleError, PlanningOracle, ScheduleStore};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn appointment(doctor_id: &str, on: NaiveDate, time: &str) -> AppointmentRecord {
    AppointmentRecord {
        id: None,
        doctor_id: doctor_id.to_string(),
        patient_id: None,
        appointment_date: on,
        appointment_time: time.to_string(),
        reason: None,
        status: AppointmentStatus::Confirmed,
    }
}

pub fn consultation(doctor_id: &str, on: NaiveDate, reason: &str) -> ConsultationRecord {
    ConsultationRecord {
        id: None,
        doctor_id: doctor_id.to_string(),
        consultation_date: on,
        reason: Some(reason.to_string()),
    }
}

// ==============================================================================
// STORES
// ==============================================================================

#[derive(Default)]
pub struct InMemoryStore {
    pub appointments: Vec<AppointmentRecord>,
    pub consultations: Vec<ConsultationRecord>,
    pub queries: AtomicUsize,
}

impl InMemoryStore {
    pub fn with_appointments(appointments: Vec<AppointmentRecord>) -> Self {
        Self {
            appointments,
            ..Self::default()
        }
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScheduleStore for InMemoryStore {
    async fn active_appointments(
        &self,
        practitioner_id: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<AppointmentRecord>, PlanningError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.appointments
            .iter()
            .filter(|a| a.doctor_id == practitioner_id)
            .filter(|a| a.appointment_date >= from && a.appointment_date < until)
            .filter(|a| a.status.is_active())
            .cloned()
            .collect())
    }

    async fn consultations(
        &self,
        practitioner_id: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<ConsultationRecord>, PlanningError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.consultations
            .iter()
            .filter(|c| c.doctor_id == practitioner_id)
            .filter(|c| c.consultation_date >= from && c.consultation_date < until)
            .cloned()
            .collect())
    }
}

pub struct FailingStore;

#[async_trait]
impl ScheduleStore for FailingStore {
    async fn active_appointments(
        &self,
        _practitioner_id: &str,
        _from: NaiveDate,
        _until: NaiveDate,
    ) -> Result<Vec<AppointmentRecord>, PlanningError> {
        Err(PlanningError::Database("connection refused".to_string()))
    }

    async fn consultations(
        &self,
        _practitioner_id: &str,
        _from: NaiveDate,
        _until: NaiveDate,
    ) -> Result<Vec<ConsultationRecord>, PlanningError> {
        Err(PlanningError::Database("connection refused".to_string()))
    }
}

// ==============================================================================
// ORACLES
// ==============================================================================

/// Oracle answering from fixed results, optionally after a delay.
pub struct ScriptedOracle {
    pub profile: Result<ReasonProfile, OracleError>,
    pub slots: Result<OracleSlotResponse, OracleError>,
    pub duration: Result<u32, OracleError>,
    pub day_plan: Result<OracleDayPlan, OracleError>,
    pub delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl ScriptedOracle {
    /// Every capability fails as if the service were down.
    pub fn unavailable() -> Self {
        let down = || OracleError::Unavailable("service down".to_string());
        Self {
            profile: Err(down()),
            slots: Err(down()),
            duration: Err(down()),
            day_plan: Err(down()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            profile: Ok(ReasonProfile::default()),
            slots: Ok(OracleSlotResponse::default()),
            duration: Ok(45),
            day_plan: Ok(OracleDayPlan::default()),
            delay: Some(delay),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn answer<T: Clone>(&self, result: &Result<T, OracleError>) -> Result<T, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        result.clone()
    }
}

#[async_trait]
impl PlanningOracle for ScriptedOracle {
    async fn classify_reason(&self, _reason: &str) -> Result<ReasonProfile, OracleError> {
        self.answer(&self.profile).await
    }

    async fn score_slots(&self, _context: &ScoringContext) -> Result<OracleSlotResponse, OracleError> {
        self.answer(&self.slots).await
    }

    async fn estimate_duration(&self, _reason: &str) -> Result<u32, OracleError> {
        self.answer(&self.duration).await
    }

    async fn plan_day(&self, _context: &DayPlanContext) -> Result<OracleDayPlan, OracleError> {
        self.answer(&self.day_plan).await
    }
}
