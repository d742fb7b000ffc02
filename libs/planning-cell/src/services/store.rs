use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use shared_database::supabase::SupabaseClient;

use crate::models::{AppointmentRecord, ConsultationRecord, PlanningError};

/// Read-only view of a practitioner's appointments and consultations.
/// Ranges are half-open: `from <= date < until`.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Non-cancelled appointments, ordered by date then time.
    async fn active_appointments(
        &self,
        practitioner_id: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<AppointmentRecord>, PlanningError>;

    async fn consultations(
        &self,
        practitioner_id: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<ConsultationRecord>, PlanningError>;
}

pub struct SupabaseScheduleStore {
    supabase: Arc<SupabaseClient>,
    auth_token: Option<String>,
}

impl SupabaseScheduleStore {
    pub fn new(supabase: Arc<SupabaseClient>, auth_token: Option<String>) -> Self {
        Self { supabase, auth_token }
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, PlanningError> {
        let rows: Vec<Value> = self.supabase
            .select_rows(path, self.auth_token.as_deref())
            .await
            .map_err(|e| PlanningError::Database(e.to_string()))?;

        let total = rows.len();
        let records: Vec<T> = rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<T>(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping malformed row: {}", e);
                    None
                }
            })
            .collect();

        debug!("Fetched {} rows ({} usable) from {}", total, records.len(), path);
        Ok(records)
    }
}

#[async_trait]
impl ScheduleStore for SupabaseScheduleStore {
    async fn active_appointments(
        &self,
        practitioner_id: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<AppointmentRecord>, PlanningError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&appointment_date=gte.{}&appointment_date=lt.{}&status=neq.cancelled&order=appointment_date.asc,appointment_time.asc",
            urlencoding::encode(practitioner_id),
            from.format("%Y-%m-%d"),
            until.format("%Y-%m-%d"),
        );

        let records: Vec<AppointmentRecord> = self.fetch(&path).await?;
        Ok(records
            .into_iter()
            .filter(|record| record.status.is_active())
            .collect())
    }

    async fn consultations(
        &self,
        practitioner_id: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<ConsultationRecord>, PlanningError> {
        let path = format!(
            "/rest/v1/consultations?doctor_id=eq.{}&consultation_date=gte.{}&consultation_date=lt.{}&order=consultation_date.asc",
            urlencoding::encode(practitioner_id),
            from.format("%Y-%m-%d"),
            until.format("%Y-%m-%d"),
        );

        self.fetch(&path).await
    }
}
