use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::{json, Value};

use shared_config::AppConfig;

pub const TEST_BEARER_TOKEN: &str = "test-user-token";

pub struct TestConfig {
    pub supabase_url: String,
    pub gemini_base_url: String,
    pub gemini_api_key: String,
    pub oracle_timeout_secs: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            gemini_base_url: "http://localhost:54322".to_string(),
            gemini_api_key: "test-gemini-key".to_string(),
            oracle_timeout_secs: 5,
        }
    }
}

impl TestConfig {
    /// Both external services served by one mock server.
    pub fn with_mock_server(uri: &str) -> Self {
        Self {
            supabase_url: uri.to_string(),
            gemini_base_url: uri.to_string(),
            ..Self::default()
        }
    }

    pub fn without_oracle(mut self) -> Self {
        self.gemini_api_key = String::new();
        self
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            gemini_api_key: self.gemini_api_key.clone(),
            oracle_timeout_secs: self.oracle_timeout_secs,
            ..AppConfig::for_endpoints(&self.supabase_url, &self.gemini_base_url)
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub struct MockPlanningResponses;

impl MockPlanningResponses {
    pub fn appointment_row(doctor_id: &str, date: &str, time: &str) -> Value {
        json!({
            "id": format!("apt-{}-{}", date, time),
            "doctor_id": doctor_id,
            "patient_id": "patient-1",
            "appointment_date": date,
            "appointment_time": time,
            "reason": "Consultation",
            "status": "confirmed"
        })
    }

    pub fn cancelled_appointment_row(doctor_id: &str, date: &str, time: &str) -> Value {
        let mut row = Self::appointment_row(doctor_id, date, time);
        row["status"] = json!("cancelled");
        row
    }

    pub fn consultation_row(doctor_id: &str, date: &str, reason: &str) -> Value {
        json!({
            "id": format!("cons-{}", date),
            "doctor_id": doctor_id,
            "consultation_date": date,
            "reason": reason
        })
    }

    /// `generateContent` envelope carrying `text` as the first candidate.
    pub fn gemini_text_response(text: &str) -> Value {
        json!({
            "candidates": [
                {
                    "content": {
                        "parts": [ { "text": text } ],
                        "role": "model"
                    },
                    "finishReason": "STOP"
                }
            ]
        })
    }

    pub fn gemini_json_response(payload: &Value) -> Value {
        Self::gemini_text_response(&format!("```json\n{}\n```", payload))
    }

    pub fn error_response(message: &str, code: &str) -> Value {
        json!({
            "error": {
                "message": message,
                "code": code
            }
        })
    }
}
