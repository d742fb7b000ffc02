use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::{json, Value};
use tokio::time::timeout;
use tracing::{debug, warn};

use shared_config::AppConfig;

use crate::models::{DayPlanContext, OracleDayPlan, OracleSlotResponse, ReasonProfile, ScoringContext};
use crate::services::oracle::{
    day_plan_from_value, parse_duration_text, parse_json_response, reason_profile_from_value,
    slot_response_from_value, OracleError, PlanningOracle,
};
use crate::services::prompts;

const TEMPERATURE: f64 = 0.4;

/// `PlanningOracle` backed by the Gemini `generateContent` REST endpoint.
pub struct GeminiOracle {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
    request_timeout: Duration,
}

impl GeminiOracle {
    pub fn new(config: &AppConfig) -> Self {
        let request_timeout = config.oracle_timeout();
        let http_client = Client::builder()
            .timeout(request_timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build Gemini HTTP client with timeout, using defaults: {}", e);
                Client::new()
            });

        Self {
            http_client,
            api_key: config.gemini_api_key.clone(),
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            model: config.gemini_model.clone(),
            request_timeout,
        }
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.base_url.is_empty() && !self.model.is_empty()
    }

    /// Sends one prompt and returns the first candidate's text. Single attempt.
    pub async fn generate(&self, prompt: &str) -> Result<String, OracleError> {
        if !self.is_configured() {
            return Err(OracleError::NotConfigured);
        }

        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        let body = json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ],
            "generationConfig": { "temperature": TEMPERATURE }
        });

        debug!("Calling Gemini model {}", self.model);

        let call = async {
            let response = self.http_client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .header(header::CONTENT_TYPE, "application/json")
                .json(&body)
                .send()
                .await
                .map_err(|e| OracleError::Unavailable(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();
                return Err(OracleError::Unavailable(format!("Gemini API error ({}): {}", status, error_text)));
            }

            response
                .json::<Value>()
                .await
                .map_err(|e| OracleError::Malformed(format!("Gemini envelope is not JSON: {}", e)))
        };

        let envelope = timeout(self.request_timeout, call)
            .await
            .map_err(|_| OracleError::Timeout(self.request_timeout))??;

        envelope["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| OracleError::Malformed("Gemini response has no candidate text".to_string()))
    }
}

#[async_trait]
impl PlanningOracle for GeminiOracle {
    async fn classify_reason(&self, reason: &str) -> Result<ReasonProfile, OracleError> {
        let text = self.generate(&prompts::reason_prompt(reason)).await?;
        reason_profile_from_value(&parse_json_response(&text)?)
    }

    async fn score_slots(&self, context: &ScoringContext) -> Result<OracleSlotResponse, OracleError> {
        let text = self.generate(&prompts::scoring_prompt(context)).await?;
        slot_response_from_value(&parse_json_response(&text)?)
    }

    async fn estimate_duration(&self, reason: &str) -> Result<u32, OracleError> {
        let text = self.generate(&prompts::duration_prompt(reason)).await?;
        parse_duration_text(&text)
    }

    async fn plan_day(&self, context: &DayPlanContext) -> Result<OracleDayPlan, OracleError> {
        let text = self.generate(&prompts::day_plan_prompt(context)).await?;
        day_plan_from_value(&parse_json_response(&text)?)
    }
}
