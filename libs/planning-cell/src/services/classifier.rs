use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::models::{HistoricalProfile, ReasonProfile, DEFAULT_DURATION_MINUTES};
use crate::services::history::categorize_reason;
use crate::services::oracle::{clamp_duration, with_deadline, PlanningOracle};

/// Turns a free-text consultation reason into a `ReasonProfile`.
/// Never fails: every oracle problem yields the default profile.
pub struct ReasonClassifier {
    oracle: Arc<dyn PlanningOracle>,
    oracle_timeout: Duration,
}

impl ReasonClassifier {
    pub fn new(oracle: Arc<dyn PlanningOracle>, oracle_timeout: Duration) -> Self {
        Self { oracle, oracle_timeout }
    }

    pub async fn classify(&self, reason_text: &str) -> ReasonProfile {
        match with_deadline(self.oracle_timeout, self.oracle.classify_reason(reason_text)).await {
            Ok(profile) => {
                debug!(urgency = ?profile.urgency, kind = ?profile.consultation_type, "Reason classified");
                profile
            }
            Err(e) => {
                warn!("Reason classification fell back to default profile: {}", e);
                ReasonProfile::default()
            }
        }
    }

    /// Minutes for `reason_text`: the historical category duration when known,
    /// otherwise an oracle estimate clamped to [10, 60], otherwise 20.
    pub async fn estimate_duration(&self, reason_text: &str, history: &HistoricalProfile) -> u32 {
        let category = categorize_reason(reason_text);
        if let Some(minutes) = history.duration_by_reason_category.get(&category) {
            debug!(?category, minutes, "Duration taken from history");
            return *minutes;
        }

        match with_deadline(self.oracle_timeout, self.oracle.estimate_duration(reason_text)).await {
            Ok(minutes) => clamp_duration(f64::from(minutes)),
            Err(e) => {
                warn!("Duration estimate fell back to default: {}", e);
                DEFAULT_DURATION_MINUTES
            }
        }
    }
}
