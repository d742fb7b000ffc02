use std::env;
use std::time::Duration;
use tracing::warn;

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 20;
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub oracle_timeout_secs: u64,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            gemini_api_key: env::var("GEMINI_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("GEMINI_API_KEY not set, planning suggestions will use fallback strategies");
                    String::new()
                }),
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string()),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
            oracle_timeout_secs: parse_or_default("ORACLE_TIMEOUT_SECS", DEFAULT_ORACLE_TIMEOUT_SECS),
            port: parse_or_default("PORT", DEFAULT_PORT),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    /// Test configuration with both external services at the given base urls.
    pub fn for_endpoints(supabase_url: &str, gemini_base_url: &str) -> Self {
        Self {
            supabase_url: supabase_url.to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            gemini_api_key: "test-gemini-key".to_string(),
            gemini_base_url: gemini_base_url.to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            oracle_timeout_secs: 5,
            port: DEFAULT_PORT,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
    }

    pub fn is_oracle_configured(&self) -> bool {
        !self.gemini_api_key.is_empty()
            && !self.gemini_base_url.is_empty()
            && !self.gemini_model.is_empty()
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }
}

fn parse_or_default<T: std::str::FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
