use serde::Deserialize;
use std::env;
use tracing::debug;

/// Runtime settings for the AI insight client.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_model")]
    pub ai_model: String,
    #[serde(default = "default_timeout_secs")]
    pub ai_timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub ai_max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub ai_temperature: f64,
}

fn default_base_url() -> String { "https://api.openai.com/v1".to_string() }
fn default_model() -> String { "gpt-3.5-turbo".to_string() }
fn default_timeout_secs() -> u64 { 10 }
fn default_max_tokens() -> u32 { 200 }
fn default_temperature() -> f64 { 0.7 }

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: default_base_url(),
            ai_model: default_model(),
            ai_timeout_secs: default_timeout_secs(),
            ai_max_tokens: default_max_tokens(),
            ai_temperature: default_temperature(),
        }
    }
}

impl Settings {
    /// Load `.env` if present, then read settings from the environment.
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Unparsable numbers keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        settings.openai_api_key = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty());
        if let Some(url) = lookup("OPENAI_BASE_URL") {
            settings.openai_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = lookup("DATALENS_AI_MODEL") {
            settings.ai_model = model;
        }
        if let Some(secs) = lookup("DATALENS_AI_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            settings.ai_timeout_secs = secs;
        }
        settings
    }
}
