use std::time::Duration;

use anyhow::{bail, Context, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:8089";
pub const DEFAULT_PROGRESS_TOPIC: &str = "/topic/progress";

/// Client configuration loaded from environment variables.
/// Every variable has a default so a local backend works with no setup.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub events_url: String,
    pub progress_topic: String,
    pub request_timeout: Duration,
    pub stall_timeout: Duration,
    pub rust_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: DEFAULT_API_URL.to_string(),
            events_url: format!("{DEFAULT_API_URL}/events"),
            progress_topic: DEFAULT_PROGRESS_TOPIC.to_string(),
            request_timeout: Duration::from_secs(120),
            stall_timeout: Duration::from_secs(60),
            rust_log: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let api_url = std::env::var("INGEST_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let events_url =
            std::env::var("INGEST_EVENTS_URL").unwrap_or_else(|_| format!("{api_url}/events"));

        let config = Config {
            events_url,
            progress_topic: std::env::var("INGEST_PROGRESS_TOPIC")
                .unwrap_or_else(|_| DEFAULT_PROGRESS_TOPIC.to_string()),
            request_timeout: Duration::from_secs(secs_env("INGEST_REQUEST_TIMEOUT_SECS", 120)?),
            stall_timeout: Duration::from_secs(secs_env("INGEST_STALL_TIMEOUT_SECS", 60)?),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            api_url,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (key, url) in [("INGEST_API_URL", &self.api_url), ("INGEST_EVENTS_URL", &self.events_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                bail!("{key} must be an http(s) URL, got '{url}'");
            }
        }
        if self.stall_timeout.is_zero() {
            bail!("INGEST_STALL_TIMEOUT_SECS must be greater than zero");
        }
        if self.progress_topic.trim().is_empty() {
            bail!("INGEST_PROGRESS_TOPIC cannot be empty");
        }
        Ok(())
    }
}

fn secs_env(key: &str, default: u64) -> Result<u64> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of seconds")),
        Err(_) => Ok(default),
    }
}
