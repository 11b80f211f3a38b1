use std::env;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Runtime knobs for the remote layer, read from the process environment.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub api_base: String,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub video_poll_interval: Duration,
    pub request_timeout: Duration,
    pub batch_stagger: Duration,
    pub analysis_model: Option<String>,
    pub video_model: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            max_attempts: 3,
            retry_delay: Duration::from_millis(2000),
            video_poll_interval: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
            batch_stagger: Duration::from_millis(300),
            analysis_model: None,
            video_model: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();
        Self {
            api_base: read("GEMINI_API_BASE")
                .map(|value| value.trim_end_matches('/').to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or(defaults.api_base),
            max_attempts: read("ARCHVIZ_MAX_ATTEMPTS")
                .and_then(|value| parse_clamped(&value, 1, 8))
                .map(|value| value as u32)
                .unwrap_or(defaults.max_attempts),
            retry_delay: read("ARCHVIZ_RETRY_DELAY_MS")
                .and_then(|value| parse_clamped(&value, 0, 60_000))
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_delay),
            video_poll_interval: read("ARCHVIZ_VIDEO_POLL_SECS")
                .and_then(|value| parse_clamped(&value, 1, 600))
                .map(Duration::from_secs)
                .unwrap_or(defaults.video_poll_interval),
            request_timeout: read("ARCHVIZ_REQUEST_TIMEOUT_SECS")
                .and_then(|value| parse_clamped(&value, 5, 1800))
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            batch_stagger: read("ARCHVIZ_BATCH_STAGGER_MS")
                .and_then(|value| parse_clamped(&value, 0, 10_000))
                .map(Duration::from_millis)
                .unwrap_or(defaults.batch_stagger),
            analysis_model: read("ARCHVIZ_ANALYSIS_MODEL"),
            video_model: read("ARCHVIZ_VIDEO_MODEL"),
        }
    }
}

pub(crate) fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_clamped(raw: &str, min: u64, max: u64) -> Option<u64> {
    raw.parse::<u64>().ok().map(|value| value.clamp(min, max))
}
