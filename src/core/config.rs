use std::env;
use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;

use crate::errors::SummarizerError;

pub const DEFAULT_LANGUAGE: &str = "Japanese";
pub const DEFAULT_TIMEZONE: &str = "Asia/Tokyo";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_BODY_TOKENS: usize = 3000;
pub const DEFAULT_LOOKBACK_HOURS: i64 = 25;
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Which token estimator the chunker uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimatorChoice {
    Heuristic,
    CharRatio,
}

/// Process-wide settings, read once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub slack_bot_token: String,
    pub openai_api_key: String,
    pub openai_org_id: Option<String>,
    pub openai_model: Option<String>,
    pub openai_base_url: String,
    /// Where summaries go. `None` posts each summary back into its source channel.
    pub post_channel_id: Option<String>,
    pub language: String,
    pub timezone: Tz,
    pub temperature: f32,
    pub max_body_tokens: usize,
    pub lookback_hours: i64,
    pub retry_max_attempts: u32,
    pub retry_base_delay: Duration,
    pub retry_max_delay: Duration,
    pub slack_api_interval: Duration,
    pub resolve_user_names: bool,
    pub token_estimator: EstimatorChoice,
    pub dry_run: bool,
}

impl AppConfig {
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` when a required variable is missing or
    /// any value fails to parse.
    pub fn from_env() -> Result<Self, SummarizerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` when a required key is missing or
    /// any value fails to parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SummarizerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &str| {
            get(key).ok_or_else(|| SummarizerError::InvalidConfiguration(format!("{key} must be set")))
        };

        let timezone_name = get("TIMEZONE").unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let timezone = timezone_name.parse::<Tz>().map_err(|e| {
            SummarizerError::InvalidConfiguration(format!("TIMEZONE: {e}"))
        })?;

        let temperature = parse_or(get("TEMPERATURE"), "TEMPERATURE", DEFAULT_TEMPERATURE)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(SummarizerError::InvalidConfiguration(format!(
                "TEMPERATURE: {temperature} is outside 0.0..=2.0"
            )));
        }

        let max_body_tokens =
            parse_or(get("MAX_BODY_TOKENS"), "MAX_BODY_TOKENS", DEFAULT_MAX_BODY_TOKENS)?;
        if max_body_tokens == 0 {
            return Err(SummarizerError::InvalidConfiguration(
                "MAX_BODY_TOKENS must be greater than zero".to_string(),
            ));
        }

        let lookback_hours =
            parse_or(get("LOOKBACK_HOURS"), "LOOKBACK_HOURS", DEFAULT_LOOKBACK_HOURS)?;
        if lookback_hours <= 0 {
            return Err(SummarizerError::InvalidConfiguration(
                "LOOKBACK_HOURS must be greater than zero".to_string(),
            ));
        }

        let retry_max_attempts = parse_or(get("RETRY_MAX_ATTEMPTS"), "RETRY_MAX_ATTEMPTS", 3u32)?;
        if retry_max_attempts == 0 {
            return Err(SummarizerError::InvalidConfiguration(
                "RETRY_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }

        let retry_base_delay = Duration::from_millis(parse_or(
            get("RETRY_BASE_DELAY_MS"),
            "RETRY_BASE_DELAY_MS",
            1_000u64,
        )?);
        let retry_max_delay = Duration::from_millis(parse_or(
            get("RETRY_MAX_DELAY_MS"),
            "RETRY_MAX_DELAY_MS",
            30_000u64,
        )?);
        let slack_api_interval = Duration::from_millis(parse_or(
            get("SLACK_API_INTERVAL_MS"),
            "SLACK_API_INTERVAL_MS",
            3_000u64,
        )?);

        let token_estimator = match get("TOKEN_ESTIMATOR").as_deref() {
            None | Some("heuristic") => EstimatorChoice::Heuristic,
            Some("chars") => EstimatorChoice::CharRatio,
            Some(other) => {
                return Err(SummarizerError::InvalidConfiguration(format!(
                    "TOKEN_ESTIMATOR: unknown estimator '{other}'"
                )));
            }
        };

        Ok(Self {
            slack_bot_token: required("SLACK_BOT_TOKEN")?,
            openai_api_key: required("OPENAI_API_KEY")?,
            openai_org_id: get("OPENAI_ORG_ID"),
            openai_model: get("OPENAI_MODEL"),
            openai_base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            post_channel_id: get("SLACK_POST_CHANNEL_ID"),
            language: get("LANGUAGE").unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            timezone,
            temperature,
            max_body_tokens,
            lookback_hours,
            retry_max_attempts,
            retry_base_delay,
            retry_max_delay,
            slack_api_interval,
            resolve_user_names: get("RESOLVE_USER_NAMES").is_some_and(|v| is_truthy(&v)),
            token_estimator,
            dry_run: get("DEBUG").is_some(),
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T, SummarizerError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse::<T>()
            .map_err(|e| SummarizerError::InvalidConfiguration(format!("{key}: {e}"))),
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
