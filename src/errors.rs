use slack_morphism::errors::SlackClientError;
use thiserror::Error;

/// Slack API error codes that are worth another attempt.
const TRANSIENT_SLACK_CODES: [&str; 5] = [
    "ratelimited",
    "internal_error",
    "fatal_error",
    "service_unavailable",
    "request_timeout",
];

/// Whether a chat-platform failure may succeed if the call is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformErrorKind {
    Transient,
    Permanent,
}

/// Flat classification of [`SummarizerError`], used by retry policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidConfiguration,
    TransientPlatform,
    PermanentPlatform,
    Model,
    RetryExhausted,
}

#[derive(Debug, Error)]
pub enum SummarizerError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to access Slack API: {message}")]
    Platform {
        kind: PlatformErrorKind,
        message: String,
    },

    #[error("Failed to access OpenAI API: {0}")]
    Model(String),

    #[error("Gave up after {attempts} attempts: {source}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        source: Box<SummarizerError>,
    },
}

impl SummarizerError {
    pub fn transient(message: impl Into<String>) -> Self {
        SummarizerError::Platform {
            kind: PlatformErrorKind::Transient,
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        SummarizerError::Platform {
            kind: PlatformErrorKind::Permanent,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            SummarizerError::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
            SummarizerError::Platform {
                kind: PlatformErrorKind::Transient,
                ..
            } => ErrorKind::TransientPlatform,
            SummarizerError::Platform {
                kind: PlatformErrorKind::Permanent,
                ..
            } => ErrorKind::PermanentPlatform,
            SummarizerError::Model(_) => ErrorKind::Model,
            SummarizerError::RetryExhausted { .. } => ErrorKind::RetryExhausted,
        }
    }

    /// True when this is a Slack API error carrying exactly `code`.
    #[must_use]
    pub fn is_platform_code(&self, code: &str) -> bool {
        matches!(self, SummarizerError::Platform { message, .. } if message == code)
    }
}

#[must_use]
pub fn is_transient_slack_code(code: &str) -> bool {
    TRANSIENT_SLACK_CODES.contains(&code)
}

impl From<SlackClientError> for SummarizerError {
    fn from(error: SlackClientError) -> Self {
        match &error {
            // Keep the bare code so callers can branch on it (e.g. `not_in_channel`).
            SlackClientError::ApiError(api) => {
                if is_transient_slack_code(&api.code) {
                    SummarizerError::transient(api.code.clone())
                } else {
                    SummarizerError::permanent(api.code.clone())
                }
            }
            SlackClientError::HttpError(http) => {
                let status = http.status_code;
                if status.is_server_error() || status.as_u16() == 429 {
                    SummarizerError::transient(error.to_string())
                } else {
                    SummarizerError::permanent(error.to_string())
                }
            }
            SlackClientError::RateLimitError(_) | SlackClientError::HttpProtocolError(_) => {
                SummarizerError::transient(error.to_string())
            }
            _ => SummarizerError::permanent(error.to_string()),
        }
    }
}
