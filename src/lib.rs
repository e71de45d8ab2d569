//! Slack Summarizer - posts a daily digest of every channel the bot belongs to.
//!
//! Each run looks back over a fixed window (25 hours by default), reads the
//! messages of each channel, packs them into token-budgeted batches, asks a
//! chat model to summarize every batch and posts the combined summary.
//!
//! # Architecture
//!
//! - `core`: configuration, domain models, the time window and the
//!   collaborator traits (`ChatPlatform`, `Summarizer`)
//! - `pipeline`: chunking, per-channel orchestration, bounded retry and the runner
//! - `slack`: slack-morphism based Slack Web API client
//! - `ai`: OpenAI chat-completions client, prompt builder and token estimators
//!
//! # Example
//!
//! ```no_run
//! use slack_summarizer::ai::LlmClient;
//! use slack_summarizer::core::config::AppConfig;
//! use slack_summarizer::pipeline::PipelineRunner;
//! use slack_summarizer::slack::SlackClient;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     slack_summarizer::setup_logging();
//!
//!     let config = AppConfig::from_env()?;
//!     let runner = PipelineRunner::new(&config, SlackClient::new(&config)?, LlmClient::new(&config)?)?;
//!     let report = runner.run(chrono::Utc::now()).await?;
//!     println!("{} channels published", report.published());
//!     Ok(())
//! }
//! ```

pub mod ai;
pub mod core;
pub mod errors;
pub mod pipeline;
pub mod slack;
pub mod utils;

pub use errors::{ErrorKind, SummarizerError};

/// Configure structured JSON logging.
///
/// The level comes from `RUST_LOG` and defaults to `info`. Calling this more
/// than once is harmless; only the first call installs a subscriber.
///
/// # Example
///
/// ```
/// slack_summarizer::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
