//! One full summarization pass over every channel.

use chrono::{DateTime, Utc};
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use super::chunker::chunk;
use super::orchestrator::{summarize_channel, summary_header};
use super::retry::{Backoff, RetryPolicy, execute_with_retry};
use crate::ai::tokens::{TokenEstimator, estimator_for};
use crate::core::collaborators::{ChatPlatform, Summarizer};
use crate::core::config::AppConfig;
use crate::core::models::{Channel, ChatMessage, TimeWindow};
use crate::core::window::compute_window;
use crate::errors::{ErrorKind, SummarizerError};
use crate::utils::text::strip_emoji;

/// What happened to one channel during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelOutcome {
    Published { batches: usize },
    /// Summary produced but only logged because the run is a dry run.
    DryRun { batches: usize },
    /// No messages in the window.
    Skipped,
    Failed(String),
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<(Channel, ChannelOutcome)>,
}

impl RunReport {
    #[must_use]
    pub fn published(&self) -> usize {
        self.count(|o| matches!(o, ChannelOutcome::Published { .. }))
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ChannelOutcome::Skipped))
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ChannelOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&ChannelOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

pub struct PipelineRunner<'a, P, S> {
    config: &'a AppConfig,
    platform: P,
    summarizer: S,
    estimator: Box<dyn TokenEstimator + Send + Sync>,
    publish_policy: RetryPolicy,
}

impl<'a, P, S> PipelineRunner<'a, P, S>
where
    P: ChatPlatform,
    S: Summarizer,
{
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` when the retry settings are unusable.
    pub fn new(config: &'a AppConfig, platform: P, summarizer: S) -> Result<Self, SummarizerError> {
        let publish_policy = RetryPolicy::new(config.retry_max_attempts, ErrorKind::TransientPlatform)?
            .with_backoff(Backoff::Exponential {
                initial: config.retry_base_delay,
                max: config.retry_max_delay,
            });

        Ok(Self {
            config,
            platform,
            summarizer,
            estimator: estimator_for(config.token_estimator),
            publish_policy,
        })
    }

    /// Swap the token estimator, e.g. for an exact tokenizer.
    #[must_use]
    pub fn with_estimator(mut self, estimator: Box<dyn TokenEstimator + Send + Sync>) -> Self {
        self.estimator = estimator;
        self
    }

    #[must_use]
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Summarize the window ending at `now` for every channel.
    ///
    /// Per-channel failures are recorded in the report and do not stop the run.
    ///
    /// # Errors
    ///
    /// Returns an error only for configuration problems or when the channel
    /// list itself cannot be fetched.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunReport, SummarizerError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("summary_run", %run_id);
        self.run_inner(now).instrument(span).await
    }

    async fn run_inner(&self, now: DateTime<Utc>) -> Result<RunReport, SummarizerError> {
        let window = compute_window(now, self.config.lookback_hours)?;
        info!(
            "Summarizing window {} .. {}",
            window.start().with_timezone(&self.config.timezone),
            window.end().with_timezone(&self.config.timezone)
        );

        let channels = self.platform.list_channels().await?;
        info!("Found {} channels", channels.len());

        let mut report = RunReport::default();
        for channel in channels {
            let span = info_span!("channel", channel_id = %channel.id, channel_name = %channel.name);
            let outcome = match self.process_channel(&channel, &window).instrument(span).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Channel {} failed: {}", channel.name, e);
                    ChannelOutcome::Failed(e.to_string())
                }
            };
            report.outcomes.push((channel, outcome));
        }

        info!(
            "Run finished: {} published, {} skipped, {} failed",
            report.published(),
            report.skipped(),
            report.failed()
        );
        Ok(report)
    }

    async fn process_channel(
        &self,
        channel: &Channel,
        window: &TimeWindow,
    ) -> Result<ChannelOutcome, SummarizerError> {
        let Some(messages) = self.platform.load_messages(&channel.id, window).await? else {
            info!("No messages in #{}", channel.name);
            return Ok(ChannelOutcome::Skipped);
        };
        if messages.is_empty() {
            info!("No messages in #{}", channel.name);
            return Ok(ChannelOutcome::Skipped);
        }

        let cleaned: Vec<ChatMessage> = messages
            .into_iter()
            .map(|m| ChatMessage {
                text: strip_emoji(&m.text),
                ..m
            })
            .collect();

        let batches = chunk(cleaned, self.config.max_body_tokens, self.estimator.as_ref());
        let header = summary_header(window, self.config.timezone, channel);
        let summary =
            summarize_channel(&header, &batches, &self.config.language, &self.summarizer).await?;

        if summary.is_empty() {
            return Ok(ChannelOutcome::Skipped);
        }

        if self.config.dry_run {
            info!("Dry run, not publishing summary for #{}:\n{}", channel.name, summary.text());
            return Ok(ChannelOutcome::DryRun {
                batches: batches.len(),
            });
        }

        #[cfg(feature = "debug-logs")]
        tracing::debug!("Publishing summary:\n{}", summary.text());

        let target = self.config.post_channel_id.as_deref().unwrap_or(&channel.id);
        execute_with_retry(&self.publish_policy, || {
            self.platform.publish(summary.text(), target)
        })
        .await
        .inspect_err(|e| warn!("Failed to publish summary for #{}: {}", channel.name, e))?;

        info!("Published summary for #{} to {}", channel.name, target);
        Ok(ChannelOutcome::Published {
            batches: batches.len(),
        })
    }
}
