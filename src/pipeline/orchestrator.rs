//! Per-channel summarization: one model call per batch, reassembled in order.

use chrono_tz::Tz;
use tracing::{debug, info};

use crate::core::collaborators::Summarizer;
use crate::core::models::{Channel, ChannelSummary, MessageBatch, TimeWindow};
use crate::errors::SummarizerError;

/// Header line for a channel summary: the window's start date in `timezone` plus a channel link.
#[must_use]
pub fn summary_header(window: &TimeWindow, timezone: Tz, channel: &Channel) -> String {
    let date = window.start().with_timezone(&timezone).format("%Y-%m-%d");
    format!("*Summary from <#{}> for {}*", channel.id, date)
}

/// Summarize every batch sequentially and join the fragments under `header`.
///
/// The first failing batch aborts the whole channel; nothing partial is returned.
///
/// # Errors
///
/// Propagates the summarizer's error unchanged.
pub async fn summarize_channel<S>(
    header: &str,
    batches: &[MessageBatch],
    language: &str,
    summarizer: &S,
) -> Result<ChannelSummary, SummarizerError>
where
    S: Summarizer + ?Sized,
{
    if batches.is_empty() {
        return Ok(ChannelSummary::empty());
    }

    let mut fragments = Vec::with_capacity(batches.len());
    for (index, batch) in batches.iter().enumerate() {
        debug!(
            "Summarizing batch {}/{} ({} messages, ~{} tokens)",
            index + 1,
            batches.len(),
            batch.len(),
            batch.estimated_tokens()
        );
        let fragment = summarizer.summarize(&batch.render(), language).await?;
        fragments.push(fragment);
    }

    info!("Summarized {} batches", fragments.len());
    Ok(ChannelSummary::new(header, &fragments))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::core::window::compute_window;

    #[derive(Default)]
    struct CountingSummarizer {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Summarizer for CountingSummarizer {
        async fn summarize(&self, text: &str, _language: &str) -> Result<String, SummarizerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(text.to_string())
        }
    }

    #[tokio::test]
    async fn test_no_batches_gives_empty_summary_without_model_calls() {
        let summarizer = CountingSummarizer::default();

        let summary = summarize_channel("h", &[], "English", &summarizer).await.unwrap();

        assert!(summary.is_empty());
        assert_eq!(summary, ChannelSummary::empty());
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_header_uses_window_start_in_timezone() {
        // 2024-05-17 16:00 UTC is already 2024-05-18 in Tokyo
        let now = Utc.with_ymd_and_hms(2024, 5, 18, 17, 0, 0).unwrap();
        let window = compute_window(now, 25).unwrap();
        let channel = Channel::new("C123", "general");

        assert_eq!(
            summary_header(&window, chrono_tz::Asia::Tokyo, &channel),
            "*Summary from <#C123> for 2024-05-18*"
        );
        assert_eq!(
            summary_header(&window, chrono_tz::UTC, &channel),
            "*Summary from <#C123> for 2024-05-17*"
        );
    }
}
