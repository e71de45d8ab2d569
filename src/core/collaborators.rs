//! Seams between the pipeline and the outside world.

use async_trait::async_trait;

use super::models::{Channel, ChatMessage, TimeWindow};
use crate::errors::SummarizerError;

/// Chat platform the summaries are read from and posted to.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Channels to summarize, in processing order.
    async fn list_channels(&self) -> Result<Vec<Channel>, SummarizerError>;

    /// User messages posted inside `window`, oldest first. `None` when there is nothing to read.
    async fn load_messages(
        &self,
        channel_id: &str,
        window: &TimeWindow,
    ) -> Result<Option<Vec<ChatMessage>>, SummarizerError>;

    /// Post `text` into `channel_id`.
    async fn publish(&self, text: &str, channel_id: &str) -> Result<(), SummarizerError>;
}

/// Language model turning a rendered chat log into a summary.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str, language: &str) -> Result<String, SummarizerError>;
}
