//! Window → chunk → summarize → publish.

pub mod chunker;
pub mod orchestrator;
pub mod retry;
pub mod runner;

pub use chunker::chunk;
pub use orchestrator::{summarize_channel, summary_header};
pub use retry::{Backoff, RetryPolicy, execute_with_retry};
pub use runner::{ChannelOutcome, PipelineRunner, RunReport};
