//! All Slack-specific functionality

pub mod client;

// Re-export main types for convenience
pub use client::{SlackClient, parse_slack_ts, to_slack_ts};
