pub mod collaborators;
pub mod config;
pub mod models;
pub mod window;

pub use collaborators::{ChatPlatform, Summarizer};
pub use config::AppConfig;
pub use models::{Channel, ChannelSummary, ChatMessage, MessageBatch, TimeWindow};
pub use window::compute_window;
