//! All AI/LLM functionality

pub mod client;
pub mod prompt_builder;
pub mod tokens;

// Re-export main types for convenience
pub use client::LlmClient;
pub use tokens::{CharRatioEstimator, HeuristicEstimator, TokenEstimator, estimate_tokens};
