//! LLM (`OpenAI`) API client module
//!
//! Encapsulates the chat-completions call that turns one batch of chat lines
//! into a summary fragment.

use std::time::Duration;

use async_trait::async_trait;
use openai_api_rs::v1::chat_completion::{ChatCompletionMessage, Content, MessageRole};
use openai_api_rs::v1::common::GPT4_O;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::info;

use super::prompt_builder::build_prompt;
use super::tokens::estimate_tokens;
use crate::core::collaborators::Summarizer;
use crate::core::config::AppConfig;
use crate::errors::SummarizerError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// LLM API client for generating summaries
pub struct LlmClient {
    http: Client,
    api_key: String,
    org_id: Option<String>,
    model_name: String,
    base_url: String,
    temperature: f32,
}

impl LlmClient {
    /// # Errors
    ///
    /// Returns `ModelError` if the HTTP client cannot be built.
    pub fn new(config: &AppConfig) -> Result<Self, SummarizerError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SummarizerError::Model(format!("Failed to build OpenAI HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key: config.openai_api_key.clone(),
            org_id: config.openai_org_id.clone(),
            model_name: config
                .openai_model
                .clone()
                .unwrap_or_else(|| GPT4_O.to_string()),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
        })
    }

    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP request to `OpenAI` fails or the response
    /// cannot be parsed into the expected shape.
    pub async fn generate_summary(
        &self,
        prompt: Vec<ChatCompletionMessage>,
    ) -> Result<String, SummarizerError> {
        #[cfg(feature = "debug-logs")]
        info!("Using ChatGPT prompt:\n{:?}", prompt);

        let estimated_input_tokens = prompt
            .iter()
            .map(|msg| match &msg.content {
                Content::Text(text) => estimate_tokens(text),
                _ => 0,
            })
            .sum::<usize>();
        info!(
            "Requesting summary from {} (~{} input tokens)",
            self.model_name, estimated_input_tokens
        );

        let request_body = json!({
            "model": self.model_name,
            "temperature": self.temperature,
            "messages": build_chat_input_from_prompt(&prompt),
        });

        let mut request = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body);
        if let Some(org) = &self.org_id {
            request = request.header("OpenAI-Organization", org);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SummarizerError::Model(format!("OpenAI API request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|e| {
                format!("Failed to read error response body (status {status}): {e}")
            });
            return Err(SummarizerError::Model(format!(
                "OpenAI API error (status {status}): {error_text}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SummarizerError::Model(format!("Failed to parse OpenAI response: {e}")))?;

        extract_completion_text(&body)
    }
}

#[async_trait]
impl Summarizer for LlmClient {
    async fn summarize(&self, text: &str, language: &str) -> Result<String, SummarizerError> {
        self.generate_summary(build_prompt(text, language)).await
    }
}

fn role_name(role: &MessageRole) -> &'static str {
    match role {
        MessageRole::system => "system",
        MessageRole::assistant => "assistant",
        _ => "user",
    }
}

/// Convert prompt messages into the `messages` array of a chat-completions request.
/// Only text content is sent.
pub(crate) fn build_chat_input_from_prompt(prompt: &[ChatCompletionMessage]) -> Vec<Value> {
    prompt
        .iter()
        .filter_map(|m| match &m.content {
            Content::Text(text) => Some(json!({
                "role": role_name(&m.role),
                "content": text,
            })),
            _ => None,
        })
        .collect()
}

/// Pull the first choice's message text out of a chat-completions response.
pub(crate) fn extract_completion_text(body: &Value) -> Result<String, SummarizerError> {
    body.get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .ok_or_else(|| SummarizerError::Model("OpenAI response contained no summary text".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::prompt_builder::build_prompt;

    #[test]
    fn test_build_chat_input_keeps_roles_and_text() {
        let prompt = build_prompt("alice: hi", "English");
        let input = build_chat_input_from_prompt(&prompt);

        assert_eq!(input.len(), 2);
        assert_eq!(input[0]["role"], "system");
        assert_eq!(input[1]["role"], "user");
        assert!(input[1]["content"].as_str().unwrap().contains("alice: hi"));
    }

    #[test]
    fn test_extract_completion_text() {
        let body = json!({
            "choices": [{"message": {"role": "assistant", "content": "  - topic A\n- topic B \n"}}]
        });
        assert_eq!(extract_completion_text(&body).unwrap(), "- topic A\n- topic B");
    }

    #[test]
    fn test_extract_completion_text_rejects_empty_choices() {
        for body in [json!({"choices": []}), json!({"choices": [{"message": {"content": "   "}}]}), json!({})] {
            let err = extract_completion_text(&body).unwrap_err();
            assert!(matches!(err, SummarizerError::Model(_)));
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_model_error() {
        let config = crate::core::config::AppConfig::from_lookup(|key| match key {
            "SLACK_BOT_TOKEN" => Some("xoxb-test".to_string()),
            "OPENAI_API_KEY" => Some("test_key".to_string()),
            "OPENAI_BASE_URL" => Some("http://127.0.0.1:9".to_string()),
            _ => None,
        })
        .unwrap();
        let client = LlmClient::new(&config).unwrap();

        let err = client.summarize("alice: hi", "English").await.unwrap_err();
        assert!(matches!(err, SummarizerError::Model(_)));
    }
}
