//! Slack API client module
//!
//! Encapsulates the Slack Web API calls the summarizer needs, with pacing,
//! retry on transient failures and conversion into domain messages.

use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use slack_morphism::hyper_tokio::{SlackClientHyperConnector, SlackHyperClient};
use slack_morphism::prelude::{
    SlackApiChatPostMessageRequest, SlackApiConversationsHistoryRequest,
    SlackApiConversationsJoinRequest, SlackApiUsersInfoRequest,
};
use slack_morphism::{
    SlackApiToken, SlackApiTokenValue, SlackChannelId, SlackHistoryMessage, SlackMessageContent,
    SlackTs, SlackUserId,
};
use tracing::{debug, info, warn};

use crate::core::collaborators::ChatPlatform;
use crate::core::config::AppConfig;
use crate::core::models::{Channel, ChatMessage, TimeWindow};
use crate::errors::{ErrorKind, SummarizerError, is_transient_slack_code};
use crate::pipeline::retry::{Backoff, RetryPolicy, execute_with_retry};
use crate::utils::channels::sort_by_numeric_prefix;
use crate::utils::filters::filter_user_messages;
use crate::utils::text::{mentioned_user_ids, replace_channel_refs, replace_user_mentions};

// Build the Slack client connector without panicking.
// If connector construction fails, store None and surface an error at call sites.
static SLACK_CLIENT: LazyLock<Option<SlackHyperClient>> =
    LazyLock::new(|| match SlackClientHyperConnector::new() {
        Ok(connector) => Some(SlackHyperClient::new(connector)),
        Err(e) => {
            warn!("Failed to create Slack HTTP connector: {}", e);
            None
        }
    });

static HTTP_CLIENT: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| Client::new())
});

const HISTORY_PAGE_LIMIT: u16 = 1000;
const CHANNEL_PAGE_LIMIT: &str = "1000";
const READ_ATTEMPTS: u32 = 5;
const JOIN_SETTLE_DELAY: Duration = Duration::from_secs(5);
const ERROR_NOT_IN_CHANNEL: &str = "not_in_channel";

#[derive(Debug, Deserialize)]
struct UsersConversationsResponse {
    ok: bool,
    #[serde(default)]
    channels: Vec<ConversationInfo>,
    response_metadata: Option<ResponseMetadata>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConversationInfo {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    is_channel: bool,
    #[serde(default)]
    is_archived: bool,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    next_cursor: Option<String>,
}

/// Format an instant as a Slack timestamp (`seconds.micros`).
#[must_use]
pub fn to_slack_ts(instant: DateTime<Utc>) -> SlackTs {
    SlackTs(format!(
        "{}.{:06}",
        instant.timestamp(),
        instant.timestamp_subsec_micros()
    ))
}

/// Parse a Slack timestamp (`"1715936400.123456"`) into an instant.
#[must_use]
pub fn parse_slack_ts(ts: &str) -> Option<DateTime<Utc>> {
    let (secs, frac) = ts.split_once('.').unwrap_or((ts, "0"));
    let secs: i64 = secs.parse().ok()?;
    let micros: u32 = format!("{frac:0<6}").get(..6)?.parse().ok()?;
    DateTime::from_timestamp(secs, micros * 1_000)
}

/// Slack API client with pacing, retry and error classification
pub struct SlackClient {
    token: SlackApiToken,
    call_interval: Duration,
    resolve_user_names: bool,
    read_policy: RetryPolicy,
    user_names: Mutex<HashMap<String, String>>,
}

impl SlackClient {
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` when the retry policy cannot be built.
    pub fn new(config: &AppConfig) -> Result<Self, SummarizerError> {
        let read_policy = RetryPolicy::new(READ_ATTEMPTS, ErrorKind::TransientPlatform)?
            .with_backoff(Backoff::Exponential {
                initial: config.retry_base_delay,
                max: config.retry_max_delay,
            });

        Ok(Self {
            token: SlackApiToken::new(SlackApiTokenValue::new(config.slack_bot_token.clone())),
            call_interval: config.slack_api_interval,
            resolve_user_names: config.resolve_user_names,
            read_policy,
            user_names: Mutex::new(HashMap::new()),
        })
    }

    /// Most Web API methods used here are tier 3, about 20 calls a minute.
    async fn wait_api_call(&self) {
        if !self.call_interval.is_zero() {
            tokio::time::sleep(self.call_interval).await;
        }
    }

    fn hyper_client() -> Result<&'static SlackHyperClient, SummarizerError> {
        SLACK_CLIENT
            .as_ref()
            .ok_or_else(|| SummarizerError::permanent("Slack HTTP connector not initialized"))
    }

    async fn with_retry<F, Fut, T>(&self, operation: F) -> Result<T, SummarizerError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, SummarizerError>>,
    {
        execute_with_retry(&self.read_policy, operation).await
    }

    /// Public channels the bot is a member of, ordered by numeric name prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the Slack API request or response parsing fails.
    pub async fn get_channels(&self) -> Result<Vec<Channel>, SummarizerError> {
        let mut channels = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            self.wait_api_call().await;
            let page = self
                .with_retry(|| self.users_conversations_page(cursor.as_deref()))
                .await?;

            channels.extend(
                page.channels
                    .into_iter()
                    .filter(|c| c.is_channel && !c.is_archived)
                    .map(|c| Channel::new(c.id, c.name)),
            );

            match page
                .response_metadata
                .and_then(|m| m.next_cursor)
                .filter(|c| !c.is_empty())
            {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        sort_by_numeric_prefix(&mut channels);
        Ok(channels)
    }

    async fn users_conversations_page(
        &self,
        cursor: Option<&str>,
    ) -> Result<UsersConversationsResponse, SummarizerError> {
        let mut form = vec![
            ("types", "public_channel"),
            ("exclude_archived", "true"),
            ("limit", CHANNEL_PAGE_LIMIT),
        ];
        if let Some(c) = cursor {
            form.push(("cursor", c));
        }

        let resp = HTTP_CLIENT
            .post("https://slack.com/api/users.conversations")
            .bearer_auth(&self.token.token_value.0)
            .form(&form)
            .send()
            .await
            .map_err(|e| SummarizerError::transient(format!("users.conversations HTTP: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let message = format!("users.conversations HTTP {status}");
            return Err(if status.is_server_error() || status.as_u16() == 429 {
                SummarizerError::transient(message)
            } else {
                SummarizerError::permanent(message)
            });
        }

        let body: UsersConversationsResponse = resp.json().await.map_err(|e| {
            SummarizerError::permanent(format!("users.conversations JSON parse error: {e}"))
        })?;

        if !body.ok {
            let code = body.error.unwrap_or_else(|| "unknown".to_string());
            return Err(if is_transient_slack_code(&code) {
                SummarizerError::transient(code)
            } else {
                SummarizerError::permanent(code)
            });
        }

        Ok(body)
    }

    /// Every message in `channel_id` between `oldest` and `latest`, newest first as Slack returns them.
    ///
    /// # Errors
    ///
    /// Returns an error if any history page cannot be fetched.
    pub async fn get_history(
        &self,
        channel_id: &str,
        window: &TimeWindow,
    ) -> Result<Vec<SlackHistoryMessage>, SummarizerError> {
        let session = Self::hyper_client()?.open_session(&self.token);
        let mut request = SlackApiConversationsHistoryRequest::new()
            .with_channel(SlackChannelId(channel_id.to_string()))
            .with_oldest(to_slack_ts(window.start()))
            .with_latest(to_slack_ts(window.end()))
            .with_inclusive(true)
            .with_limit(HISTORY_PAGE_LIMIT);

        let mut messages = Vec::new();
        loop {
            self.wait_api_call().await;
            let page = self
                .with_retry(|| async {
                    Ok(session.conversations_history(&request).await?)
                })
                .await?;

            messages.extend(page.messages);

            let next_cursor = page
                .response_metadata
                .and_then(|m| m.next_cursor)
                .filter(|c| !c.0.is_empty());
            match (page.has_more, next_cursor) {
                (Some(true), Some(cursor)) => request = request.with_cursor(cursor),
                _ => break,
            }
        }

        Ok(messages)
    }

    /// # Errors
    pub async fn join_channel(&self, channel_id: &str) -> Result<(), SummarizerError> {
        self.wait_api_call().await;
        self.with_retry(|| async {
            let session = Self::hyper_client()?.open_session(&self.token);
            let request = SlackApiConversationsJoinRequest::new(SlackChannelId(channel_id.to_string()));
            session.conversations_join(&request).await?;
            Ok(())
        })
        .await?;

        info!("Joined channel {}", channel_id);
        Ok(())
    }

    /// Display name for `user_id`, falling back to the id itself. Results are cached.
    pub async fn get_user_name(&self, user_id: &str) -> String {
        if let Some(name) = self.cached_user_name(user_id) {
            return name;
        }

        self.wait_api_call().await;
        let fetched = self
            .with_retry(|| async {
                let session = Self::hyper_client()?.open_session(&self.token);
                let request = SlackApiUsersInfoRequest::new(SlackUserId(user_id.to_string()));
                Ok(session.users_info(&request).await?)
            })
            .await;

        let name = match fetched {
            Ok(info) => info
                .user
                .profile
                .as_ref()
                .and_then(|p| p.display_name.clone().filter(|n| !n.is_empty()))
                .or_else(|| info.user.profile.as_ref().and_then(|p| p.real_name.clone()))
                .unwrap_or_else(|| user_id.to_string()),
            Err(e) => {
                warn!("Failed to fetch user info for {}: {}", user_id, e);
                user_id.to_string()
            }
        };

        if let Ok(mut cache) = self.user_names.lock() {
            cache.insert(user_id.to_string(), name.clone());
        }
        name
    }

    fn cached_user_name(&self, user_id: &str) -> Option<String> {
        self.user_names
            .lock()
            .ok()
            .and_then(|cache| cache.get(user_id).cloned())
    }

    async fn to_chat_message(&self, msg: SlackHistoryMessage) -> Option<ChatMessage> {
        let user_id = msg.sender.user.as_ref()?.0.clone();
        let raw_text = msg.content.text?;
        let timestamp = parse_slack_ts(&msg.origin.ts.0).unwrap_or_else(Utc::now);

        let mut names = HashMap::new();
        if self.resolve_user_names {
            for id in mentioned_user_ids(&raw_text).into_iter().chain([user_id.clone()]) {
                if !names.contains_key(&id) {
                    let name = self.get_user_name(&id).await;
                    names.insert(id, name);
                }
            }
        }

        let text = replace_channel_refs(&replace_user_mentions(&raw_text, &names));
        let speaker = names.get(&user_id).cloned().unwrap_or(user_id);
        Some(ChatMessage::new(speaker, text, timestamp))
    }

    /// # Errors
    pub async fn post_message(&self, channel_id: &str, message: &str) -> Result<(), SummarizerError> {
        self.wait_api_call().await;
        let session = Self::hyper_client()?.open_session(&self.token);

        let post_req = SlackApiChatPostMessageRequest::new(
            SlackChannelId(channel_id.to_string()),
            SlackMessageContent::new().with_text(message.to_string()),
        );

        session.chat_post_message(&post_req).await?;
        Ok(())
    }
}

#[async_trait]
impl ChatPlatform for SlackClient {
    async fn list_channels(&self) -> Result<Vec<Channel>, SummarizerError> {
        self.get_channels().await
    }

    async fn load_messages(
        &self,
        channel_id: &str,
        window: &TimeWindow,
    ) -> Result<Option<Vec<ChatMessage>>, SummarizerError> {
        let history = match self.get_history(channel_id, window).await {
            Ok(history) => history,
            Err(e) if e.is_platform_code(ERROR_NOT_IN_CHANNEL) => {
                info!("Not a member of {}, joining", channel_id);
                self.join_channel(channel_id).await?;
                tokio::time::sleep(JOIN_SETTLE_DELAY).await;
                self.get_history(channel_id, window).await?
            }
            Err(e) => return Err(e),
        };

        let fetched = history.len();
        let mut messages = Vec::new();
        // Slack returns newest first
        for msg in filter_user_messages(history).into_iter().rev() {
            if let Some(message) = self.to_chat_message(msg).await {
                messages.push(message);
            }
        }
        debug!("Kept {} of {} messages from {}", messages.len(), fetched, channel_id);

        if messages.is_empty() {
            Ok(None)
        } else {
            Ok(Some(messages))
        }
    }

    /// Publishing is not retried here; the pipeline wraps it in its own policy.
    async fn publish(&self, text: &str, channel_id: &str) -> Result<(), SummarizerError> {
        self.post_message(channel_id, text).await
    }
}
