//! Slack Web API client helpers used by thread fetch and reply flows.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use relay_core::truncate_for_error;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

const SLACK_THREAD_PAGE_LIMIT: &str = "1000";

#[derive(Debug, Clone, Deserialize)]
struct SlackAuthTestResponse {
    ok: bool,
    user_id: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackChatMessageResponse {
    ok: bool,
    ts: Option<String>,
    channel: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackConversationRepliesResponse {
    ok: bool,
    #[serde(default)]
    messages: Vec<SlackThreadMessage>,
    #[serde(default)]
    has_more: bool,
    error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
/// Raw message entry returned by `conversations.replies`.
pub struct SlackThreadMessage {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackPostedMessage {
    pub channel: String,
    pub ts: String,
}

#[derive(Clone)]
pub struct SlackApiClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
}

impl SlackApiClient {
    pub fn new(api_base: String, bot_token: String, request_timeout_ms: u64) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("relay-slack-runtime"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()
            .context("failed to create slack api client")?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.trim().to_string(),
        })
    }

    pub async fn resolve_bot_user_id(&self) -> Result<String> {
        let response: SlackAuthTestResponse = self
            .request_json(
                "auth.test",
                self.http
                    .post(format!("{}/auth.test", self.api_base))
                    .bearer_auth(&self.bot_token),
            )
            .await?;

        if !response.ok {
            bail!(
                "slack auth.test failed: {}",
                response
                    .error
                    .unwrap_or_else(|| "unknown error".to_string())
            );
        }

        response
            .user_id
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| anyhow!("slack auth.test did not return user_id"))
    }

    pub async fn fetch_thread_replies(
        &self,
        channel: &str,
        thread_ts: &str,
    ) -> Result<Vec<SlackThreadMessage>> {
        let response: SlackConversationRepliesResponse = self
            .request_json(
                "conversations.replies",
                self.http
                    .get(format!("{}/conversations.replies", self.api_base))
                    .bearer_auth(&self.bot_token)
                    .query(&[
                        ("channel", channel),
                        ("ts", thread_ts),
                        ("limit", SLACK_THREAD_PAGE_LIMIT),
                    ]),
            )
            .await?;

        if !response.ok {
            bail!(
                "slack conversations.replies failed: {}",
                response
                    .error
                    .unwrap_or_else(|| "unknown error".to_string())
            );
        }
        if response.has_more {
            tracing::warn!(
                channel,
                thread_ts,
                fetched = response.messages.len(),
                "slack thread has more replies than a single page; relaying the first page"
            );
        }
        Ok(response.messages)
    }

    pub async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<SlackPostedMessage> {
        let mut payload = json!({
            "channel": channel,
            "text": text,
        });
        if let Some(thread_ts) = thread_ts {
            payload["thread_ts"] = Value::String(thread_ts.to_string());
        }

        let response: SlackChatMessageResponse = self
            .request_json(
                "chat.postMessage",
                self.http
                    .post(format!("{}/chat.postMessage", self.api_base))
                    .bearer_auth(&self.bot_token)
                    .json(&payload),
            )
            .await?;

        if !response.ok {
            bail!(
                "slack chat.postMessage failed: {}",
                response
                    .error
                    .unwrap_or_else(|| "unknown error".to_string())
            );
        }

        Ok(SlackPostedMessage {
            channel: response.channel.unwrap_or_else(|| channel.to_string()),
            ts: response
                .ts
                .ok_or_else(|| anyhow!("slack chat.postMessage response missing ts"))?,
        })
    }

    async fn request_json<T>(&self, operation: &str, request: reqwest::RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = request
            .send()
            .await
            .with_context(|| format!("slack api {operation} request failed"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!(
                "slack api {operation} failed with status {}: {}",
                status.as_u16(),
                truncate_for_error(&body, 800)
            );
        }
        response
            .json::<T>()
            .await
            .with_context(|| format!("failed to decode slack {operation}"))
    }
}
