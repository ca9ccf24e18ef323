//! Thread relay that turns a Slack mention into an agent reply.

use std::time::Instant;

use anyhow::Result;
use relay_agent::AgentClient;

mod slack_api_client;
mod slack_render_helpers;
mod thread_transcript;

pub use slack_api_client::{SlackApiClient, SlackPostedMessage, SlackThreadMessage};
pub use slack_render_helpers::{
    format_thread_prompt, render_agent_reply, ThreadPrompt, EMPTY_THREAD_REPLY,
    THREAD_UNAVAILABLE_REPLY,
};
pub use thread_transcript::{ThreadTranscript, TranscriptEntry};

use slack_render_helpers::truncate_for_slack;

#[derive(Clone)]
/// Runtime configuration for the thread relay.
pub struct ThreadRelayConfig {
    pub api_base: String,
    pub bot_token: String,
    pub bot_user_id: Option<String>,
    pub request_timeout_ms: u64,
    pub agent: AgentClient,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A bot mention resolved to the thread it should be answered in.
pub struct SlackMention {
    pub channel_id: String,
    pub thread_ts: String,
    pub user_id: Option<String>,
    pub event_id: Option<String>,
}

impl SlackMention {
    /// Anchors the mention at `thread_ts`, falling back to the message `ts` for
    /// mentions that are not already part of a thread.
    pub fn new(channel_id: impl Into<String>, ts: &str, thread_ts: Option<&str>) -> Self {
        let anchor = thread_ts
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(ts.trim());
        Self {
            channel_id: channel_id.into(),
            thread_ts: anchor.to_string(),
            user_id: None,
            event_id: None,
        }
    }

    pub fn with_user_id(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_event_id(mut self, event_id: Option<String>) -> Self {
        self.event_id = event_id;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionStatus {
    ThreadUnavailable,
    EmptyThread,
    AgentReplied,
    AgentFailed,
}

impl MentionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ThreadUnavailable => "thread_unavailable",
            Self::EmptyThread => "empty_thread",
            Self::AgentReplied => "agent_replied",
            Self::AgentFailed => "agent_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionOutcome {
    pub status: MentionStatus,
    pub reply: String,
    pub posted: Option<SlackPostedMessage>,
}

#[derive(Clone)]
pub struct ThreadRelay {
    slack_client: SlackApiClient,
    agent: AgentClient,
    bot_user_id: String,
}

impl ThreadRelay {
    /// Builds the relay, resolving the bot user id through `auth.test` when it
    /// is not configured.
    pub async fn new(config: ThreadRelayConfig) -> Result<Self> {
        let slack_client = SlackApiClient::new(
            config.api_base.clone(),
            config.bot_token.clone(),
            config.request_timeout_ms,
        )?;

        let bot_user_id = match config.bot_user_id.clone() {
            Some(user_id) if !user_id.trim().is_empty() => user_id.trim().to_string(),
            _ => slack_client.resolve_bot_user_id().await?,
        };

        Ok(Self {
            slack_client,
            agent: config.agent,
            bot_user_id,
        })
    }

    pub fn bot_user_id(&self) -> &str {
        &self.bot_user_id
    }

    /// Fetches the thread; API failures are logged and yield an empty transcript.
    pub async fn fetch_thread(&self, channel_id: &str, thread_ts: &str) -> ThreadTranscript {
        match self
            .slack_client
            .fetch_thread_replies(channel_id, thread_ts)
            .await
        {
            Ok(messages) => ThreadTranscript::from_messages(messages),
            Err(error) => {
                tracing::warn!(
                    channel = channel_id,
                    thread_ts,
                    "error reading slack thread: {error:#}"
                );
                ThreadTranscript::default()
            }
        }
    }

    /// Posts `text` into the thread; send failures are logged and skipped.
    pub async fn respond(
        &self,
        channel_id: &str,
        thread_ts: &str,
        text: &str,
    ) -> Option<SlackPostedMessage> {
        let text = truncate_for_slack(text);
        match self
            .slack_client
            .post_message(channel_id, &text, Some(thread_ts))
            .await
        {
            Ok(posted) => Some(posted),
            Err(error) => {
                tracing::warn!(
                    channel = channel_id,
                    thread_ts,
                    "failed to post slack reply: {error:#}"
                );
                None
            }
        }
    }

    pub async fn handle_mention(&self, mention: &SlackMention) -> MentionOutcome {
        let started = Instant::now();
        let transcript = self
            .fetch_thread(&mention.channel_id, &mention.thread_ts)
            .await;

        let (status, reply) = if transcript.is_empty() {
            (
                MentionStatus::ThreadUnavailable,
                THREAD_UNAVAILABLE_REPLY.to_string(),
            )
        } else {
            match format_thread_prompt(&transcript, &self.bot_user_id) {
                ThreadPrompt::Empty => (MentionStatus::EmptyThread, EMPTY_THREAD_REPLY.to_string()),
                ThreadPrompt::Ready(prompt) => {
                    let result = self.agent.query(&prompt).await;
                    if let Err(error) = &result {
                        tracing::warn!(
                            channel = %mention.channel_id,
                            thread_ts = %mention.thread_ts,
                            before_agent_created = error.is_discovery_failure(),
                            "agent query failed: {error}"
                        );
                    }
                    let status = if result.is_ok() {
                        MentionStatus::AgentReplied
                    } else {
                        MentionStatus::AgentFailed
                    };
                    (status, render_agent_reply(result))
                }
            }
        };

        let posted = self
            .respond(&mention.channel_id, &mention.thread_ts, &reply)
            .await;
        tracing::info!(
            channel = %mention.channel_id,
            thread_ts = %mention.thread_ts,
            event_id = mention.event_id.as_deref().unwrap_or("-"),
            user = mention.user_id.as_deref().unwrap_or("-"),
            messages = transcript.len(),
            status = status.as_str(),
            posted = posted.is_some(),
            duration_ms = started.elapsed().as_millis() as u64,
            "slack mention relayed"
        );

        MentionOutcome {
            status,
            reply,
            posted,
        }
    }
}
