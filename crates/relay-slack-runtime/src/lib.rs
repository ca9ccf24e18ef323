//! Slack thread relay runtime.
//!
//! Fetches the messages of a mentioned Slack thread, renders them into an
//! agent prompt, forwards the prompt to the agent runtime, and posts the reply
//! back into the same thread.

mod slack_runtime;

pub use slack_runtime::{
    format_thread_prompt, render_agent_reply, MentionOutcome, MentionStatus, SlackApiClient,
    SlackMention, SlackPostedMessage, SlackThreadMessage, ThreadPrompt, ThreadRelay,
    ThreadRelayConfig, ThreadTranscript, TranscriptEntry, EMPTY_THREAD_REPLY,
    THREAD_UNAVAILABLE_REPLY,
};
