//! Prompt and reply rendering helpers for the thread relay.

use relay_agent::AgentQueryError;
use relay_core::truncate_chars;

use super::ThreadTranscript;

pub const THREAD_UNAVAILABLE_REPLY: &str = "Sorry, I couldn't retrieve the thread messages.";
pub const EMPTY_THREAD_REPLY: &str =
    "It looks like there's no text in this thread for me to process after removing mentions.";

const SLACK_MESSAGE_MAX_CHARS: usize = 39_000;

const THREAD_PROMPT_PREAMBLE: &str = "Given Slack threads may include prior discussions and context.
Your job is to understand the user's intent from the latest message.
If a tool call is needed, execute it immediately and wait for the result.
Do not ask for confirmation before or after the tool call.
Explain your actions in natural language.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadPrompt {
    /// Every message was empty once the bot mention was removed.
    Empty,
    Ready(String),
}

/// Builds the agent prompt for `transcript`, stripping `<@bot_user_id>`.
pub fn format_thread_prompt(transcript: &ThreadTranscript, bot_user_id: &str) -> ThreadPrompt {
    let lines = transcript.render_lines(bot_user_id);
    if lines.is_empty() {
        return ThreadPrompt::Empty;
    }
    ThreadPrompt::Ready(format!(
        "{THREAD_PROMPT_PREAMBLE}\n\nSlack Thread:\n{}\n",
        lines.join("\n")
    ))
}

/// Converts the agent query outcome into the text posted back to Slack.
pub fn render_agent_reply(result: Result<String, AgentQueryError>) -> String {
    match result {
        Ok(reply) => reply,
        Err(AgentQueryError::NoModelsAvailable) => {
            "Error: No models available from the agent runtime.".to_string()
        }
        Err(AgentQueryError::NoLlmModel) => "Error: No LLM type model found.".to_string(),
        Err(AgentQueryError::ModelDiscovery(source)) => {
            format!("Error initializing client or fetching models: {source}")
        }
        Err(error) => format!("Error during agent interaction: {error}"),
    }
}

pub(super) fn truncate_for_slack(text: &str) -> String {
    truncate_chars(text, SLACK_MESSAGE_MAX_CHARS)
}

#[cfg(test)]
mod tests {
    use relay_agent::{AgentQueryError, AgentRuntimeError};

    use super::{
        format_thread_prompt, render_agent_reply, truncate_for_slack, ThreadPrompt,
        SLACK_MESSAGE_MAX_CHARS,
    };
    use crate::{ThreadTranscript, TranscriptEntry};

    fn prompt_thread_lines(prompt: &str) -> Vec<&str> {
        let (_, thread) = prompt
            .split_once("Slack Thread:\n")
            .expect("prompt has thread section");
        thread.lines().collect()
    }

    #[test]
    fn functional_format_thread_prompt_keeps_order_and_drops_empty_lines() {
        let transcript = ThreadTranscript::new(vec![
            TranscriptEntry::new("alice", "  <@UBOT> what is PROJ-1?  "),
            TranscriptEntry::new("bob", "<@UBOT>"),
            TranscriptEntry::new("carol", "\tit was filed yesterday\n"),
            TranscriptEntry::new("alice", "thanks <@UBOT>"),
        ]);
        let ThreadPrompt::Ready(prompt) = format_thread_prompt(&transcript, "UBOT") else {
            panic!("expected ready prompt");
        };
        assert_eq!(
            prompt_thread_lines(&prompt),
            vec![
                "alice: what is PROJ-1?",
                "carol: it was filed yesterday",
                "alice: thanks",
            ]
        );
        assert!(prompt.starts_with("Given Slack threads may include prior discussions"));
        assert!(!prompt.contains("<@UBOT>"));
    }

    #[test]
    fn regression_format_thread_prompt_is_empty_when_only_mentions_remain() {
        let transcript = ThreadTranscript::new(vec![
            TranscriptEntry::new("alice", "<@UBOT>"),
            TranscriptEntry::new("bob", "  <@UBOT>  "),
        ]);
        assert_eq!(format_thread_prompt(&transcript, "UBOT"), ThreadPrompt::Empty);
    }

    #[test]
    fn unit_render_agent_reply_passes_success_text_through() {
        assert_eq!(
            render_agent_reply(Ok("Ticket PROJ-1 is open.".to_string())),
            "Ticket PROJ-1 is open."
        );
    }

    #[test]
    fn unit_render_agent_reply_maps_discovery_failures() {
        assert_eq!(
            render_agent_reply(Err(AgentQueryError::NoLlmModel)),
            "Error: No LLM type model found."
        );
        assert_eq!(
            render_agent_reply(Err(AgentQueryError::NoModelsAvailable)),
            "Error: No models available from the agent runtime."
        );
        let rendered = render_agent_reply(Err(AgentQueryError::ModelDiscovery(
            AgentRuntimeError::InvalidResponse("connection refused".to_string()),
        )));
        assert!(rendered.starts_with("Error initializing client or fetching models:"));
        assert!(rendered.contains("connection refused"));
    }

    #[test]
    fn unit_render_agent_reply_maps_interaction_failures() {
        let rendered = render_agent_reply(Err(AgentQueryError::Turn(
            AgentRuntimeError::InvalidResponse("turn exploded".to_string()),
        )));
        assert!(rendered.starts_with("Error during agent interaction:"));
        assert!(rendered.contains("turn exploded"));

        let rendered = render_agent_reply(Err(AgentQueryError::ToolRegistration {
            toolgroup_id: "mcp::workday".to_string(),
            source: AgentRuntimeError::InvalidResponse("unreachable".to_string()),
        }));
        assert!(rendered.starts_with("Error during agent interaction:"));
        assert!(rendered.contains("mcp::workday"));
    }

    #[test]
    fn regression_truncate_for_slack_caps_oversized_replies() {
        let oversized = "x".repeat(SLACK_MESSAGE_MAX_CHARS + 10);
        let truncated = truncate_for_slack(&oversized);
        assert_eq!(truncated.chars().count(), SLACK_MESSAGE_MAX_CHARS + 3);
        assert!(truncated.ends_with("..."));
    }
}
