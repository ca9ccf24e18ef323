//! Ordered view of a Slack thread used to build agent prompts.

use super::SlackThreadMessage;

const UNKNOWN_AUTHOR: &str = "Unknown User";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub author: String,
    pub text: String,
}

impl TranscriptEntry {
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
        }
    }

    /// Returns the `author: text` line with the bot mention removed, or `None`
    /// when nothing remains after stripping.
    pub fn render_line(&self, bot_mention: &str) -> Option<String> {
        let cleaned = if bot_mention.is_empty() {
            self.text.trim().to_string()
        } else {
            self.text.replace(bot_mention, "").trim().to_string()
        };
        if cleaned.is_empty() {
            return None;
        }
        Some(format!("{}: {}", self.author, cleaned))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Thread messages in the order Slack reported them.
pub struct ThreadTranscript {
    entries: Vec<TranscriptEntry>,
}

impl ThreadTranscript {
    pub fn new(entries: Vec<TranscriptEntry>) -> Self {
        Self { entries }
    }

    pub fn from_messages(messages: Vec<SlackThreadMessage>) -> Self {
        let entries = messages
            .into_iter()
            .map(|message| {
                let author = message
                    .user
                    .filter(|user| !user.trim().is_empty())
                    .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
                TranscriptEntry::new(author, message.text.unwrap_or_default())
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders non-empty, mention-stripped lines for `bot_user_id`.
    pub fn render_lines(&self, bot_user_id: &str) -> Vec<String> {
        let mention = bot_mention_token(bot_user_id);
        self.entries
            .iter()
            .filter_map(|entry| entry.render_line(&mention))
            .collect()
    }
}

pub(super) fn bot_mention_token(bot_user_id: &str) -> String {
    let bot_user_id = bot_user_id.trim();
    if bot_user_id.is_empty() {
        return String::new();
    }
    format!("<@{bot_user_id}>")
}
