//! Slack Events API envelope parsing.

use relay_slack_runtime::SlackMention;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

const URL_VERIFICATION: &str = "url_verification";
const EVENT_CALLBACK: &str = "event_callback";
const APP_MENTION: &str = "app_mention";

#[derive(Debug, Deserialize)]
struct SlackEventEnvelope {
    #[serde(rename = "type", default)]
    envelope_type: String,
    #[serde(default)]
    challenge: Option<String>,
    #[serde(default)]
    event_id: Option<String>,
    #[serde(default)]
    event: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct SlackAppMentionEvent {
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    ts: Option<String>,
    #[serde(default)]
    thread_ts: Option<String>,
    #[serde(default)]
    user: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlackEnvelopeAction {
    UrlVerification { challenge: String },
    Mention(SlackMention),
    Ignored { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlackEnvelopeError {
    #[error("failed to parse slack event payload: {0}")]
    Parse(String),
    #[error("invalid slack event: {0}")]
    InvalidEvent(String),
}

impl SlackEnvelopeError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parse_failed",
            Self::InvalidEvent(_) => "invalid_event",
        }
    }
}

/// Classifies a raw Events API request body.
pub fn parse_slack_envelope(body: &[u8]) -> Result<SlackEnvelopeAction, SlackEnvelopeError> {
    let envelope: SlackEventEnvelope =
        serde_json::from_slice(body).map_err(|error| SlackEnvelopeError::Parse(error.to_string()))?;

    match envelope.envelope_type.as_str() {
        URL_VERIFICATION => {
            let challenge = envelope.challenge.ok_or_else(|| {
                SlackEnvelopeError::InvalidEvent("url_verification is missing challenge".to_string())
            })?;
            Ok(SlackEnvelopeAction::UrlVerification { challenge })
        }
        EVENT_CALLBACK => {
            let Some(event) = envelope.event else {
                return Err(SlackEnvelopeError::InvalidEvent(
                    "event_callback is missing event".to_string(),
                ));
            };
            let event_type = event
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if event_type != APP_MENTION {
                return Ok(SlackEnvelopeAction::Ignored {
                    reason: format!("unsupported event type '{event_type}'"),
                });
            }
            parse_app_mention(event, envelope.event_id).map(SlackEnvelopeAction::Mention)
        }
        other => Ok(SlackEnvelopeAction::Ignored {
            reason: format!("unsupported envelope type '{other}'"),
        }),
    }
}

fn parse_app_mention(
    event: Value,
    event_id: Option<String>,
) -> Result<SlackMention, SlackEnvelopeError> {
    let event: SlackAppMentionEvent = serde_json::from_value(event)
        .map_err(|error| SlackEnvelopeError::InvalidEvent(error.to_string()))?;
    let channel = non_empty(event.channel).ok_or_else(|| {
        SlackEnvelopeError::InvalidEvent("app_mention is missing channel".to_string())
    })?;
    let ts = non_empty(event.ts)
        .ok_or_else(|| SlackEnvelopeError::InvalidEvent("app_mention is missing ts".to_string()))?;

    Ok(SlackMention::new(channel, &ts, event.thread_ts.as_deref())
        .with_user_id(non_empty(event.user))
        .with_event_id(non_empty(event_id)))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use relay_slack_runtime::SlackMention;
    use serde_json::json;

    use super::{parse_slack_envelope, SlackEnvelopeAction, SlackEnvelopeError};

    fn parse(value: serde_json::Value) -> Result<SlackEnvelopeAction, SlackEnvelopeError> {
        parse_slack_envelope(value.to_string().as_bytes())
    }

    #[test]
    fn unit_parse_url_verification_returns_challenge() {
        assert_eq!(
            parse(json!({"type": "url_verification", "challenge": "abc123"})),
            Ok(SlackEnvelopeAction::UrlVerification {
                challenge: "abc123".to_string()
            })
        );
    }

    #[test]
    fn functional_parse_app_mention_uses_thread_ts_when_present() {
        let action = parse(json!({
            "type": "event_callback",
            "event_id": "Ev1",
            "event": {
                "type": "app_mention",
                "channel": "C1",
                "user": "U1",
                "text": "<@UBOT> hi",
                "ts": "12.5",
                "thread_ts": "10.0"
            }
        }))
        .expect("mention");
        assert_eq!(
            action,
            SlackEnvelopeAction::Mention(
                SlackMention::new("C1", "12.5", Some("10.0"))
                    .with_user_id(Some("U1".to_string()))
                    .with_event_id(Some("Ev1".to_string()))
            )
        );
    }

    #[test]
    fn functional_parse_app_mention_falls_back_to_message_ts() {
        let SlackEnvelopeAction::Mention(mention) = parse(json!({
            "type": "event_callback",
            "event": {"type": "app_mention", "channel": "C1", "ts": "12.5"}
        }))
        .expect("mention") else {
            panic!("expected mention");
        };
        assert_eq!(mention.thread_ts, "12.5");
        assert_eq!(mention.user_id, None);
    }

    #[test]
    fn regression_parse_ignores_other_event_and_envelope_types() {
        assert!(matches!(
            parse(json!({
                "type": "event_callback",
                "event": {"type": "message", "channel": "C1", "ts": "1.0"}
            })),
            Ok(SlackEnvelopeAction::Ignored { .. })
        ));
        assert!(matches!(
            parse(json!({"type": "app_rate_limited"})),
            Ok(SlackEnvelopeAction::Ignored { .. })
        ));
    }

    #[test]
    fn regression_parse_rejects_malformed_payloads() {
        let error = parse_slack_envelope(b"{not json").expect_err("parse error");
        assert_eq!(error.code(), "parse_failed");

        let error = parse(json!({
            "type": "event_callback",
            "event": {"type": "app_mention", "ts": "1.0"}
        }))
        .expect_err("missing channel");
        assert_eq!(error.code(), "invalid_event");
        assert!(error.to_string().contains("channel"));

        let error = parse(json!({"type": "url_verification"})).expect_err("missing challenge");
        assert_eq!(error.code(), "invalid_event");
    }
}
