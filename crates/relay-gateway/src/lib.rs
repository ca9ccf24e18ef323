//! Inbound Slack Events API gateway.
//!
//! Verifies Slack request signatures, answers URL verification challenges and
//! dispatches `app_mention` events to a [`SlackMentionHandler`].

mod slack_events_server;

pub use slack_events_server::{
    build_slack_events_router, compute_slack_signature, parse_slack_envelope,
    run_slack_events_server, SignatureError, SlackAckMode, SlackEnvelopeAction,
    SlackEnvelopeError, SlackEventsServerConfig, SlackMentionHandler, SlackSignatureVerifier,
    SLACK_SIGNATURE_HEADER, SLACK_TIMESTAMP_HEADER,
};
