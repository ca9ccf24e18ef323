//! Slack Events API webhook server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use relay_core::current_unix_timestamp;
use relay_slack_runtime::{SlackMention, ThreadRelay};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinSet;

mod envelope;
mod signature;

pub use envelope::{parse_slack_envelope, SlackEnvelopeAction, SlackEnvelopeError};
pub use signature::{
    compute_slack_signature, SignatureError, SlackSignatureVerifier, SLACK_SIGNATURE_HEADER,
    SLACK_TIMESTAMP_HEADER,
};

const SLACK_EVENTS_ENDPOINT: &str = "/slack/events";
const HEALTHZ_ENDPOINT: &str = "/healthz";
const SLACK_RETRY_NUM_HEADER: &str = "x-slack-retry-num";
const SLACK_RETRY_REASON_HEADER: &str = "x-slack-retry-reason";
const BACKGROUND_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
/// Receives mentions accepted by the events server.
pub trait SlackMentionHandler: Send + Sync {
    async fn handle_mention(&self, mention: SlackMention);
}

#[async_trait]
impl SlackMentionHandler for ThreadRelay {
    async fn handle_mention(&self, mention: SlackMention) {
        ThreadRelay::handle_mention(self, &mention).await;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// When the `200` acknowledgement is sent relative to mention handling.
pub enum SlackAckMode {
    /// Handle the mention to completion, then acknowledge.
    #[default]
    Inline,
    /// Acknowledge immediately and handle the mention on a spawned task.
    Background,
}

impl SlackAckMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Background => "background",
        }
    }
}

#[derive(Clone)]
pub struct SlackEventsServerConfig {
    pub bind: String,
    pub signing_secret: String,
    pub signature_max_age_seconds: u64,
    pub ack_mode: SlackAckMode,
    pub handler: Arc<dyn SlackMentionHandler>,
}

struct SlackEventsServerState {
    verifier: SlackSignatureVerifier,
    ack_mode: SlackAckMode,
    handler: Arc<dyn SlackMentionHandler>,
    background: Mutex<JoinSet<()>>,
}

impl SlackEventsServerState {
    fn new(config: SlackEventsServerConfig) -> Self {
        Self {
            verifier: SlackSignatureVerifier::new(
                config.signing_secret,
                config.signature_max_age_seconds,
            ),
            ack_mode: config.ack_mode,
            handler: config.handler,
            background: Mutex::new(JoinSet::new()),
        }
    }
}

pub async fn run_slack_events_server(config: SlackEventsServerConfig) -> Result<()> {
    let listener = TcpListener::bind(config.bind.as_str())
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve slack events server bound address")?;
    tracing::info!(
        addr = %local_addr,
        ack_mode = config.ack_mode.as_str(),
        "slack events server listening"
    );

    let state = Arc::new(SlackEventsServerState::new(config));
    let app = build_router_with_state(state.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("slack events server exited unexpectedly")?;
    let dropped = drain_background_relays(&state, BACKGROUND_DRAIN_TIMEOUT).await;
    tracing::info!(dropped_relays = dropped, "slack events server stopped");
    Ok(())
}

pub fn build_slack_events_router(config: SlackEventsServerConfig) -> Router {
    build_router_with_state(Arc::new(SlackEventsServerState::new(config)))
}

fn build_router_with_state(state: Arc<SlackEventsServerState>) -> Router {
    Router::new()
        .route(SLACK_EVENTS_ENDPOINT, post(handle_slack_event))
        .route(HEALTHZ_ENDPOINT, get(handle_health))
        .with_state(state)
}

async fn handle_health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status":"ok"})))
}

async fn handle_slack_event(
    State(state): State<Arc<SlackEventsServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let timestamp = header_value(&headers, SLACK_TIMESTAMP_HEADER);
    let signature = header_value(&headers, SLACK_SIGNATURE_HEADER);
    if let Err(error) = state
        .verifier
        .verify(timestamp, signature, &body, current_unix_timestamp())
    {
        tracing::warn!("rejected slack event: {error}");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":{"code":"invalid_signature","message":error.to_string()}})),
        )
            .into_response();
    }

    if let Some(retry_num) = header_value(&headers, SLACK_RETRY_NUM_HEADER) {
        tracing::info!(
            retry_num,
            retry_reason = header_value(&headers, SLACK_RETRY_REASON_HEADER).unwrap_or("-"),
            "ignored slack event redelivery"
        );
        return (StatusCode::OK, Json(json!({"status":"ignored"}))).into_response();
    }

    let action = match parse_slack_envelope(&body) {
        Ok(action) => action,
        Err(error) => {
            tracing::warn!(code = error.code(), "malformed slack event: {error}");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error":{"code":error.code(),"message":error.to_string()}})),
            )
                .into_response();
        }
    };

    match action {
        SlackEnvelopeAction::UrlVerification { challenge } => {
            (StatusCode::OK, Json(json!({"challenge": challenge}))).into_response()
        }
        SlackEnvelopeAction::Mention(mention) => {
            dispatch_mention(&state, mention).await;
            (
                StatusCode::OK,
                Json(json!({"status":"accepted","ack_mode":state.ack_mode.as_str()})),
            )
                .into_response()
        }
        SlackEnvelopeAction::Ignored { reason } => {
            tracing::debug!("ignored slack event: {reason}");
            (StatusCode::OK, Json(json!({"status":"ignored"}))).into_response()
        }
    }
}

async fn dispatch_mention(state: &SlackEventsServerState, mention: SlackMention) {
    tracing::debug!(
        channel = %mention.channel_id,
        thread_ts = %mention.thread_ts,
        ack_mode = state.ack_mode.as_str(),
        "dispatching slack mention"
    );
    match state.ack_mode {
        SlackAckMode::Inline => state.handler.handle_mention(mention).await,
        SlackAckMode::Background => {
            let handler = Arc::clone(&state.handler);
            let mut background = match state.background.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            while background.try_join_next().is_some() {}
            background.spawn(async move {
                handler.handle_mention(mention).await;
            });
        }
    }
}

/// Waits up to `timeout` for background relays still in flight and returns
/// how many were aborted.
async fn drain_background_relays(state: &SlackEventsServerState, timeout: Duration) -> usize {
    let mut in_flight = match state.background.lock() {
        Ok(mut guard) => std::mem::take(&mut *guard),
        Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
    };
    if in_flight.is_empty() {
        return 0;
    }
    tracing::info!(
        in_flight = in_flight.len(),
        "waiting for background slack relays to finish"
    );
    let drained = tokio::time::timeout(timeout, async {
        while in_flight.join_next().await.is_some() {}
    })
    .await;
    if drained.is_ok() {
        return 0;
    }
    let dropped = in_flight.len();
    tracing::warn!(
        dropped,
        "aborting background slack relays still running at shutdown"
    );
    in_flight.shutdown().await;
    dropped
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
