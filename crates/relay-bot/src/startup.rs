//! Wires CLI configuration into the relay, agent client and events server.

use std::sync::Arc;

use anyhow::{Context, Result};
use relay_agent::{AgentClient, AgentClientSettings, LlamaStackClient, LlamaStackConfig};
use relay_cli::Cli;
use relay_gateway::{run_slack_events_server, SlackEventsServerConfig};
use relay_slack_runtime::{ThreadRelay, ThreadRelayConfig};

pub(crate) async fn run_cli(cli: Cli) -> Result<()> {
    let config = build_events_server_config(&cli).await?;
    run_slack_events_server(config).await
}

pub(crate) fn build_agent_client(cli: &Cli) -> Result<AgentClient> {
    let runtime = LlamaStackClient::new(LlamaStackConfig {
        base_url: cli.agent_base_url.clone(),
        request_timeout_ms: cli.agent_request_timeout_ms,
    })
    .context("failed to create agent runtime client")?;
    tracing::info!(
        agent_base_url = runtime.base_url(),
        "agent runtime client configured"
    );
    Ok(AgentClient::new(
        Arc::new(runtime),
        AgentClientSettings {
            tool_choice: cli.agent_tool_choice.into(),
            tool_endpoints: cli.agent_tool_endpoints.clone(),
            ..AgentClientSettings::default()
        },
    ))
}

pub(crate) async fn build_events_server_config(cli: &Cli) -> Result<SlackEventsServerConfig> {
    let agent = build_agent_client(cli)?;
    let relay = ThreadRelay::new(ThreadRelayConfig {
        api_base: cli.slack_api_base.clone(),
        bot_token: cli.slack_bot_token.clone(),
        bot_user_id: cli.slack_bot_user_id.clone(),
        request_timeout_ms: cli.slack_request_timeout_ms,
        agent,
    })
    .await
    .context("failed to initialize slack thread relay")?;

    tracing::info!(
        bot_user_id = relay.bot_user_id(),
        tool_endpoints = cli.agent_tool_endpoints.len(),
        "slack relay initialized"
    );

    Ok(SlackEventsServerConfig {
        bind: cli.bind_addr(),
        signing_secret: cli.slack_signing_secret.clone(),
        signature_max_age_seconds: cli.slack_signature_max_age_seconds,
        ack_mode: cli.slack_ack_mode.into(),
        handler: Arc::new(relay),
    })
}
