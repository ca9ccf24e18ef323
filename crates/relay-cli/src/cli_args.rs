use clap::Parser;
use relay_agent::{default_tool_endpoints, ToolEndpoint};

use crate::{CliSlackAckMode, CliToolChoice};

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_non_empty_secret(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("value cannot be empty".to_string());
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Parser)]
#[command(
    name = "relay-bot",
    about = "Slack bot that relays mentioned threads to a Llama Stack agent",
    version
)]
pub struct Cli {
    #[arg(
        long = "slack-bot-token",
        env = "SLACK_BOT_TOKEN",
        hide_env_values = true,
        value_parser = parse_non_empty_secret,
        help = "Slack bot token (xoxb-...) used for Web API calls"
    )]
    pub slack_bot_token: String,

    #[arg(
        long = "slack-signing-secret",
        env = "SLACK_SIGNING_SECRET",
        hide_env_values = true,
        value_parser = parse_non_empty_secret,
        help = "Slack app signing secret used to verify inbound event requests"
    )]
    pub slack_signing_secret: String,

    #[arg(
        long = "slack-bot-user-id",
        env = "SLACK_BOT_USER_ID",
        help = "Bot user id stripped from relayed messages. Resolved via auth.test when omitted."
    )]
    pub slack_bot_user_id: Option<String>,

    #[arg(
        long = "slack-api-base",
        env = "SLACK_API_BASE",
        default_value = "https://slack.com/api",
        help = "Slack Web API base URL"
    )]
    pub slack_api_base: String,

    #[arg(
        long = "slack-request-timeout-ms",
        env = "SLACK_REQUEST_TIMEOUT_MS",
        default_value_t = 10_000,
        value_parser = parse_positive_u64,
        help = "Timeout for Slack Web API requests in milliseconds"
    )]
    pub slack_request_timeout_ms: u64,

    #[arg(
        long = "slack-signature-max-age-seconds",
        env = "SLACK_SIGNATURE_MAX_AGE_SECONDS",
        default_value_t = 300,
        value_parser = parse_positive_u64,
        help = "Maximum allowed clock skew for signed Slack event requests"
    )]
    pub slack_signature_max_age_seconds: u64,

    #[arg(
        long = "slack-ack-mode",
        env = "SLACK_ACK_MODE",
        value_enum,
        default_value = "inline",
        help = "Acknowledge events after the reply is posted (inline) or immediately (background)"
    )]
    pub slack_ack_mode: CliSlackAckMode,

    #[arg(
        long = "bind-host",
        env = "BIND_HOST",
        default_value = "127.0.0.1",
        help = "Host address for the Slack events server"
    )]
    pub bind_host: String,

    #[arg(
        long = "port",
        env = "PORT",
        default_value_t = 8080,
        help = "Port for the Slack events server"
    )]
    pub port: u16,

    #[arg(
        long = "agent-base-url",
        env = "LLAMA_STACK_BASE_URL",
        default_value = "http://localhost:8321",
        help = "Base URL of the Llama Stack agent runtime"
    )]
    pub agent_base_url: String,

    #[arg(
        long = "agent-request-timeout-ms",
        env = "AGENT_REQUEST_TIMEOUT_MS",
        default_value_t = 120_000,
        value_parser = parse_positive_u64,
        help = "Timeout for agent runtime requests in milliseconds"
    )]
    pub agent_request_timeout_ms: u64,

    #[arg(
        long = "agent-tool-choice",
        env = "AGENT_TOOL_CHOICE",
        value_enum,
        default_value = "auto",
        help = "Tool selection policy submitted with each agent configuration"
    )]
    pub agent_tool_choice: CliToolChoice,

    #[arg(
        long = "agent-tool-endpoint",
        env = "AGENT_TOOL_ENDPOINTS",
        value_delimiter = ',',
        default_values_t = default_tool_endpoints(),
        help = "MCP tool group(s) registered before each agent run in toolgroup_id=uri format"
    )]
    pub agent_tool_endpoints: Vec<ToolEndpoint>,
}

impl Cli {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host.trim(), self.port)
    }
}
