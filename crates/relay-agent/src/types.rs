use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Model type reported by the runtime for chat-capable models.
pub const LLM_MODEL_TYPE: &str = "llm";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Model entry returned by the runtime model listing.
pub struct ModelInfo {
    pub identifier: String,
    #[serde(default)]
    pub model_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
}

impl ModelInfo {
    pub fn is_llm(&self) -> bool {
        self.model_type.trim().eq_ignore_ascii_case(LLM_MODEL_TYPE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Named tool service registered with the runtime as an MCP tool group.
pub struct ToolEndpoint {
    pub toolgroup_id: String,
    pub uri: String,
}

impl ToolEndpoint {
    pub fn new(toolgroup_id: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            toolgroup_id: toolgroup_id.into(),
            uri: uri.into(),
        }
    }
}

impl fmt::Display for ToolEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.toolgroup_id, self.uri)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolEndpointParseError {
    #[error("tool endpoint '{0}' must use <toolgroup_id>=<uri> format")]
    MissingSeparator(String),
    #[error("tool endpoint '{0}' has an empty toolgroup id")]
    EmptyToolgroupId(String),
    #[error("tool endpoint '{0}' has an empty uri")]
    EmptyUri(String),
}

impl FromStr for ToolEndpoint {
    type Err = ToolEndpointParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let (toolgroup_id, uri) = trimmed
            .split_once('=')
            .ok_or_else(|| ToolEndpointParseError::MissingSeparator(trimmed.to_string()))?;
        let toolgroup_id = toolgroup_id.trim();
        let uri = uri.trim();
        if toolgroup_id.is_empty() {
            return Err(ToolEndpointParseError::EmptyToolgroupId(trimmed.to_string()));
        }
        if uri.is_empty() {
            return Err(ToolEndpointParseError::EmptyUri(trimmed.to_string()));
        }
        Ok(Self::new(toolgroup_id, uri))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Tool selection policy forwarded in the agent tool configuration.
pub enum ToolChoice {
    #[default]
    Auto,
    Required,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    pub tool_choice: ToolChoice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Agent definition submitted to the runtime for one relayed request.
pub struct AgentConfiguration {
    pub model: String,
    pub instructions: String,
    pub enable_session_persistence: bool,
    pub tool_config: ToolConfig,
    pub toolgroups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentHandle {
    pub agent_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSession {
    pub session_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Text extracted from a completed turn; `content` is `None` when the runtime
/// produced no textual output.
pub struct TurnOutput {
    pub turn_id: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Error)]
/// Errors surfaced by agent runtime transports.
pub enum AgentRuntimeError {
    #[error("missing agent runtime base url")]
    MissingBaseUrl,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("agent runtime {operation} returned non-success status {status}: {body}")]
    HttpStatus {
        operation: &'static str,
        status: u16,
        body: String,
    },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
/// Remote operations the relay needs from an agent runtime.
pub trait AgentRuntime: Send + Sync {
    async fn list_models(&self) -> Result<Vec<ModelInfo>, AgentRuntimeError>;

    async fn register_tool_group(&self, endpoint: &ToolEndpoint) -> Result<(), AgentRuntimeError>;

    async fn create_agent(
        &self,
        config: &AgentConfiguration,
    ) -> Result<AgentHandle, AgentRuntimeError>;

    async fn create_session(
        &self,
        agent: &AgentHandle,
        session_name: &str,
    ) -> Result<AgentSession, AgentRuntimeError>;

    async fn create_turn(
        &self,
        agent: &AgentHandle,
        session: &AgentSession,
        prompt: &str,
    ) -> Result<TurnOutput, AgentRuntimeError>;
}
