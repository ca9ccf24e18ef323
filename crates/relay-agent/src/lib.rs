//! Agent runtime client used by the Slack relay.
//!
//! Wraps a Llama Stack compatible agent service behind the [`AgentRuntime`]
//! trait and layers the per-request query flow (model discovery, tool group
//! registration, agent and session creation, turn execution) on top of it.
mod agent_client;
mod llama_stack;
mod types;

pub use agent_client::{
    default_tool_endpoints, AgentClient, AgentClientSettings, AgentQueryError,
    DEFAULT_AGENT_INSTRUCTIONS, DEFAULT_SESSION_NAME, EMPTY_TURN_PLACEHOLDER,
};
pub use llama_stack::{LlamaStackClient, LlamaStackConfig, MCP_TOOL_PROVIDER_ID};
pub use types::{
    AgentConfiguration, AgentHandle, AgentRuntime, AgentRuntimeError, AgentSession, ModelInfo,
    ToolChoice, ToolConfig, ToolEndpoint, ToolEndpointParseError, TurnOutput, LLM_MODEL_TYPE,
};
