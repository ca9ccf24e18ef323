//! Per-request agent query flow built on top of an [`AgentRuntime`].

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::{
    AgentConfiguration, AgentHandle, AgentRuntime, AgentRuntimeError, AgentSession, ToolChoice,
    ToolConfig, ToolEndpoint,
};

pub const DEFAULT_AGENT_INSTRUCTIONS: &str = "You are an intelligent assistant working with Slack threads that may include prior discussions and context.";
pub const DEFAULT_SESSION_NAME: &str = "slack-bot-session";
pub const EMPTY_TURN_PLACEHOLDER: &str = "[Agent did not provide a content response for this turn]";

/// Returns the MCP tool services registered when no override is configured.
pub fn default_tool_endpoints() -> Vec<ToolEndpoint> {
    vec![
        ToolEndpoint::new("mcp::jira_helper", "http://localhost:8000/sse"),
        ToolEndpoint::new("mcp::linkedin", "http://localhost:3004/sse"),
        ToolEndpoint::new("mcp::workday", "http://localhost:3005/sse"),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Static agent settings applied to every relayed request.
pub struct AgentClientSettings {
    pub instructions: String,
    pub tool_choice: ToolChoice,
    pub tool_endpoints: Vec<ToolEndpoint>,
    pub session_name: String,
}

impl Default for AgentClientSettings {
    fn default() -> Self {
        Self {
            instructions: DEFAULT_AGENT_INSTRUCTIONS.to_string(),
            tool_choice: ToolChoice::Auto,
            tool_endpoints: default_tool_endpoints(),
            session_name: DEFAULT_SESSION_NAME.to_string(),
        }
    }
}

#[derive(Debug, Error)]
/// Failure of one step of the agent query flow.
pub enum AgentQueryError {
    #[error("No models available from the agent runtime")]
    NoModelsAvailable,
    #[error("No LLM type model found")]
    NoLlmModel,
    #[error("failed to list models: {0}")]
    ModelDiscovery(#[source] AgentRuntimeError),
    #[error("failed to register tool group {toolgroup_id}: {source}")]
    ToolRegistration {
        toolgroup_id: String,
        #[source]
        source: AgentRuntimeError,
    },
    #[error("failed to create agent: {0}")]
    AgentCreation(#[source] AgentRuntimeError),
    #[error("failed to create session: {0}")]
    SessionCreation(#[source] AgentRuntimeError),
    #[error("turn execution failed: {0}")]
    Turn(#[source] AgentRuntimeError),
}

impl AgentQueryError {
    /// True when the failure happened before any agent was created.
    pub fn is_discovery_failure(&self) -> bool {
        matches!(
            self,
            Self::NoModelsAvailable | Self::NoLlmModel | Self::ModelDiscovery(_)
        )
    }
}

#[derive(Clone)]
/// Runs model discovery, tool registration, agent and session creation, then the turn.
pub struct AgentClient {
    runtime: Arc<dyn AgentRuntime>,
    settings: AgentClientSettings,
}

impl AgentClient {
    pub fn new(runtime: Arc<dyn AgentRuntime>, settings: AgentClientSettings) -> Self {
        Self { runtime, settings }
    }

    pub fn settings(&self) -> &AgentClientSettings {
        &self.settings
    }

    /// Returns the identifier of the first model the runtime reports as an LLM.
    pub async fn discover_model(&self) -> Result<String, AgentQueryError> {
        let models = self
            .runtime
            .list_models()
            .await
            .map_err(AgentQueryError::ModelDiscovery)?;
        if models.is_empty() {
            return Err(AgentQueryError::NoModelsAvailable);
        }
        let model = models
            .into_iter()
            .find(|model| model.is_llm())
            .ok_or(AgentQueryError::NoLlmModel)?;
        tracing::debug!(
            model = %model.identifier,
            provider = model.provider_id.as_deref().unwrap_or("-"),
            "selected agent model"
        );
        Ok(model.identifier)
    }

    pub async fn create_agent(&self, model_id: &str) -> Result<AgentHandle, AgentQueryError> {
        for endpoint in &self.settings.tool_endpoints {
            self.runtime
                .register_tool_group(endpoint)
                .await
                .map_err(|source| AgentQueryError::ToolRegistration {
                    toolgroup_id: endpoint.toolgroup_id.clone(),
                    source,
                })?;
        }

        let config = AgentConfiguration {
            model: model_id.to_string(),
            instructions: self.settings.instructions.clone(),
            enable_session_persistence: false,
            tool_config: ToolConfig {
                tool_choice: self.settings.tool_choice,
            },
            toolgroups: self
                .settings
                .tool_endpoints
                .iter()
                .map(|endpoint| endpoint.toolgroup_id.clone())
                .collect(),
        };
        self.runtime
            .create_agent(&config)
            .await
            .map_err(AgentQueryError::AgentCreation)
    }

    pub async fn create_session(
        &self,
        agent: &AgentHandle,
    ) -> Result<AgentSession, AgentQueryError> {
        self.runtime
            .create_session(agent, &self.settings.session_name)
            .await
            .map_err(AgentQueryError::SessionCreation)
    }

    /// Submits each prompt as its own non-streaming user turn and joins the
    /// outputs with newlines.
    pub async fn run(
        &self,
        agent: &AgentHandle,
        session: &AgentSession,
        prompts: &[String],
    ) -> Result<String, AgentQueryError> {
        let mut responses = Vec::with_capacity(prompts.len());
        for prompt in prompts {
            let output = self
                .runtime
                .create_turn(agent, session, prompt)
                .await
                .map_err(AgentQueryError::Turn)?;
            tracing::debug!(
                session_id = %session.session_id,
                turn_id = output.turn_id.as_deref().unwrap_or("-"),
                has_content = output.content.is_some(),
                "agent turn completed"
            );
            responses.push(
                output
                    .content
                    .unwrap_or_else(|| EMPTY_TURN_PLACEHOLDER.to_string()),
            );
        }
        Ok(responses.join("\n"))
    }

    pub async fn query(&self, prompt: &str) -> Result<String, AgentQueryError> {
        let started = Instant::now();
        let model_id = self.discover_model().await?;
        let agent = self.create_agent(&model_id).await?;
        let session = self.create_session(&agent).await?;
        let reply = self.run(&agent, &session, &[prompt.to_string()]).await?;
        tracing::info!(
            model = %model_id,
            agent_id = %agent.agent_id,
            session_id = %session.session_id,
            reply_chars = reply.chars().count(),
            duration_ms = started.elapsed().as_millis() as u64,
            "agent query completed"
        );
        Ok(reply)
    }
}
