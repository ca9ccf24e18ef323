use async_trait::async_trait;
use relay_core::truncate_for_error;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    AgentConfiguration, AgentHandle, AgentRuntime, AgentRuntimeError, AgentSession, ModelInfo,
    ToolEndpoint, TurnOutput,
};

/// Provider id the runtime uses for Model Context Protocol tool groups.
pub const MCP_TOOL_PROVIDER_ID: &str = "model-context-protocol";

const ERROR_BODY_MAX_CHARS: usize = 800;

#[derive(Debug, Clone)]
/// Connection settings for a Llama Stack compatible agent runtime.
pub struct LlamaStackConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone)]
/// HTTP implementation of [`AgentRuntime`] for the Llama Stack REST API.
pub struct LlamaStackClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ModelListPayload {
    Wrapped { data: Vec<ModelInfo> },
    Bare(Vec<ModelInfo>),
}

#[derive(Debug, Deserialize)]
struct CreateAgentResponse {
    agent_id: String,
}

#[derive(Debug, Deserialize)]
struct CreateSessionResponse {
    session_id: String,
}

impl LlamaStackClient {
    pub fn new(config: LlamaStackConfig) -> Result<Self, AgentRuntimeError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(AgentRuntimeError::MissingBaseUrl);
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("relay-agent"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_millis(
                config.request_timeout_ms.max(1),
            ))
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, AgentRuntimeError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AgentRuntimeError::HttpStatus {
            operation,
            status: status.as_u16(),
            body: truncate_for_error(&body, ERROR_BODY_MAX_CHARS),
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, AgentRuntimeError> {
        let response = self.send(operation, request).await?;
        let raw = response.text().await?;
        Ok(serde_json::from_str::<T>(&raw)?)
    }
}

#[async_trait]
impl AgentRuntime for LlamaStackClient {
    async fn list_models(&self) -> Result<Vec<ModelInfo>, AgentRuntimeError> {
        let payload: ModelListPayload = self
            .send_json("models.list", self.client.get(self.endpoint("models")))
            .await?;
        Ok(match payload {
            ModelListPayload::Wrapped { data } => data,
            ModelListPayload::Bare(models) => models,
        })
    }

    async fn register_tool_group(&self, endpoint: &ToolEndpoint) -> Result<(), AgentRuntimeError> {
        let body = json!({
            "toolgroup_id": endpoint.toolgroup_id,
            "provider_id": MCP_TOOL_PROVIDER_ID,
            "mcp_endpoint": { "uri": endpoint.uri },
        });
        self.send(
            "toolgroups.register",
            self.client.post(self.endpoint("toolgroups")).json(&body),
        )
        .await?;
        Ok(())
    }

    async fn create_agent(
        &self,
        config: &AgentConfiguration,
    ) -> Result<AgentHandle, AgentRuntimeError> {
        let body = json!({ "agent_config": config });
        let response: CreateAgentResponse = self
            .send_json(
                "agents.create",
                self.client.post(self.endpoint("agents")).json(&body),
            )
            .await?;
        let agent_id = response.agent_id.trim().to_string();
        if agent_id.is_empty() {
            return Err(AgentRuntimeError::InvalidResponse(
                "agents.create returned an empty agent_id".to_string(),
            ));
        }
        Ok(AgentHandle { agent_id })
    }

    async fn create_session(
        &self,
        agent: &AgentHandle,
        session_name: &str,
    ) -> Result<AgentSession, AgentRuntimeError> {
        let url = self.endpoint(&format!("agents/{}/session", agent.agent_id));
        let response: CreateSessionResponse = self
            .send_json(
                "agents.session.create",
                self.client
                    .post(url)
                    .json(&json!({ "session_name": session_name })),
            )
            .await?;
        let session_id = response.session_id.trim().to_string();
        if session_id.is_empty() {
            return Err(AgentRuntimeError::InvalidResponse(
                "agents.session.create returned an empty session_id".to_string(),
            ));
        }
        Ok(AgentSession { session_id })
    }

    async fn create_turn(
        &self,
        agent: &AgentHandle,
        session: &AgentSession,
        prompt: &str,
    ) -> Result<TurnOutput, AgentRuntimeError> {
        let url = self.endpoint(&format!(
            "agents/{}/session/{}/turn",
            agent.agent_id, session.session_id
        ));
        let body = json!({
            "messages": [{ "role": "user", "content": prompt }],
            "stream": false,
        });
        let turn: Value = self
            .send_json("agents.turn.create", self.client.post(url).json(&body))
            .await?;
        Ok(parse_turn_output(&turn))
    }
}

pub(crate) fn parse_turn_output(turn: &Value) -> TurnOutput {
    let turn_id = turn
        .get("turn_id")
        .and_then(Value::as_str)
        .map(str::to_string);
    let content = turn
        .get("output_message")
        .and_then(|message| message.get("content"))
        .and_then(collect_content_text)
        .filter(|text| !text.trim().is_empty());
    TurnOutput { turn_id, content }
}

fn collect_content_text(content: &Value) -> Option<String> {
    match content {
        Value::String(text) => Some(text.clone()),
        Value::Array(items) => {
            let parts = items
                .iter()
                .filter_map(|item| match item {
                    Value::String(text) => Some(text.as_str()),
                    Value::Object(_) => item.get("text").and_then(Value::as_str),
                    _ => None,
                })
                .collect::<Vec<_>>();
            if parts.is_empty() {
                None
            } else {
                Some(parts.concat())
            }
        }
        Value::Object(_) => content
            .get("text")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}
