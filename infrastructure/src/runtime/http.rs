//! HTTP agent runtime adapter.
//!
//! Talks to a remote tool-calling agent service over a small JSON protocol:
//! one POST per turn carrying the directive, one response carrying the tool
//! calls the agent made and the conversation id to continue from.

use async_trait::async_trait;
use bookwright_application::ports::agent_runtime::{AgentRuntime, AgentTurn, RuntimeError};
use bookwright_domain::{ConversationHandle, ToolCall, TurnDirective};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Wire form of one tool the agent may call.
#[derive(Debug, Serialize)]
struct WireTool<'a> {
    name: &'a str,
    description: &'a str,
    requires_approval: bool,
}

/// Request body for one turn.
#[derive(Debug, Serialize)]
struct TurnRequest<'a> {
    instructions: &'a str,
    step_budget: u32,
    tools: Vec<WireTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    conversation_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_input: Option<&'a str>,
}

/// One tool call as the service reports it.
#[derive(Debug, Deserialize)]
struct WireCall {
    name: String,
    #[serde(default)]
    arguments: HashMap<String, serde_json::Value>,
}

/// Response body for one turn.
#[derive(Debug, Deserialize)]
struct TurnResponse {
    conversation_id: String,
    #[serde(default)]
    tool_calls: Vec<WireCall>,
}

/// Agent runtime backed by an HTTP service.
pub struct HttpAgentRuntime {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpAgentRuntime {
    /// `request_timeout` bounds one HTTP round trip; the orchestrator's own
    /// turn deadline sits above this.
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, RuntimeError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| RuntimeError::Other(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn map_error(e: reqwest::Error) -> RuntimeError {
        if e.is_timeout() {
            RuntimeError::Timeout
        } else if e.is_connect() {
            RuntimeError::TransportClosed
        } else {
            RuntimeError::RequestFailed(e.to_string())
        }
    }
}

#[async_trait]
impl AgentRuntime for HttpAgentRuntime {
    async fn execute(
        &self,
        directive: &TurnDirective,
        conversation: Option<&ConversationHandle>,
        user_input: Option<&str>,
    ) -> Result<AgentTurn, RuntimeError> {
        let tools: Vec<WireTool> = directive
            .tools
            .all()
            .map(|t| WireTool {
                name: &t.name,
                description: &t.description,
                requires_approval: t.requires_approval(),
            })
            .collect();

        let request = TurnRequest {
            instructions: &directive.instructions,
            step_budget: directive.step_budget,
            tools,
            conversation_id: conversation.map(|c| c.as_str()),
            user_input,
        };

        let url = format!("{}/v1/turns", self.base_url);
        debug!(url = %url, step_budget = directive.step_budget, "executing turn");

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(Self::map_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RuntimeError::RequestFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let turn: TurnResponse = response
            .json()
            .await
            .map_err(|e| RuntimeError::RequestFailed(e.to_string()))?;

        let invocations = turn
            .tool_calls
            .into_iter()
            .map(|c| ToolCall {
                tool_name: c.name,
                arguments: c.arguments,
            })
            .collect();

        Ok(AgentTurn {
            invocations,
            conversation: ConversationHandle::new(turn.conversation_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let runtime =
            HttpAgentRuntime::new("http://localhost:8700/", Duration::from_secs(30)).unwrap();
        assert_eq!(runtime.base_url, "http://localhost:8700");
    }

    #[test]
    fn test_turn_response_parses_with_missing_calls() {
        let turn: TurnResponse =
            serde_json::from_str(r#"{"conversation_id": "conv-9"}"#).unwrap();
        assert_eq!(turn.conversation_id, "conv-9");
        assert!(turn.tool_calls.is_empty());
    }

    #[test]
    fn test_wire_call_arguments() {
        let turn: TurnResponse = serde_json::from_str(
            r#"{
                "conversation_id": "conv-9",
                "tool_calls": [
                    {"name": "save_chapter", "arguments": {"number": 2, "content": "Words."}}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(turn.tool_calls[0].name, "save_chapter");
        assert_eq!(
            turn.tool_calls[0].arguments.get("number"),
            Some(&serde_json::json!(2))
        );
    }
}
