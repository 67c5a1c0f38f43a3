//! Agent runtime port
//!
//! Defines the interface to the external tool-calling agent that does the
//! actual writing. The orchestrator hands it a directive and gets back the
//! ordered tool calls the agent made; it never sees prose that wasn't routed
//! through a tool.

use async_trait::async_trait;
use bookwright_domain::{ConversationHandle, ToolCall, TurnDirective};
use thiserror::Error;

/// Errors that can occur while executing a turn against the agent runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout")]
    Timeout,

    #[error("Transport closed")]
    TransportClosed,

    #[error("Other error: {0}")]
    Other(String),
}

/// What came back from one agent turn: the tool calls it made, in the order
/// it made them, and the conversation handle to continue from next turn.
#[derive(Debug, Clone)]
pub struct AgentTurn {
    pub invocations: Vec<ToolCall>,
    pub conversation: ConversationHandle,
}

/// The external agent that executes one turn.
///
/// Implementations (adapters) live in the infrastructure layer. The runtime
/// must respect `directive.step_budget` as a hard ceiling; the orchestrator
/// additionally truncates anything past the budget as defense against a
/// runtime that does not.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    async fn execute(
        &self,
        directive: &TurnDirective,
        conversation: Option<&ConversationHandle>,
        user_input: Option<&str>,
    ) -> Result<AgentTurn, RuntimeError>;
}
