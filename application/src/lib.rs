//! Application layer for bookwright
//!
//! This crate contains use cases and port definitions for orchestrating
//! long-running book generation. It depends only on the domain layer;
//! adapters for its ports live in the infrastructure layer.

pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use ports::{
    agent_runtime::{AgentRuntime, AgentTurn, RuntimeError},
    credit_gate::{CreditError, CreditGate, UnmeteredCredits},
    project_store::{ProjectStore, StoreError},
    turn_logger::{NoTurnLog, TurnEvent, TurnLogger, TurnRecord},
    turn_progress::{NoTurnProgress, TurnProgressNotifier},
};
pub use use_cases::approval_gate::{ApprovalError, ApprovalGateUseCase};
pub use use_cases::commit::{CommitError, CommittedEffect, apply_tool_call};
pub use use_cases::resume::{ResumeError, ResumeUseCase};
pub use use_cases::run_turn::{
    RunTurnError, RunTurnUseCase, TurnFailure, TurnFailureKind, TurnResult,
};
pub use use_cases::status::{ProjectStatusReport, StatusError, StatusUseCase};
